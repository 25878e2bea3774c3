//! Goal Aggregate
//!
//! Savings target funded from a source account. Accumulated money never goes
//! below zero and a goal carries at most one active automatic contribution plan.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Amount, AutomaticContribution, DomainError, GoalEvent, Money};

use super::{Aggregate, Change};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub(crate) id: Uuid,
    pub(crate) budget_id: Uuid,
    pub(crate) name: String,
    pub(crate) total_amount: Amount,
    pub(crate) accumulated_amount: Money,
    pub(crate) source_account_id: Uuid,
    pub(crate) deadline: Option<NaiveDate>,
    pub(crate) automatic_contribution: Option<AutomaticContribution>,
    pub(crate) is_deleted: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn create(
        budget_id: Uuid,
        name: &str,
        total_amount: Amount,
        source_account_id: Uuid,
        deadline: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid_field("name", "must not be blank"));
        }
        if let Some(deadline) = deadline {
            if deadline < now.date_naive() {
                return Err(DomainError::invalid_field("deadline", "must not be in the past"));
            }
        }

        let goal = Self {
            id: Uuid::new_v4(),
            budget_id,
            name: name.to_string(),
            total_amount,
            accumulated_amount: Money::ZERO,
            source_account_id,
            deadline,
            automatic_contribution: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let event = GoalEvent::GoalCreated {
            goal_id: goal.id,
            budget_id,
            name: goal.name.clone(),
            total_amount,
            source_account_id,
            deadline,
            created_at: now,
        };

        Ok((goal, event))
    }

    /// Contribute to the goal
    pub fn add_amount(&self, amount: &Amount, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        self.ensure_active()?;
        let accumulated_amount = self.accumulated_amount.credit(amount)?;
        let achieved = accumulated_amount.cents() >= self.total_amount.cents();

        Ok(self.emit(GoalEvent::AmountAdded {
            goal_id: self.id,
            amount: *amount,
            accumulated_amount,
            achieved,
            added_at: now,
        }))
    }

    /// Withdraw from the accumulated amount
    pub fn remove_amount(&self, amount: &Amount, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        if self.is_deleted {
            return Err(DomainError::GoalNotActive);
        }
        if !self.accumulated_amount.is_sufficient_for(amount) {
            return Err(DomainError::InsufficientGoalAmount {
                requested: amount.cents(),
                accumulated: self.accumulated_amount.cents(),
            });
        }
        let accumulated_amount = self.accumulated_amount.debit(amount)?;

        Ok(self.emit(GoalEvent::AmountRemoved {
            goal_id: self.id,
            amount: *amount,
            accumulated_amount,
            removed_at: now,
        }))
    }

    /// Set up the recurring contribution plan. Allowed once per active plan.
    pub fn configure_automatic_contribution(
        &self,
        contribution: AutomaticContribution,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        self.ensure_active()?;
        if self.has_active_automatic_contribution() {
            return Err(DomainError::AutomaticContributionAlreadyConfigured);
        }
        contribution.validate(now.date_naive())?;

        Ok(self.emit(GoalEvent::AutomaticContributionConfigured {
            goal_id: self.id,
            contribution: AutomaticContribution {
                is_active: true,
                ..contribution
            },
            configured_at: now,
        }))
    }

    pub fn cancel_automatic_contribution(&self, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        if self.is_deleted {
            return Err(DomainError::GoalNotActive);
        }
        if !self.has_active_automatic_contribution() {
            return Err(DomainError::invalid_field(
                "automatic_contribution",
                "no active automatic contribution",
            ));
        }
        Ok(self.emit(GoalEvent::AutomaticContributionCancelled {
            goal_id: self.id,
            cancelled_at: now,
        }))
    }

    pub fn delete(&self, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        if self.is_deleted {
            return Err(DomainError::GoalNotActive);
        }
        Ok(self.emit(GoalEvent::GoalDeleted {
            goal_id: self.id,
            deleted_at: now,
        }))
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.is_deleted || self.is_achieved() {
            return Err(DomainError::GoalNotActive);
        }
        Ok(())
    }

    pub fn is_achieved(&self) -> bool {
        self.accumulated_amount.cents() >= self.total_amount.cents()
    }

    pub fn has_active_automatic_contribution(&self) -> bool {
        self.automatic_contribution
            .as_ref()
            .map_or(false, |c| c.is_active)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_amount(&self) -> Amount {
        self.total_amount
    }

    pub fn accumulated_amount(&self) -> Money {
        self.accumulated_amount
    }

    pub fn source_account_id(&self) -> Uuid {
        self.source_account_id
    }

    pub fn deadline(&self) -> Option<NaiveDate> {
        self.deadline
    }

    pub fn automatic_contribution(&self) -> Option<&AutomaticContribution> {
        self.automatic_contribution.as_ref()
    }
}

impl Aggregate for Goal {
    type Event = GoalEvent;

    fn aggregate_type() -> &'static str {
        "Goal"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn budget_id(&self) -> Uuid {
        self.budget_id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn apply(mut self, event: &Self::Event) -> Self {
        match event {
            GoalEvent::GoalCreated { .. } => {}

            GoalEvent::AmountAdded { accumulated_amount, added_at: at, .. }
            | GoalEvent::AmountRemoved { accumulated_amount, removed_at: at, .. } => {
                self.accumulated_amount = *accumulated_amount;
                self.updated_at = *at;
            }

            GoalEvent::AutomaticContributionConfigured { contribution, configured_at, .. } => {
                self.automatic_contribution = Some(contribution.clone());
                self.updated_at = *configured_at;
            }

            GoalEvent::AutomaticContributionCancelled { cancelled_at, .. } => {
                if let Some(contribution) = self.automatic_contribution.as_mut() {
                    contribution.is_active = false;
                }
                self.updated_at = *cancelled_at;
            }

            GoalEvent::GoalDeleted { deleted_at, .. } => {
                self.is_deleted = true;
                if let Some(contribution) = self.automatic_contribution.as_mut() {
                    contribution.is_active = false;
                }
                self.updated_at = *deleted_at;
            }
        }
        self
    }
}
