//! Envelope Aggregate
//!
//! A budget allocation bucket. `0 <= current_balance <= monthly_limit` holds after
//! every successful operation; violating operations are rejected before any change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Amount, DomainError, EnvelopeEvent, Money};

use super::{Aggregate, Change};

/// Envelope Aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub(crate) id: Uuid,
    pub(crate) budget_id: Uuid,
    pub(crate) category_id: Uuid,
    pub(crate) name: String,
    pub(crate) monthly_limit: Money,
    pub(crate) current_balance: Money,
    pub(crate) is_active: bool,
    pub(crate) is_deleted: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Envelope {
    pub fn create(
        budget_id: Uuid,
        category_id: Uuid,
        name: &str,
        monthly_limit: Amount,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid_field("name", "must not be blank"));
        }

        let envelope = Self {
            id: Uuid::new_v4(),
            budget_id,
            category_id,
            name: name.to_string(),
            monthly_limit: monthly_limit.into(),
            current_balance: Money::ZERO,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let event = EnvelopeEvent::EnvelopeCreated {
            envelope_id: envelope.id,
            budget_id,
            category_id,
            name: envelope.name.clone(),
            monthly_limit: envelope.monthly_limit,
            created_at: now,
        };

        Ok((envelope, event))
    }

    pub fn add_amount(&self, amount: &Amount, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        let new_balance = self.checked_increase(amount)?;
        Ok(self.emit(EnvelopeEvent::AmountAdded {
            envelope_id: self.id,
            amount: *amount,
            new_balance,
            added_at: now,
        }))
    }

    pub fn remove_amount(&self, amount: &Amount, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        let new_balance = self.checked_decrease(amount)?;
        Ok(self.emit(EnvelopeEvent::AmountRemoved {
            envelope_id: self.id,
            amount: *amount,
            new_balance,
            removed_at: now,
        }))
    }

    /// Outgoing side of an envelope-to-envelope transfer
    pub fn transfer_out(
        &self,
        target_envelope_id: Uuid,
        amount: &Amount,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        let new_balance = self.checked_decrease(amount)?;
        Ok(self.emit(EnvelopeEvent::TransferredOut {
            envelope_id: self.id,
            target_envelope_id,
            amount: *amount,
            new_balance,
            transferred_at: now,
        }))
    }

    /// Incoming side of an envelope-to-envelope transfer
    pub fn transfer_in(
        &self,
        source_envelope_id: Uuid,
        amount: &Amount,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        let new_balance = self.checked_increase(amount)?;
        Ok(self.emit(EnvelopeEvent::TransferredIn {
            envelope_id: self.id,
            source_envelope_id,
            amount: *amount,
            new_balance,
            transferred_at: now,
        }))
    }

    /// Change the limit; it can never drop below the money already allocated
    pub fn update_monthly_limit(
        &self,
        new_limit: Amount,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        self.ensure_usable()?;
        if new_limit.cents() < self.current_balance.cents() {
            return Err(DomainError::EnvelopeLimitExceeded {
                limit: new_limit.cents(),
                attempted: self.current_balance.cents(),
            });
        }

        Ok(self.emit(EnvelopeEvent::MonthlyLimitUpdated {
            envelope_id: self.id,
            previous_limit: self.monthly_limit,
            new_limit: new_limit.into(),
            updated_at: now,
        }))
    }

    /// Keep the envelope (and its history) but stop using it
    pub fn deactivate(&self, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        self.ensure_usable()?;
        Ok(self.emit(EnvelopeEvent::EnvelopeDeactivated {
            envelope_id: self.id,
            deactivated_at: now,
        }))
    }

    /// Mark for physical removal. Only an empty envelope can be deleted.
    pub fn delete(&self, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        if self.is_deleted {
            return Err(DomainError::invalid_field("envelope", "already deleted"));
        }
        if !self.current_balance.is_zero() {
            return Err(DomainError::invalid_field(
                "current_balance",
                "must be zero to delete the envelope",
            ));
        }
        Ok(self.emit(EnvelopeEvent::EnvelopeDeleted {
            envelope_id: self.id,
            deleted_at: now,
        }))
    }

    fn checked_increase(&self, amount: &Amount) -> Result<Money, DomainError> {
        self.ensure_usable()?;
        let new_balance = self.current_balance.credit(amount)?;
        if new_balance > self.monthly_limit {
            return Err(DomainError::EnvelopeLimitExceeded {
                limit: self.monthly_limit.cents(),
                attempted: new_balance.cents(),
            });
        }
        Ok(new_balance)
    }

    fn checked_decrease(&self, amount: &Amount) -> Result<Money, DomainError> {
        self.ensure_usable()?;
        if !self.current_balance.is_sufficient_for(amount) {
            return Err(DomainError::InsufficientEnvelopeBalance {
                requested: amount.cents(),
                available: self.current_balance.cents(),
            });
        }
        Ok(self.current_balance.debit(amount)?)
    }

    fn ensure_usable(&self) -> Result<(), DomainError> {
        if self.is_deleted || !self.is_active {
            return Err(DomainError::EnvelopeInactive(self.id));
        }
        Ok(())
    }

    pub fn category_id(&self) -> Uuid {
        self.category_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn monthly_limit(&self) -> Money {
        self.monthly_limit
    }

    pub fn current_balance(&self) -> Money {
        self.current_balance
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

impl Aggregate for Envelope {
    type Event = EnvelopeEvent;

    fn aggregate_type() -> &'static str {
        "Envelope"
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
            EnvelopeEvent::EnvelopeCreated { .. } => {}

            EnvelopeEvent::AmountAdded { new_balance, added_at: at, .. }
            | EnvelopeEvent::AmountRemoved { new_balance, removed_at: at, .. }
            | EnvelopeEvent::TransferredOut { new_balance, transferred_at: at, .. }
            | EnvelopeEvent::TransferredIn { new_balance, transferred_at: at, .. } => {
                self.current_balance = *new_balance;
                self.updated_at = *at;
            }

            EnvelopeEvent::MonthlyLimitUpdated { new_limit, updated_at, .. } => {
                self.monthly_limit = *new_limit;
                self.updated_at = *updated_at;
            }

            EnvelopeEvent::EnvelopeDeactivated { deactivated_at, .. } => {
                self.is_active = false;
                self.updated_at = *deactivated_at;
            }

            EnvelopeEvent::EnvelopeDeleted { deleted_at, .. } => {
                self.is_deleted = true;
                self.updated_at = *deleted_at;
            }
        }
        self
    }
}
