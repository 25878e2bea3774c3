//! Goal Handlers
//!
//! Goals track money set aside towards a target. Contributions are bookkeeping
//! on the goal only; the source account balance is not moved.

use chrono::Utc;

use crate::aggregate::{Aggregate, Goal};
use crate::domain::{Amount, AutomaticContribution, DomainError, OperationContext};
use crate::error::AppError;

use super::support::{amount, BudgetPorts};
use super::{
    AutomaticContributionResult, ConfigureAutomaticContributionCommand, CreateGoalCommand,
    GoalAmountCommand, GoalCommand,
};

fn contribution_amount(cents: i64) -> Result<Amount, AppError> {
    Amount::new(cents)
        .map_err(|e| AppError::Domain(DomainError::InvalidContributionAmount(e.to_string())))
}

async fn save(ports: &BudgetPorts, goal: &Goal) -> Result<(), AppError> {
    ports
        .goals
        .save(goal)
        .await
        .map_err(AppError::persistence_failed(Goal::aggregate_type()))
}

// =========================================================================
// CreateGoal
// =========================================================================

pub struct CreateGoalHandler {
    ports: BudgetPorts,
}

impl CreateGoalHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: CreateGoalCommand,
        context: &OperationContext,
    ) -> Result<Goal, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let total_amount = amount(command.total_amount_cents)?;
        // the source account must belong to the same budget
        let source = self
            .ports
            .load_account(command.source_account_id, command.budget_id)
            .await?;

        let (goal, event) = Goal::create(
            command.budget_id,
            &command.name,
            total_amount,
            source.id(),
            command.deadline,
            Utc::now(),
        )?;
        save(&self.ports, &goal).await?;

        tracing::info!(
            goal_id = %goal.id(),
            source_account_id = %source.id(),
            total_amount_cents = total_amount.cents(),
            "Goal created"
        );

        self.ports.publish([event]).await;
        Ok(goal)
    }
}

// =========================================================================
// AddAmountToGoal / RemoveAmountFromGoal
// =========================================================================

pub struct AddAmountToGoalHandler {
    ports: BudgetPorts,
}

impl AddAmountToGoalHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: GoalAmountCommand,
        context: &OperationContext,
    ) -> Result<Goal, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let amount = contribution_amount(command.amount_cents)?;
        let goal = self.ports.load_goal(command.goal_id, command.budget_id).await?;
        let (goal, event) = goal.add_amount(&amount, Utc::now())?;
        save(&self.ports, &goal).await?;

        if goal.is_achieved() {
            tracing::info!(goal_id = %goal.id(), "Goal achieved");
        }

        self.ports.publish([event]).await;
        Ok(goal)
    }
}

pub struct RemoveAmountFromGoalHandler {
    ports: BudgetPorts,
}

impl RemoveAmountFromGoalHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: GoalAmountCommand,
        context: &OperationContext,
    ) -> Result<Goal, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let amount = amount(command.amount_cents)?;
        let goal = self.ports.load_goal(command.goal_id, command.budget_id).await?;
        let (goal, event) = goal.remove_amount(&amount, Utc::now())?;
        save(&self.ports, &goal).await?;

        self.ports.publish([event]).await;
        Ok(goal)
    }
}

// =========================================================================
// Automatic contributions
// =========================================================================

pub struct ConfigureAutomaticContributionHandler {
    ports: BudgetPorts,
}

impl ConfigureAutomaticContributionHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: ConfigureAutomaticContributionCommand,
        context: &OperationContext,
    ) -> Result<AutomaticContributionResult, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let contribution = AutomaticContribution {
            amount: contribution_amount(command.amount_cents)?,
            frequency: command.frequency,
            execution_day: command.execution_day,
            start_date: command.start_date,
            end_date: command.end_date,
            is_active: true,
        };

        let goal = self.ports.load_goal(command.goal_id, command.budget_id).await?;
        let now = Utc::now();
        let (goal, event) = goal.configure_automatic_contribution(contribution, now)?;
        save(&self.ports, &goal).await?;

        // the day before today, so a plan starting today runs today
        let next_execution_date = now
            .date_naive()
            .pred_opt()
            .zip(goal.automatic_contribution())
            .and_then(|(after, plan)| plan.next_execution_date(after));

        tracing::info!(
            goal_id = %goal.id(),
            frequency = %command.frequency,
            execution_day = command.execution_day,
            next_execution_date = ?next_execution_date,
            "Automatic contribution configured"
        );

        self.ports.publish([event]).await;
        Ok(AutomaticContributionResult {
            goal,
            next_execution_date,
        })
    }
}

pub struct CancelAutomaticContributionHandler {
    ports: BudgetPorts,
}

impl CancelAutomaticContributionHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: GoalCommand,
        context: &OperationContext,
    ) -> Result<Goal, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let goal = self.ports.load_goal(command.goal_id, command.budget_id).await?;
        let (goal, event) = goal.cancel_automatic_contribution(Utc::now())?;
        save(&self.ports, &goal).await?;

        self.ports.publish([event]).await;
        Ok(goal)
    }
}

// =========================================================================
// DeleteGoal
// =========================================================================

pub struct DeleteGoalHandler {
    ports: BudgetPorts,
}

impl DeleteGoalHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: GoalCommand,
        context: &OperationContext,
    ) -> Result<(), AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let goal = self.ports.load_goal(command.goal_id, command.budget_id).await?;
        let (goal, event) = goal.delete(Utc::now())?;
        save(&self.ports, &goal).await?;

        tracing::info!(goal_id = %goal.id(), "Goal deleted");

        self.ports.publish([event]).await;
        Ok(())
    }
}
