//! Envelope Handlers

use chrono::Utc;

use crate::aggregate::{Aggregate, Envelope};
use crate::domain::OperationContext;
use crate::error::AppError;
use crate::services::TransferBetweenEnvelopes;

use super::support::{amount, BudgetPorts};
use super::{
    CreateEnvelopeCommand, DeleteEnvelopeCommand, DeleteEnvelopeResult, EnvelopeAmountCommand,
    TransferBetweenEnvelopesCommand, TransferBetweenEnvelopesResult, UpdateEnvelopeLimitCommand,
};

// =========================================================================
// CreateEnvelope
// =========================================================================

pub struct CreateEnvelopeHandler {
    ports: BudgetPorts,
}

impl CreateEnvelopeHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: CreateEnvelopeCommand,
        context: &OperationContext,
    ) -> Result<Envelope, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let limit = amount(command.monthly_limit_cents)?;
        let (envelope, event) = Envelope::create(
            command.budget_id,
            command.category_id,
            &command.name,
            limit,
            Utc::now(),
        )?;

        self.ports
            .envelopes
            .save(&envelope)
            .await
            .map_err(AppError::persistence_failed(Envelope::aggregate_type()))?;

        tracing::info!(
            envelope_id = %envelope.id(),
            category_id = %command.category_id,
            monthly_limit_cents = limit.cents(),
            "Envelope created"
        );

        self.ports.publish([event]).await;
        Ok(envelope)
    }
}

// =========================================================================
// AddAmountToEnvelope / RemoveAmountFromEnvelope
// =========================================================================

pub struct AddAmountToEnvelopeHandler {
    ports: BudgetPorts,
}

impl AddAmountToEnvelopeHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: EnvelopeAmountCommand,
        context: &OperationContext,
    ) -> Result<Envelope, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let amount = amount(command.amount_cents)?;
        let envelope = self
            .ports
            .load_envelope(command.envelope_id, command.budget_id)
            .await?;
        let (envelope, event) = envelope.add_amount(&amount, Utc::now())?;

        self.ports
            .envelopes
            .save(&envelope)
            .await
            .map_err(AppError::persistence_failed(Envelope::aggregate_type()))?;

        self.ports.publish([event]).await;
        Ok(envelope)
    }
}

pub struct RemoveAmountFromEnvelopeHandler {
    ports: BudgetPorts,
}

impl RemoveAmountFromEnvelopeHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: EnvelopeAmountCommand,
        context: &OperationContext,
    ) -> Result<Envelope, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let amount = amount(command.amount_cents)?;
        let envelope = self
            .ports
            .load_envelope(command.envelope_id, command.budget_id)
            .await?;
        let (envelope, event) = envelope.remove_amount(&amount, Utc::now())?;

        self.ports
            .envelopes
            .save(&envelope)
            .await
            .map_err(AppError::persistence_failed(Envelope::aggregate_type()))?;

        self.ports.publish([event]).await;
        Ok(envelope)
    }
}

// =========================================================================
// UpdateEnvelopeLimit
// =========================================================================

pub struct UpdateEnvelopeLimitHandler {
    ports: BudgetPorts,
}

impl UpdateEnvelopeLimitHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: UpdateEnvelopeLimitCommand,
        context: &OperationContext,
    ) -> Result<Envelope, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let new_limit = amount(command.monthly_limit_cents)?;
        let envelope = self
            .ports
            .load_envelope(command.envelope_id, command.budget_id)
            .await?;
        let (envelope, event) = envelope.update_monthly_limit(new_limit, Utc::now())?;

        self.ports
            .envelopes
            .save(&envelope)
            .await
            .map_err(AppError::persistence_failed(Envelope::aggregate_type()))?;

        self.ports.publish([event]).await;
        Ok(envelope)
    }
}

// =========================================================================
// TransferBetweenEnvelopes
// =========================================================================

pub struct TransferBetweenEnvelopesHandler {
    ports: BudgetPorts,
}

impl TransferBetweenEnvelopesHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: TransferBetweenEnvelopesCommand,
        context: &OperationContext,
    ) -> Result<TransferBetweenEnvelopesResult, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let source = self
            .ports
            .load_envelope(command.source_envelope_id, command.budget_id)
            .await?;

        // loaded without the budget filter so the service can report the mismatch
        let target = self
            .ports
            .envelopes
            .find_by_id(command.target_envelope_id)
            .await
            .map_err(AppError::repository(Envelope::aggregate_type()))?
            .filter(|envelope| !envelope.is_deleted())
            .ok_or_else(|| {
                AppError::not_found(Envelope::aggregate_type(), command.target_envelope_id)
            })?;

        let transfer = TransferBetweenEnvelopes::execute(
            &source,
            &target,
            command.amount_cents,
            command.budget_id,
            Utc::now(),
        )?;

        self.ports
            .transfer_between_envelopes
            .transfer_between_envelopes(&transfer.source, &transfer.target)
            .await?;

        tracing::info!(
            source_envelope_id = %source.id(),
            target_envelope_id = %target.id(),
            amount_cents = transfer.amount.cents(),
            "Transfer between envelopes completed"
        );

        let result = TransferBetweenEnvelopesResult {
            source: transfer.source.clone(),
            target: transfer.target.clone(),
            amount_cents: transfer.amount.cents(),
        };
        self.ports.publish(transfer.events).await;
        Ok(result)
    }
}

// =========================================================================
// DeleteEnvelope
// =========================================================================

/// Removes an empty, unreferenced envelope; any other envelope is deactivated.
pub struct DeleteEnvelopeHandler {
    ports: BudgetPorts,
}

impl DeleteEnvelopeHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: DeleteEnvelopeCommand,
        context: &OperationContext,
    ) -> Result<DeleteEnvelopeResult, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let envelope = self
            .ports
            .load_envelope(command.envelope_id, command.budget_id)
            .await?;

        let has_transactions = self
            .ports
            .envelopes
            .has_transactions(envelope.id())
            .await
            .map_err(AppError::repository(Envelope::aggregate_type()))?;

        let now = Utc::now();
        if envelope.current_balance().is_zero() && !has_transactions {
            let (_, event) = envelope.delete(now)?;
            self.ports
                .envelopes
                .delete(envelope.id())
                .await
                .map_err(AppError::persistence_failed(Envelope::aggregate_type()))?;

            tracing::info!(envelope_id = %envelope.id(), "Envelope deleted");

            self.ports.publish([event]).await;
            return Ok(DeleteEnvelopeResult::Deleted {
                envelope_id: envelope.id(),
            });
        }

        if !envelope.is_active() {
            return Ok(DeleteEnvelopeResult::Deactivated { envelope });
        }

        let (envelope, event) = envelope.deactivate(now)?;
        self.ports
            .envelopes
            .save(&envelope)
            .await
            .map_err(AppError::persistence_failed(Envelope::aggregate_type()))?;

        tracing::info!(
            envelope_id = %envelope.id(),
            balance_cents = envelope.current_balance().cents(),
            has_transactions,
            "Envelope deactivated instead of deleted"
        );

        self.ports.publish([event]).await;
        Ok(DeleteEnvelopeResult::Deactivated { envelope })
    }
}
