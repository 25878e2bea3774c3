//! Transaction Handlers
//!
//! Creation and the state machine transitions of a transaction. Whenever a
//! transaction becomes COMPLETED its account is written in the same unit of
//! work.

use chrono::Utc;

use crate::aggregate::{Aggregate, Transaction};
use crate::domain::{
    DomainError, DomainEvent, OperationContext, TransactionDetails, TransactionStatus,
    TransactionType,
};
use crate::error::AppError;

use super::support::{amount, BudgetPorts};
use super::{
    CancelScheduledTransactionCommand, CompletedTransactionResult, CreateTransactionCommand,
    TransactionCommand, UpdateTransactionCommand,
};

/// Transfers only come out of a transfer between accounts
fn reject_transfer_type(transaction_type: TransactionType) -> Result<(), AppError> {
    if transaction_type == TransactionType::Transfer {
        return Err(DomainError::invalid_field(
            "transaction_type",
            "use a transfer between accounts to move money between accounts",
        )
        .into());
    }
    Ok(())
}

async fn save(ports: &BudgetPorts, transaction: &Transaction) -> Result<(), AppError> {
    ports
        .transactions
        .save(transaction)
        .await
        .map_err(AppError::persistence_failed(Transaction::aggregate_type()))
}

// =========================================================================
// CreateTransaction
// =========================================================================

/// Future-dated transactions are stored SCHEDULED. Past-dated ones are
/// registered COMPLETED together with their effect on the account balance.
pub struct CreateTransactionHandler {
    ports: BudgetPorts,
}

impl CreateTransactionHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: CreateTransactionCommand,
        context: &OperationContext,
    ) -> Result<Transaction, AppError> {
        self.ports.authorize(context, command.budget_id).await?;
        reject_transfer_type(command.transaction_type)?;

        let details = TransactionDetails {
            account_id: command.account_id,
            category_id: command.category_id,
            description: command.description,
            amount: amount(command.amount_cents)?,
            transaction_type: command.transaction_type,
            transaction_date: command.transaction_date,
        };
        let account = self
            .ports
            .load_account(details.account_id, command.budget_id)
            .await?;

        let now = Utc::now();
        let (transaction, created) = Transaction::create(command.budget_id, details, now)?;

        if transaction.status() == TransactionStatus::Scheduled {
            save(&self.ports, &transaction).await?;

            tracing::info!(
                transaction_id = %transaction.id(),
                transaction_date = %transaction.transaction_date(),
                "Transaction scheduled"
            );

            self.ports.publish([created]).await;
            return Ok(transaction);
        }

        let (account, balance_changed) = account.apply_transaction(&transaction, now)?;
        self.ports
            .register_past_transaction
            .register_past_transaction(&transaction, &account)
            .await?;

        tracing::info!(
            transaction_id = %transaction.id(),
            account_id = %account.id(),
            balance_cents = account.balance().cents(),
            "Past transaction registered"
        );

        let events: [DomainEvent; 2] = [created.into(), balance_changed.into()];
        self.ports.publish(events).await;
        Ok(transaction)
    }
}

// =========================================================================
// UpdateTransaction
// =========================================================================

/// Replaces the editable fields of an open transaction; the status is kept
pub struct UpdateTransactionHandler {
    ports: BudgetPorts,
}

impl UpdateTransactionHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: UpdateTransactionCommand,
        context: &OperationContext,
    ) -> Result<Transaction, AppError> {
        self.ports.authorize(context, command.budget_id).await?;
        reject_transfer_type(command.transaction_type)?;

        let transaction = self
            .ports
            .load_transaction(command.transaction_id, command.budget_id)
            .await?;
        if command.account_id != transaction.account_id() {
            self.ports
                .load_account(command.account_id, command.budget_id)
                .await?;
        }

        let details = TransactionDetails {
            account_id: command.account_id,
            category_id: command.category_id,
            description: command.description,
            amount: amount(command.amount_cents)?,
            transaction_type: command.transaction_type,
            transaction_date: command.transaction_date,
        };
        let (transaction, event) = transaction.update(details, Utc::now())?;
        save(&self.ports, &transaction).await?;

        self.ports.publish([event]).await;
        Ok(transaction)
    }
}

// =========================================================================
// MarkTransactionLate
// =========================================================================

pub struct MarkTransactionLateHandler {
    ports: BudgetPorts,
}

impl MarkTransactionLateHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: TransactionCommand,
        context: &OperationContext,
    ) -> Result<Transaction, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let transaction = self
            .ports
            .load_transaction(command.transaction_id, command.budget_id)
            .await?;
        let (transaction, event) = transaction.mark_as_late(Utc::now())?;
        save(&self.ports, &transaction).await?;

        tracing::info!(transaction_id = %transaction.id(), "Transaction marked late");

        self.ports.publish([event]).await;
        Ok(transaction)
    }
}

// =========================================================================
// CancelScheduledTransaction
// =========================================================================

pub struct CancelScheduledTransactionHandler {
    ports: BudgetPorts,
}

impl CancelScheduledTransactionHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: CancelScheduledTransactionCommand,
        context: &OperationContext,
    ) -> Result<Transaction, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let transaction = self
            .ports
            .load_transaction(command.transaction_id, command.budget_id)
            .await?;
        let (transaction, event) = transaction.cancel(&command.reason, Utc::now())?;
        save(&self.ports, &transaction).await?;

        tracing::info!(transaction_id = %transaction.id(), "Scheduled transaction cancelled");

        self.ports.publish([event]).await;
        Ok(transaction)
    }
}

// =========================================================================
// CompleteScheduledTransaction
// =========================================================================

/// Executes a SCHEDULED or LATE transaction against its account
pub struct CompleteScheduledTransactionHandler {
    ports: BudgetPorts,
}

impl CompleteScheduledTransactionHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: TransactionCommand,
        context: &OperationContext,
    ) -> Result<CompletedTransactionResult, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let transaction = self
            .ports
            .load_transaction(command.transaction_id, command.budget_id)
            .await?;
        let account = self
            .ports
            .load_account(transaction.account_id(), command.budget_id)
            .await?;

        let now = Utc::now();
        let (transaction, completed) = transaction.complete(now)?;
        let (account, balance_changed) = account.apply_transaction(&transaction, now)?;

        self.ports
            .register_past_transaction
            .register_past_transaction(&transaction, &account)
            .await?;

        tracing::info!(
            transaction_id = %transaction.id(),
            account_id = %account.id(),
            balance_cents = account.balance().cents(),
            "Scheduled transaction completed"
        );

        let events: [DomainEvent; 2] = [completed.into(), balance_changed.into()];
        self.ports.publish(events).await;
        Ok(CompletedTransactionResult {
            transaction,
            account,
        })
    }
}

// =========================================================================
// DeleteTransaction
// =========================================================================

pub struct DeleteTransactionHandler {
    ports: BudgetPorts,
}

impl DeleteTransactionHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    /// Soft delete of a SCHEDULED or LATE transaction
    pub async fn execute(
        &self,
        command: TransactionCommand,
        context: &OperationContext,
    ) -> Result<(), AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let transaction = self
            .ports
            .load_transaction(command.transaction_id, command.budget_id)
            .await?;
        let (transaction, event) = transaction.delete(Utc::now())?;
        save(&self.ports, &transaction).await?;

        tracing::info!(transaction_id = %transaction.id(), "Transaction deleted");

        self.ports.publish([event]).await;
        Ok(())
    }
}
