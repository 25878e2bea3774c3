//! Account Handlers
//!
//! Account lifecycle, both reconciliation flavors and transfers between accounts.

use chrono::Utc;

use crate::aggregate::{Account, Aggregate, Transaction};
use crate::domain::{DomainError, DomainEvent, Money, OperationContext, TransactionDetails, TransactionType};
use crate::error::AppError;
use crate::services::TransferBetweenAccounts;

use super::support::BudgetPorts;
use super::{
    CreateAccountCommand, DeleteAccountCommand, ReconcileAccountCommand,
    ReconcileAccountWithAdjustmentCommand, ReconciliationResult, TransferBetweenAccountsCommand,
    TransferBetweenAccountsResult, UpdateAccountCommand,
};

const ADJUSTMENT_DESCRIPTION: &str = "Balance adjustment";

fn money(cents: i64) -> Result<Money, AppError> {
    Money::from_cents(cents).map_err(|e| AppError::Domain(DomainError::from(e)))
}

// =========================================================================
// CreateAccount
// =========================================================================

pub struct CreateAccountHandler {
    ports: BudgetPorts,
}

impl CreateAccountHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: CreateAccountCommand,
        context: &OperationContext,
    ) -> Result<Account, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let initial_balance = money(command.initial_balance_cents)?;
        let (account, event) = Account::create(
            command.budget_id,
            &command.name,
            command.account_type,
            initial_balance,
            Utc::now(),
        )?;

        self.ports
            .accounts
            .save(&account)
            .await
            .map_err(AppError::persistence_failed(Account::aggregate_type()))?;

        tracing::info!(
            account_id = %account.id(),
            budget_id = %command.budget_id,
            account_type = %command.account_type,
            "Account created"
        );

        self.ports.publish([event]).await;
        Ok(account)
    }
}

// =========================================================================
// UpdateAccount
// =========================================================================

pub struct UpdateAccountHandler {
    ports: BudgetPorts,
}

impl UpdateAccountHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: UpdateAccountCommand,
        context: &OperationContext,
    ) -> Result<Account, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let account = self
            .ports
            .load_account(command.account_id, command.budget_id)
            .await?;
        let (account, event) = account.update(&command.name, command.account_type, Utc::now())?;

        self.ports
            .accounts
            .save(&account)
            .await
            .map_err(AppError::persistence_failed(Account::aggregate_type()))?;

        self.ports.publish([event]).await;
        Ok(account)
    }
}

// =========================================================================
// DeleteAccount
// =========================================================================

pub struct DeleteAccountHandler {
    ports: BudgetPorts,
}

impl DeleteAccountHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    /// Soft delete; refused while transactions reference the account
    pub async fn execute(
        &self,
        command: DeleteAccountCommand,
        context: &OperationContext,
    ) -> Result<(), AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let account = self
            .ports
            .load_account(command.account_id, command.budget_id)
            .await?;

        let has_transactions = self
            .ports
            .accounts
            .has_transactions(account.id())
            .await
            .map_err(AppError::repository(Account::aggregate_type()))?;
        if has_transactions {
            return Err(DomainError::AccountHasTransactions.into());
        }

        let (account, event) = account.delete(Utc::now())?;
        self.ports
            .accounts
            .save(&account)
            .await
            .map_err(AppError::persistence_failed(Account::aggregate_type()))?;

        tracing::info!(account_id = %account.id(), "Account deleted");

        self.ports.publish([event]).await;
        Ok(())
    }
}

// =========================================================================
// ReconcileAccount
// =========================================================================

/// Direct reconciliation: the balance is replaced and the justification kept
/// on the event. No transaction is recorded.
pub struct ReconcileAccountHandler {
    ports: BudgetPorts,
}

impl ReconcileAccountHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: ReconcileAccountCommand,
        context: &OperationContext,
    ) -> Result<ReconciliationResult, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let new_balance = money(command.new_balance_cents)?;
        let account = self
            .ports
            .load_account(command.account_id, command.budget_id)
            .await?;
        let difference = new_balance
            .minus(&account.balance())
            .map_err(DomainError::from)?;

        let (account, event) = account.reconcile(new_balance, &command.justification, Utc::now())?;

        self.ports
            .accounts
            .save(&account)
            .await
            .map_err(AppError::persistence_failed(Account::aggregate_type()))?;

        tracing::info!(
            account_id = %account.id(),
            difference_cents = difference.cents(),
            "Account reconciled"
        );

        self.ports.publish([event]).await;
        Ok(ReconciliationResult {
            account,
            difference_cents: difference.cents(),
            adjustment: None,
        })
    }
}

// =========================================================================
// ReconcileAccountWithAdjustment
// =========================================================================

/// Reconciliation recorded as an INCOME or EXPENSE adjustment transaction,
/// written together with the account.
pub struct ReconcileAccountWithAdjustmentHandler {
    ports: BudgetPorts,
}

impl ReconcileAccountWithAdjustmentHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: ReconcileAccountWithAdjustmentCommand,
        context: &OperationContext,
    ) -> Result<ReconciliationResult, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let real_balance = money(command.real_balance_cents)?;
        let account = self
            .ports
            .load_account(command.account_id, command.budget_id)
            .await?;

        let now = Utc::now();
        let reconciliation = account.reconcile_to_real_balance(real_balance, now)?;
        let mut events: Vec<DomainEvent> = vec![reconciliation.event.into()];

        // a matching balance needs no adjustment
        let adjustment = match reconciliation.difference.magnitude() {
            None => None,
            Some(amount) => {
                let transaction_type = if reconciliation.difference.is_negative() {
                    TransactionType::Expense
                } else {
                    TransactionType::Income
                };
                let (transaction, created) = Transaction::create(
                    command.budget_id,
                    TransactionDetails {
                        account_id: account.id(),
                        category_id: command.category_id,
                        description: ADJUSTMENT_DESCRIPTION.to_string(),
                        amount,
                        transaction_type,
                        transaction_date: now,
                    },
                    now,
                )?;
                events.push(created.into());
                Some(transaction)
            }
        };

        self.ports
            .reconcile_account
            .reconcile_account(&reconciliation.account, adjustment.as_ref())
            .await?;

        tracing::info!(
            account_id = %account.id(),
            difference_cents = reconciliation.difference.cents(),
            adjustment_id = ?adjustment.as_ref().map(Transaction::id),
            "Account reconciled with adjustment"
        );

        self.ports.publish(events).await;
        Ok(ReconciliationResult {
            account: reconciliation.account,
            difference_cents: reconciliation.difference.cents(),
            adjustment,
        })
    }
}

// =========================================================================
// TransferBetweenAccounts
// =========================================================================

pub struct TransferBetweenAccountsHandler {
    ports: BudgetPorts,
}

impl TransferBetweenAccountsHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: TransferBetweenAccountsCommand,
        context: &OperationContext,
    ) -> Result<TransferBetweenAccountsResult, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let source = self
            .ports
            .load_account(command.source_account_id, command.budget_id)
            .await?;

        // the budget check belongs to the transfer service
        let destination = self
            .ports
            .accounts
            .find_by_id(command.destination_account_id)
            .await
            .map_err(AppError::repository(Account::aggregate_type()))?
            .filter(|account| !account.is_deleted())
            .ok_or_else(|| {
                AppError::not_found(Account::aggregate_type(), command.destination_account_id)
            })?;

        let transfer = TransferBetweenAccounts::execute(
            &source,
            &destination,
            command.amount_cents,
            command.category_id,
            Utc::now(),
        )?;

        self.ports
            .transfer_between_accounts
            .transfer_between_accounts(&transfer)
            .await?;

        tracing::info!(
            source_account_id = %source.id(),
            destination_account_id = %destination.id(),
            amount_cents = transfer.amount.cents(),
            "Transfer between accounts completed"
        );

        let result = TransferBetweenAccountsResult {
            source: transfer.source.clone(),
            destination: transfer.destination.clone(),
            debit_transaction_id: transfer.debit_transaction.id(),
            credit_transaction_id: transfer.credit_transaction.id(),
            amount_cents: transfer.amount.cents(),
        };
        self.ports.publish(transfer.events).await;
        Ok(result)
    }
}
