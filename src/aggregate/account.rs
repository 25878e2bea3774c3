//! Account Aggregate
//!
//! Account holds a running balance in cents. Balances may go negative (credit
//! lines); every movement produces a `BalanceChanged` event carrying the delta.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    AccountEvent, AccountType, Amount, BalanceChangeReason, DomainError, Money, TransactionStatus,
    TransactionType,
};

use super::{Aggregate, Change, Transaction};

/// Minimum number of characters of a direct reconciliation justification
pub const MIN_JUSTIFICATION_LENGTH: usize = 10;

const MAX_NAME_LENGTH: usize = 100;

/// Account Aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub(crate) id: Uuid,
    pub(crate) budget_id: Uuid,
    pub(crate) name: String,
    pub(crate) account_type: AccountType,
    pub(crate) balance: Money,
    pub(crate) is_deleted: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

/// Outcome of reconciling against an observed balance
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub account: Account,
    pub event: AccountEvent,
    /// `real_balance - previous_balance`; zero when nothing changed
    pub difference: Money,
}

impl Account {
    /// Create a new account and generate the creation event
    pub fn create(
        budget_id: Uuid,
        name: &str,
        account_type: AccountType,
        initial_balance: Money,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        let name = validate_name(name)?;
        let account = Self {
            id: Uuid::new_v4(),
            budget_id,
            name: name.clone(),
            account_type,
            balance: initial_balance,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let event = AccountEvent::AccountCreated {
            account_id: account.id,
            budget_id,
            name,
            account_type,
            initial_balance,
            created_at: now,
        };

        Ok((account, event))
    }

    /// Rename or retype the account
    pub fn update(
        &self,
        name: &str,
        account_type: AccountType,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        self.ensure_not_deleted()?;
        let name = validate_name(name)?;

        Ok(self.emit(AccountEvent::AccountUpdated {
            account_id: self.id,
            name,
            account_type,
            updated_at: now,
        }))
    }

    /// Credit the account
    pub fn add_amount(
        &self,
        amount: &Amount,
        reason: BalanceChangeReason,
        reference_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        self.ensure_not_deleted()?;
        let new_balance = self.balance.credit(amount)?;
        Ok(self.balance_changed(new_balance, Money::from(*amount), reason, reference_id, now))
    }

    /// Debit the account; the balance may become negative
    pub fn subtract_amount(
        &self,
        amount: &Amount,
        reason: BalanceChangeReason,
        reference_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        self.ensure_not_deleted()?;
        let new_balance = self.balance.debit(amount)?;
        Ok(self.balance_changed(new_balance, amount.negated(), reason, reference_id, now))
    }

    /// Apply the balance effect of a completed transaction recorded against this account
    pub fn apply_transaction(
        &self,
        transaction: &Transaction,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        if transaction.account_id() != self.id {
            return Err(DomainError::invalid_field(
                "account_id",
                "transaction is recorded against another account",
            ));
        }
        if transaction.status() != TransactionStatus::Completed {
            return Err(DomainError::invalid_field(
                "status",
                format!("{} transactions do not affect the balance", transaction.status()),
            ));
        }

        let reference = Some(transaction.id());
        match transaction.transaction_type() {
            TransactionType::Income => {
                self.add_amount(&transaction.amount(), BalanceChangeReason::Transaction, reference, now)
            }
            TransactionType::Expense => self.subtract_amount(
                &transaction.amount(),
                BalanceChangeReason::Transaction,
                reference,
                now,
            ),
            TransactionType::Transfer => Err(DomainError::invalid_field(
                "transaction_type",
                "transfers are registered through a transfer between accounts",
            )),
        }
    }

    /// Replace the balance with an observed value, justified by the caller
    pub fn reconcile(
        &self,
        new_balance: Money,
        justification: &str,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        self.ensure_not_deleted()?;
        let justification = justification.trim();
        if justification.chars().count() < MIN_JUSTIFICATION_LENGTH {
            return Err(DomainError::ReconciliationJustificationTooShort {
                min_length: MIN_JUSTIFICATION_LENGTH,
            });
        }

        Ok(self.emit(AccountEvent::AccountReconciled {
            account_id: self.id,
            previous_balance: self.balance,
            new_balance,
            justification: Some(justification.to_string()),
            reconciled_at: now,
        }))
    }

    /// Move the balance to `real_balance` and report the signed difference,
    /// which the caller records as an adjustment transaction.
    pub fn reconcile_to_real_balance(
        &self,
        real_balance: Money,
        now: DateTime<Utc>,
    ) -> Result<Reconciliation, DomainError> {
        self.ensure_not_deleted()?;
        let difference = real_balance.minus(&self.balance)?;

        let (account, event) = self.emit(AccountEvent::AccountReconciled {
            account_id: self.id,
            previous_balance: self.balance,
            new_balance: real_balance,
            justification: None,
            reconciled_at: now,
        });

        Ok(Reconciliation {
            account,
            event,
            difference,
        })
    }

    /// Soft delete. The caller checks that no transactions reference the account.
    pub fn delete(&self, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        self.ensure_not_deleted()?;
        Ok(self.emit(AccountEvent::AccountDeleted {
            account_id: self.id,
            deleted_at: now,
        }))
    }

    fn balance_changed(
        &self,
        new_balance: Money,
        delta: Money,
        reason: BalanceChangeReason,
        reference_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Change<Self> {
        self.emit(AccountEvent::BalanceChanged {
            account_id: self.id,
            previous_balance: self.balance,
            new_balance,
            delta,
            reason,
            reference_id,
            changed_at: now,
        })
    }

    fn ensure_not_deleted(&self) -> Result<(), DomainError> {
        if self.is_deleted {
            return Err(DomainError::AccountNotFound(self.id));
        }
        Ok(())
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn is_debit_capable(&self) -> bool {
        self.account_type.is_debit_capable()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::invalid_field("name", "must not be blank"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::invalid_field(
            "name",
            format!("must have at most {} characters", MAX_NAME_LENGTH),
        ));
    }
    Ok(name.to_string())
}

impl Aggregate for Account {
    type Event = AccountEvent;

    fn aggregate_type() -> &'static str {
        "Account"
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
            // state is built by `create`
            AccountEvent::AccountCreated { .. } => {}

            AccountEvent::AccountUpdated {
                name,
                account_type,
                updated_at,
                ..
            } => {
                self.name = name.clone();
                self.account_type = *account_type;
                self.updated_at = *updated_at;
            }

            AccountEvent::BalanceChanged {
                new_balance,
                changed_at,
                ..
            } => {
                self.balance = *new_balance;
                self.updated_at = *changed_at;
            }

            AccountEvent::AccountReconciled {
                new_balance,
                reconciled_at,
                ..
            } => {
                self.balance = *new_balance;
                self.updated_at = *reconciled_at;
            }

            AccountEvent::AccountDeleted { deleted_at, .. } => {
                self.is_deleted = true;
                self.updated_at = *deleted_at;
            }
        }
        self
    }
}
