//! Transfer between accounts

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregate::{Account, Aggregate, Transaction};
use crate::domain::{
    Amount, BalanceChangeReason, DomainError, DomainEvent, TransactionDetails, TransactionType,
};

/// Both accounts after the transfer plus the two linked transactions
#[derive(Debug, Clone)]
pub struct AccountTransfer {
    pub source: Account,
    pub destination: Account,
    /// EXPENSE recorded on the source account
    pub debit_transaction: Transaction,
    /// INCOME recorded on the destination account
    pub credit_transaction: Transaction,
    pub amount: Amount,
    pub events: Vec<DomainEvent>,
}

pub struct TransferBetweenAccounts;

impl TransferBetweenAccounts {
    /// Move `amount_cents` from `source` to `destination`.
    ///
    /// Fails with `InvalidTransferAmount`, `SameAccountTransfer` or
    /// `AccountsFromDifferentBudgets`, checked in that order.
    pub fn execute(
        source: &Account,
        destination: &Account,
        amount_cents: i64,
        category_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AccountTransfer, DomainError> {
        let amount =
            Amount::new(amount_cents).map_err(|_| DomainError::InvalidTransferAmount(amount_cents))?;
        if source.id() == destination.id() {
            return Err(DomainError::SameAccountTransfer);
        }
        if source.budget_id() != destination.budget_id() {
            return Err(DomainError::AccountsFromDifferentBudgets);
        }

        let (debit_transaction, debit_created) = Transaction::create(
            source.budget_id(),
            TransactionDetails {
                account_id: source.id(),
                category_id,
                description: format!("Transfer to {}", destination.name()),
                amount,
                transaction_type: TransactionType::Expense,
                transaction_date: now,
            },
            now,
        )?;
        let (credit_transaction, credit_created) = Transaction::create(
            destination.budget_id(),
            TransactionDetails {
                account_id: destination.id(),
                category_id,
                description: format!("Transfer from {}", source.name()),
                amount,
                transaction_type: TransactionType::Income,
                transaction_date: now,
            },
            now,
        )?;

        let (source, debited) = source.subtract_amount(
            &amount,
            BalanceChangeReason::Transfer,
            Some(debit_transaction.id()),
            now,
        )?;
        let (destination, credited) = destination.add_amount(
            &amount,
            BalanceChangeReason::Transfer,
            Some(credit_transaction.id()),
            now,
        )?;

        Ok(AccountTransfer {
            source,
            destination,
            debit_transaction,
            credit_transaction,
            amount,
            events: vec![
                debited.into(),
                credited.into(),
                debit_created.into(),
                credit_created.into(),
            ],
        })
    }
}
