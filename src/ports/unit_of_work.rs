//! Unit-of-Work ports.
//!
//! Each port persists the result of one composite operation inside a single
//! database transaction: every write lands or none does.

use async_trait::async_trait;
use thiserror::Error;

use crate::aggregate::{Account, Envelope, Transaction};
use crate::services::{AccountTransfer, PaidBill};

use super::PersistenceError;

/// Failure of a Unit-of-Work. Whatever was written before the failure has been rolled back.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("{operation}: failed to save {step}: {source}")]
    Save {
        operation: &'static str,
        step: &'static str,
        #[source]
        source: PersistenceError,
    },

    #[error("{operation}: failed to begin transaction: {source}")]
    Begin {
        operation: &'static str,
        #[source]
        source: PersistenceError,
    },

    #[error("{operation}: failed to commit transaction: {source}")]
    Commit {
        operation: &'static str,
        #[source]
        source: PersistenceError,
    },
}

impl ExecutionError {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Save { operation, .. }
            | Self::Begin { operation, .. }
            | Self::Commit { operation, .. } => operation,
        }
    }

    /// Step that failed, if the failure happened while writing
    pub fn step(&self) -> Option<&'static str> {
        match self {
            Self::Save { step, .. } => Some(step),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ReconcileAccountUnitOfWork: Send + Sync {
    /// Save the reconciled account together with its adjustment transaction
    async fn reconcile_account(
        &self,
        account: &Account,
        adjustment: Option<&Transaction>,
    ) -> Result<(), ExecutionError>;
}

#[async_trait]
pub trait TransferBetweenAccountsUnitOfWork: Send + Sync {
    /// Save both accounts and both transactions
    async fn transfer_between_accounts(&self, transfer: &AccountTransfer)
        -> Result<(), ExecutionError>;
}

#[async_trait]
pub trait TransferBetweenEnvelopesUnitOfWork: Send + Sync {
    async fn transfer_between_envelopes(
        &self,
        source: &Envelope,
        target: &Envelope,
    ) -> Result<(), ExecutionError>;
}

#[async_trait]
pub trait PayCreditCardBillUnitOfWork: Send + Sync {
    /// Save the debit transaction, the debited account and the paid bill
    async fn pay_credit_card_bill(&self, payment: &PaidBill) -> Result<(), ExecutionError>;
}

#[async_trait]
pub trait RegisterPastTransactionUnitOfWork: Send + Sync {
    /// Save a completed transaction with the account carrying its balance effect
    async fn register_past_transaction(
        &self,
        transaction: &Transaction,
        account: &Account,
    ) -> Result<(), ExecutionError>;
}
