//! PostgreSQL Unit-of-Work
//!
//! Every operation checks out one connection with `pool.begin()`, runs its
//! writes in order on that connection and commits. The first failing write
//! rolls the transaction back before the error is returned.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error, warn};

use crate::aggregate::{Account, Envelope, Transaction};
use crate::ports::{
    ExecutionError, PayCreditCardBillUnitOfWork, ReconcileAccountUnitOfWork,
    RegisterPastTransactionUnitOfWork, TransferBetweenAccountsUnitOfWork,
    TransferBetweenEnvelopesUnitOfWork,
};
use crate::services::{AccountTransfer, PaidBill};

use super::plan::{self, Step};
use super::postgres_repository::execute_write;

/// Implements every Unit-of-Work port against a pool
#[derive(Debug, Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run(&self, operation: &'static str, steps: Vec<Step<'_>>) -> Result<(), ExecutionError> {
        let mut tx = self.pool.begin().await.map_err(|e| ExecutionError::Begin {
            operation,
            source: e.into(),
        })?;
        debug!(operation, steps = steps.len(), "Unit of work started");

        for (step, write) in steps {
            if let Err(source) = execute_write(&mut tx, write).await {
                warn!(
                    operation,
                    step,
                    entity = write.entity(),
                    id = %write.id(),
                    error = %source,
                    "Unit of work failed, rolling back"
                );
                // the reported error stays the write failure
                if let Err(rollback_error) = tx.rollback().await {
                    error!(operation, error = %rollback_error, "Rollback failed");
                }
                return Err(ExecutionError::Save {
                    operation,
                    step,
                    source,
                });
            }
        }

        tx.commit().await.map_err(|e| ExecutionError::Commit {
            operation,
            source: e.into(),
        })?;
        debug!(operation, "Unit of work committed");
        Ok(())
    }
}

#[async_trait]
impl ReconcileAccountUnitOfWork for PgUnitOfWork {
    async fn reconcile_account(
        &self,
        account: &Account,
        adjustment: Option<&Transaction>,
    ) -> Result<(), ExecutionError> {
        self.run(plan::RECONCILE_ACCOUNT, plan::reconcile_account(account, adjustment))
            .await
    }
}

#[async_trait]
impl TransferBetweenAccountsUnitOfWork for PgUnitOfWork {
    async fn transfer_between_accounts(
        &self,
        transfer: &AccountTransfer,
    ) -> Result<(), ExecutionError> {
        self.run(
            plan::TRANSFER_BETWEEN_ACCOUNTS,
            plan::transfer_between_accounts(transfer),
        )
        .await
    }
}

#[async_trait]
impl TransferBetweenEnvelopesUnitOfWork for PgUnitOfWork {
    async fn transfer_between_envelopes(
        &self,
        source: &Envelope,
        target: &Envelope,
    ) -> Result<(), ExecutionError> {
        self.run(
            plan::TRANSFER_BETWEEN_ENVELOPES,
            plan::transfer_between_envelopes(source, target),
        )
        .await
    }
}

#[async_trait]
impl PayCreditCardBillUnitOfWork for PgUnitOfWork {
    async fn pay_credit_card_bill(&self, payment: &PaidBill) -> Result<(), ExecutionError> {
        self.run(plan::PAY_CREDIT_CARD_BILL, plan::pay_credit_card_bill(payment))
            .await
    }
}

#[async_trait]
impl RegisterPastTransactionUnitOfWork for PgUnitOfWork {
    async fn register_past_transaction(
        &self,
        transaction: &Transaction,
        account: &Account,
    ) -> Result<(), ExecutionError> {
        self.run(
            plan::REGISTER_PAST_TRANSACTION,
            plan::register_past_transaction(transaction, account),
        )
        .await
    }
}
