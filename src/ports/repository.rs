//! Repository ports.
//!
//! One port per aggregate. `find_by_id` returns soft-deleted aggregates too;
//! use cases decide whether a deleted or foreign aggregate counts as absent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::aggregate::{Account, CreditCardBill, Envelope, Goal, Transaction};

/// Infrastructure failure behind a port, with the original cause retained
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row does not describe a valid aggregate
    #[error("Invalid {entity} row {id}: {reason}")]
    Mapping {
        entity: &'static str,
        id: Uuid,
        reason: String,
    },

    #[error("Simulated failure writing {entity} {id}")]
    Simulated { entity: &'static str, id: Uuid },
}

impl PersistenceError {
    pub fn mapping(entity: &'static str, id: Uuid, reason: impl ToString) -> Self {
        Self::Mapping {
            entity,
            id,
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, PersistenceError>;

    /// Insert or update
    async fn save(&self, account: &Account) -> Result<(), PersistenceError>;

    /// Whether any non-deleted transaction is recorded against the account
    async fn has_transactions(&self, account_id: Uuid) -> Result<bool, PersistenceError>;
}

#[async_trait]
pub trait EnvelopeRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Envelope>, PersistenceError>;

    async fn save(&self, envelope: &Envelope) -> Result<(), PersistenceError>;

    /// Physical removal
    async fn delete(&self, id: Uuid) -> Result<(), PersistenceError>;

    /// Whether non-deleted transactions use the envelope's category in its budget
    async fn has_transactions(&self, envelope_id: Uuid) -> Result<bool, PersistenceError>;
}

#[async_trait]
pub trait GoalRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Goal>, PersistenceError>;

    async fn save(&self, goal: &Goal) -> Result<(), PersistenceError>;
}

#[async_trait]
pub trait CreditCardBillRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CreditCardBill>, PersistenceError>;

    async fn save(&self, bill: &CreditCardBill) -> Result<(), PersistenceError>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>, PersistenceError>;

    async fn save(&self, transaction: &Transaction) -> Result<(), PersistenceError>;

    /// SCHEDULED, non-deleted transactions dated before `now`, oldest first
    async fn find_overdue_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Transaction>, PersistenceError>;
}
