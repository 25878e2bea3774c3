//! Transaction Aggregate
//!
//! Lifecycle: `SCHEDULED → LATE → COMPLETED` and `SCHEDULED → CANCELLED`.
//! COMPLETED and CANCELLED are terminal. Deletion is a flag, not a status, and
//! is only allowed while the transaction is still open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Amount, DomainError, TransactionDetails, TransactionEvent, TransactionStatus, TransactionType,
};

use super::{Aggregate, Change};

/// Transaction Aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub(crate) id: Uuid,
    pub(crate) budget_id: Uuid,
    pub(crate) account_id: Uuid,
    pub(crate) category_id: Uuid,
    pub(crate) description: String,
    pub(crate) amount: Amount,
    pub(crate) transaction_type: TransactionType,
    pub(crate) transaction_date: DateTime<Utc>,
    pub(crate) status: TransactionStatus,
    pub(crate) cancellation_reason: Option<String>,
    pub(crate) is_deleted: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction. Future-dated transactions start SCHEDULED, the rest COMPLETED.
    pub fn create(
        budget_id: Uuid,
        details: TransactionDetails,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        details.validate()?;

        let status = if details.transaction_date > now {
            TransactionStatus::Scheduled
        } else {
            TransactionStatus::Completed
        };

        let transaction = Self {
            id: Uuid::new_v4(),
            budget_id,
            account_id: details.account_id,
            category_id: details.category_id,
            description: details.description.trim().to_string(),
            amount: details.amount,
            transaction_type: details.transaction_type,
            transaction_date: details.transaction_date,
            status,
            cancellation_reason: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let event = TransactionEvent::TransactionCreated {
            transaction_id: transaction.id,
            budget_id,
            details: transaction.details(),
            status,
            created_at: now,
        };

        Ok((transaction, event))
    }

    /// SCHEDULED → LATE once the transaction date has passed
    pub fn mark_as_late(&self, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        self.ensure_not_deleted()?;
        if self.status != TransactionStatus::Scheduled {
            return Err(self.not_scheduled());
        }
        if !self.is_overdue(now) {
            return Err(DomainError::TransactionNotOverdue);
        }

        Ok(self.emit(TransactionEvent::TransactionMarkedLate {
            transaction_id: self.id,
            transaction_date: self.transaction_date,
            marked_at: now,
        }))
    }

    /// SCHEDULED → CANCELLED while the transaction date is still ahead
    pub fn cancel(&self, reason: &str, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        self.ensure_not_deleted()?;
        match self.status {
            TransactionStatus::Scheduled => {}
            TransactionStatus::Completed => return Err(DomainError::TransactionAlreadyExecuted),
            _ => return Err(self.not_scheduled()),
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::invalid_field("reason", "must not be blank"));
        }
        if self.transaction_date <= now {
            return Err(DomainError::TransactionCannotBeCancelled);
        }

        Ok(self.emit(TransactionEvent::TransactionCancelled {
            transaction_id: self.id,
            reason: reason.to_string(),
            cancelled_at: now,
        }))
    }

    /// SCHEDULED or LATE → COMPLETED. The caller applies the balance effect.
    pub fn complete(&self, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        self.ensure_not_deleted()?;
        match self.status {
            TransactionStatus::Scheduled | TransactionStatus::Late => {}
            TransactionStatus::Completed => return Err(DomainError::TransactionAlreadyExecuted),
            TransactionStatus::Cancelled => return Err(self.finalized()),
        }

        Ok(self.emit(TransactionEvent::TransactionCompleted {
            transaction_id: self.id,
            account_id: self.account_id,
            amount: self.amount,
            transaction_type: self.transaction_type,
            completed_at: now,
        }))
    }

    /// Replace the editable fields, validated as on creation
    pub fn update(
        &self,
        details: TransactionDetails,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        self.ensure_open()?;
        details.validate()?;

        Ok(self.emit(TransactionEvent::TransactionUpdated {
            transaction_id: self.id,
            details: TransactionDetails {
                description: details.description.trim().to_string(),
                ..details
            },
            updated_at: now,
        }))
    }

    pub fn delete(&self, now: DateTime<Utc>) -> Result<Change<Self>, DomainError> {
        self.ensure_open()?;
        Ok(self.emit(TransactionEvent::TransactionDeleted {
            transaction_id: self.id,
            deleted_at: now,
        }))
    }

    fn ensure_not_deleted(&self) -> Result<(), DomainError> {
        if self.is_deleted {
            return Err(DomainError::TransactionDeleted);
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        self.ensure_not_deleted()?;
        if self.status.is_terminal() {
            return Err(self.finalized());
        }
        Ok(())
    }

    fn not_scheduled(&self) -> DomainError {
        DomainError::TransactionNotScheduled {
            status: self.status.to_string(),
        }
    }

    fn finalized(&self) -> DomainError {
        DomainError::TransactionFinalized {
            status: self.status.to_string(),
        }
    }

    /// Scheduled for a moment that has already passed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.transaction_date < now
    }

    pub fn details(&self) -> TransactionDetails {
        TransactionDetails {
            account_id: self.account_id,
            category_id: self.category_id,
            description: self.description.clone(),
            amount: self.amount,
            transaction_type: self.transaction_type,
            transaction_date: self.transaction_date,
        }
    }

    pub fn account_id(&self) -> Uuid {
        self.account_id
    }

    pub fn category_id(&self) -> Uuid {
        self.category_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn transaction_date(&self) -> DateTime<Utc> {
        self.transaction_date
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }
}

impl Aggregate for Transaction {
    type Event = TransactionEvent;

    fn aggregate_type() -> &'static str {
        "Transaction"
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
            TransactionEvent::TransactionCreated { .. } => {}

            TransactionEvent::TransactionUpdated {
                details,
                updated_at,
                ..
            } => {
                self.account_id = details.account_id;
                self.category_id = details.category_id;
                self.description = details.description.clone();
                self.amount = details.amount;
                self.transaction_type = details.transaction_type;
                self.transaction_date = details.transaction_date;
                self.updated_at = *updated_at;
            }

            TransactionEvent::TransactionMarkedLate { marked_at, .. } => {
                self.status = TransactionStatus::Late;
                self.updated_at = *marked_at;
            }

            TransactionEvent::TransactionCancelled {
                reason,
                cancelled_at,
                ..
            } => {
                self.status = TransactionStatus::Cancelled;
                self.cancellation_reason = Some(reason.clone());
                self.updated_at = *cancelled_at;
            }

            TransactionEvent::TransactionCompleted { completed_at, .. } => {
                self.status = TransactionStatus::Completed;
                self.updated_at = *completed_at;
            }

            TransactionEvent::TransactionDeleted { deleted_at, .. } => {
                self.is_deleted = true;
                self.updated_at = *deleted_at;
            }
        }
        self
    }
}
