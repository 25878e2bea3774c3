//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;
use uuid::Uuid;

use super::money::AmountError;

/// Domain-specific errors
///
/// These errors represent business rule violations and aggregate invariant failures.
/// They are returned, never panicked, and carry the values needed to explain them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Balance does not cover the debit
    #[error("Insufficient balance: required {required} cents, available {available} cents")]
    InsufficientBalance { required: i64, available: i64 },

    /// Envelope would exceed its monthly limit
    #[error("Envelope limit exceeded: limit {limit} cents, resulting balance would be {attempted} cents")]
    EnvelopeLimitExceeded { limit: i64, attempted: i64 },

    /// Envelope holds less than requested
    #[error("Insufficient envelope balance: requested {requested} cents, available {available} cents")]
    InsufficientEnvelopeBalance { requested: i64, available: i64 },

    #[error("Invalid transfer amount: {0} cents")]
    InvalidTransferAmount(i64),

    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    #[error("Cannot transfer to the same envelope")]
    SameEnvelopeTransfer,

    #[error("Accounts belong to different budgets")]
    AccountsFromDifferentBudgets,

    #[error("Envelopes belong to different budgets")]
    EnvelopesFromDifferentBudgets,

    #[error("Envelope is inactive: {0}")]
    EnvelopeInactive(Uuid),

    /// Operation requires a SCHEDULED transaction
    #[error("Transaction is not scheduled (status {status})")]
    TransactionNotScheduled { status: String },

    #[error("Transaction has already been executed")]
    TransactionAlreadyExecuted,

    #[error("Transaction can no longer be cancelled: its execution date has passed")]
    TransactionCannotBeCancelled,

    #[error("Transaction is not overdue yet")]
    TransactionNotOverdue,

    /// COMPLETED and CANCELLED transactions are immutable
    #[error("Transaction is finalized (status {status})")]
    TransactionFinalized { status: String },

    #[error("Transaction has been deleted")]
    TransactionDeleted,

    #[error("Goal is not active")]
    GoalNotActive,

    #[error("Invalid contribution amount: {0}")]
    InvalidContributionAmount(String),

    #[error("Invalid start date: {0}")]
    InvalidStartDate(String),

    #[error("Automatic contribution is already configured for this goal")]
    AutomaticContributionAlreadyConfigured,

    #[error("Insufficient goal amount: requested {requested} cents, accumulated {accumulated} cents")]
    InsufficientGoalAmount { requested: i64, accumulated: i64 },

    #[error("Account type {account_type} cannot be used to pay bills")]
    AccountNotDebitCapable { account_type: String },

    #[error("Reconciliation justification must have at least {min_length} characters")]
    ReconciliationJustificationTooShort { min_length: usize },

    #[error("Account still has transactions and cannot be deleted")]
    AccountHasTransactions,

    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Credit card bill not found: {0}")]
    CreditCardBillNotFound(Uuid),

    /// Invalid amount (zero, negative, or malformed)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount exceeds the supported range")]
    MoneyOverflow,

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl DomainError {
    pub fn insufficient_balance(required: i64, available: i64) -> Self {
        Self::InsufficientBalance { required, available }
    }

    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Cross-budget access is reported as absence
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound(_) | Self::CreditCardBillNotFound(_)
        )
    }

    /// Check if this is a client error (caller's input or the aggregate's state)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::MoneyOverflow) && !self.is_not_found()
    }
}

impl From<AmountError> for DomainError {
    fn from(err: AmountError) -> Self {
        match err {
            AmountError::Overflow => DomainError::MoneyOverflow,
            other => DomainError::InvalidAmount(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_error() {
        let err = DomainError::insufficient_balance(100, 50);

        assert!(err.is_client_error());
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn test_not_found_is_not_client_error() {
        let err = DomainError::AccountNotFound(Uuid::new_v4());
        assert!(err.is_not_found());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_amount_error_conversion() {
        assert_eq!(DomainError::from(AmountError::Overflow), DomainError::MoneyOverflow);
        assert!(matches!(
            DomainError::from(AmountError::NotPositive(0)),
            DomainError::InvalidAmount(_)
        ));
    }
}
