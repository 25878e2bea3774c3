//! Error handling module
//!
//! Application error returned by every use case. Callers dispatch on
//! `AppError::kind()` rather than on concrete variants.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::ports::{ExecutionError, PersistenceError};

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// Loading failed in infrastructure
    #[error("{entity} repository error: {source}")]
    Repository {
        entity: &'static str,
        #[source]
        source: PersistenceError,
    },

    /// A single-aggregate save failed
    #[error("failed to persist {entity}: {source}")]
    PersistenceFailed {
        entity: &'static str,
        #[source]
        source: PersistenceError,
    },

    #[error("User {user_id} has no access to budget {budget_id}")]
    InsufficientPermissions { user_id: Uuid, budget_id: Uuid },

    #[error("Authorization lookup failed: {source}")]
    AuthorizationFailed {
        #[source]
        source: PersistenceError,
    },

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Error category used for dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    /// Business rule or invariant violation
    Domain,
    /// Infrastructure failure; retrying may help
    Infrastructure,
}

impl AppError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn repository(entity: &'static str) -> impl FnOnce(PersistenceError) -> Self {
        move |source| Self::Repository { entity, source }
    }

    pub fn persistence_failed(entity: &'static str) -> impl FnOnce(PersistenceError) -> Self {
        move |source| Self::PersistenceFailed { entity, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::InsufficientPermissions { .. } => ErrorKind::PermissionDenied,
            AppError::Domain(e) if e.is_not_found() => ErrorKind::NotFound,
            AppError::Domain(DomainError::MoneyOverflow) => ErrorKind::Infrastructure,
            AppError::Domain(_) => ErrorKind::Domain,
            AppError::Repository { .. }
            | AppError::PersistenceFailed { .. }
            | AppError::AuthorizationFailed { .. }
            | AppError::Execution(_) => ErrorKind::Infrastructure,
        }
    }

    /// Stable snake_case code
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "not_found",
            AppError::Repository { .. } => "repository_error",
            AppError::PersistenceFailed { .. } => "persistence_failed",
            AppError::InsufficientPermissions { .. } => "insufficient_permissions",
            AppError::AuthorizationFailed { .. } => "authorization_failed",
            AppError::Execution(_) => "execution_error",
            AppError::Domain(domain_err) => match domain_err {
                DomainError::InsufficientBalance { .. } => "insufficient_balance",
                DomainError::EnvelopeLimitExceeded { .. } => "envelope_limit_exceeded",
                DomainError::InsufficientEnvelopeBalance { .. } => "insufficient_envelope_balance",
                DomainError::InvalidTransferAmount(_) => "invalid_transfer_amount",
                DomainError::SameAccountTransfer => "same_account_transfer",
                DomainError::SameEnvelopeTransfer => "same_envelope_transfer",
                DomainError::AccountsFromDifferentBudgets => "accounts_from_different_budgets",
                DomainError::EnvelopesFromDifferentBudgets => "envelopes_from_different_budgets",
                DomainError::EnvelopeInactive(_) => "envelope_inactive",
                DomainError::TransactionNotScheduled { .. } => "transaction_not_scheduled",
                DomainError::TransactionAlreadyExecuted => "transaction_already_executed",
                DomainError::TransactionCannotBeCancelled => "transaction_cannot_be_cancelled",
                DomainError::TransactionNotOverdue => "transaction_not_overdue",
                DomainError::TransactionFinalized { .. } => "transaction_finalized",
                DomainError::TransactionDeleted => "transaction_deleted",
                DomainError::GoalNotActive => "goal_not_active",
                DomainError::InvalidContributionAmount(_) => "invalid_contribution_amount",
                DomainError::InvalidStartDate(_) => "invalid_start_date",
                DomainError::AutomaticContributionAlreadyConfigured => {
                    "automatic_contribution_already_configured"
                }
                DomainError::InsufficientGoalAmount { .. } => "insufficient_goal_amount",
                DomainError::AccountNotDebitCapable { .. } => "account_not_debit_capable",
                DomainError::ReconciliationJustificationTooShort { .. } => {
                    "reconciliation_justification_too_short"
                }
                DomainError::AccountHasTransactions => "account_has_transactions",
                DomainError::AccountNotFound(_) => "account_not_found",
                DomainError::CreditCardBillNotFound(_) => "credit_card_bill_not_found",
                DomainError::InvalidAmount(_) => "invalid_amount",
                DomainError::MoneyOverflow => "money_overflow",
                DomainError::InvalidField { .. } => "invalid_field",
            },
        }
    }

    /// The domain error, when this is one
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            AppError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_not_found_dispatches_as_not_found() {
        let err = AppError::from(DomainError::AccountNotFound(Uuid::nil()));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.error_code(), "account_not_found");
    }

    #[test]
    fn test_repository_error_keeps_cause() {
        let id = Uuid::new_v4();
        let err = AppError::repository("Account")(PersistenceError::Simulated {
            entity: "Account",
            id,
        });

        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source, Some(format!("Simulated failure writing Account {}", id)));
    }

    #[test]
    fn test_permission_error() {
        let err = AppError::InsufficientPermissions {
            user_id: Uuid::nil(),
            budget_id: Uuid::nil(),
        };
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(err.error_code(), "insufficient_permissions");
    }
}
