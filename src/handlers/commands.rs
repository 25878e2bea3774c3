//! Command and result definitions
//!
//! Commands carry raw caller input (cents as `i64`); handlers validate it.
//! Every command names the budget it acts on.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Account, CreditCardBill, Envelope, Goal, Transaction};
use crate::domain::{AccountType, ContributionFrequency, TransactionType};

// =========================================================================
// Accounts
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountCommand {
    pub budget_id: Uuid,
    pub name: String,
    pub account_type: AccountType,
    pub initial_balance_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAccountCommand {
    pub budget_id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub account_type: AccountType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAccountCommand {
    pub budget_id: Uuid,
    pub account_id: Uuid,
}

/// Direct reconciliation: replace the balance, justified
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileAccountCommand {
    pub budget_id: Uuid,
    pub account_id: Uuid,
    pub new_balance_cents: i64,
    pub justification: String,
}

/// Reconciliation recorded as an adjustment transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileAccountWithAdjustmentCommand {
    pub budget_id: Uuid,
    pub account_id: Uuid,
    pub real_balance_cents: i64,
    /// Category of the adjustment transaction
    pub category_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferBetweenAccountsCommand {
    pub budget_id: Uuid,
    pub source_account_id: Uuid,
    pub destination_account_id: Uuid,
    pub amount_cents: i64,
    pub category_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResult {
    pub account: Account,
    /// `real - previous`, zero when the balances already matched
    pub difference_cents: i64,
    pub adjustment: Option<Transaction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferBetweenAccountsResult {
    pub source: Account,
    pub destination: Account,
    pub debit_transaction_id: Uuid,
    pub credit_transaction_id: Uuid,
    pub amount_cents: i64,
}

// =========================================================================
// Envelopes
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEnvelopeCommand {
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub monthly_limit_cents: i64,
}

/// Shared by `AddAmountToEnvelope` and `RemoveAmountFromEnvelope`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeAmountCommand {
    pub budget_id: Uuid,
    pub envelope_id: Uuid,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEnvelopeLimitCommand {
    pub budget_id: Uuid,
    pub envelope_id: Uuid,
    pub monthly_limit_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferBetweenEnvelopesCommand {
    pub budget_id: Uuid,
    pub source_envelope_id: Uuid,
    pub target_envelope_id: Uuid,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEnvelopeCommand {
    pub budget_id: Uuid,
    pub envelope_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferBetweenEnvelopesResult {
    pub source: Envelope,
    pub target: Envelope,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteEnvelopeResult {
    /// Removed from storage
    Deleted { envelope_id: Uuid },
    /// Still holds money or is referenced by transactions
    Deactivated { envelope: Envelope },
}

// =========================================================================
// Goals
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGoalCommand {
    pub budget_id: Uuid,
    pub name: String,
    pub total_amount_cents: i64,
    pub source_account_id: Uuid,
    pub deadline: Option<NaiveDate>,
}

/// Shared by `AddAmountToGoal` and `RemoveAmountFromGoal`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalAmountCommand {
    pub budget_id: Uuid,
    pub goal_id: Uuid,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureAutomaticContributionCommand {
    pub budget_id: Uuid,
    pub goal_id: Uuid,
    pub amount_cents: i64,
    pub frequency: ContributionFrequency,
    pub execution_day: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutomaticContributionResult {
    pub goal: Goal,
    /// First day the plan runs, on or after the day it was configured
    pub next_execution_date: Option<NaiveDate>,
}

/// Shared by `CancelAutomaticContribution` and `DeleteGoal`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalCommand {
    pub budget_id: Uuid,
    pub goal_id: Uuid,
}

// =========================================================================
// Credit card bills
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayCreditCardBillCommand {
    pub budget_id: Uuid,
    pub bill_id: Uuid,
    pub account_id: Uuid,
    pub amount_cents: i64,
    pub category_id: Uuid,
    /// Defaults to now
    pub payment_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PayCreditCardBillResult {
    /// Retry of a settled bill; nothing was written
    AlreadyPaid { bill_id: Uuid },
    Paid {
        bill: CreditCardBill,
        account: Account,
        transaction: Transaction,
        /// Paid after the due date
        paid_late: bool,
    },
}

// =========================================================================
// Transactions
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionCommand {
    pub budget_id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub description: String,
    pub amount_cents: i64,
    pub transaction_type: TransactionType,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTransactionCommand {
    pub budget_id: Uuid,
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub description: String,
    pub amount_cents: i64,
    pub transaction_type: TransactionType,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelScheduledTransactionCommand {
    pub budget_id: Uuid,
    pub transaction_id: Uuid,
    pub reason: String,
}

/// Shared by `MarkTransactionLate`, `CompleteScheduledTransaction` and `DeleteTransaction`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCommand {
    pub budget_id: Uuid,
    pub transaction_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedTransactionResult {
    pub transaction: Transaction,
    pub account: Account,
}
