//! Row types and row⇄aggregate mapping.
//!
//! Money columns are BIGINT cents read into `i64`; enum columns are upper-case
//! text. Nothing here goes through a decimal string.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::aggregate::{Account, CreditCardBill, Envelope, Goal, Transaction};
use crate::domain::{Amount, AutomaticContribution, Money};
use crate::ports::PersistenceError;

pub(crate) const ACCOUNT_COLUMNS: &str =
    "id, budget_id, name, account_type, balance_cents, is_deleted, created_at, updated_at";

pub(crate) const ENVELOPE_COLUMNS: &str = "id, budget_id, category_id, name, monthly_limit_cents, \
     current_balance_cents, is_active, is_deleted, created_at, updated_at";

pub(crate) const GOAL_COLUMNS: &str = "id, budget_id, name, total_amount_cents, \
     accumulated_amount_cents, source_account_id, deadline, automatic_contribution, is_deleted, \
     created_at, updated_at";

pub(crate) const BILL_COLUMNS: &str = "id, credit_card_id, budget_id, closing_date, due_date, \
     amount_cents, status, paid_at, is_deleted, created_at, updated_at";

pub(crate) const TRANSACTION_COLUMNS: &str = "id, budget_id, account_id, category_id, description, \
     amount_cents, transaction_type, transaction_date, status, cancellation_reason, is_deleted, \
     created_at, updated_at";

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub name: String,
    pub account_type: String,
    pub balance_cents: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct EnvelopeRow {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub monthly_limit_cents: i64,
    pub current_balance_cents: i64,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct GoalRow {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub name: String,
    pub total_amount_cents: i64,
    pub accumulated_amount_cents: i64,
    pub source_account_id: Uuid,
    pub deadline: Option<NaiveDate>,
    pub automatic_contribution: Option<Json<AutomaticContribution>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CreditCardBillRow {
    pub id: Uuid,
    pub credit_card_id: Uuid,
    pub budget_id: Uuid,
    pub closing_date: NaiveDate,
    pub due_date: NaiveDate,
    pub amount_cents: i64,
    pub status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub account_id: Uuid,
    pub category_id: Uuid,
    pub description: String,
    pub amount_cents: i64,
    pub transaction_type: String,
    pub transaction_date: DateTime<Utc>,
    pub status: String,
    pub cancellation_reason: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =========================================================================
// Row → aggregate
// =========================================================================

fn money(entity: &'static str, id: Uuid, cents: i64) -> Result<Money, PersistenceError> {
    Money::from_cents(cents).map_err(|e| PersistenceError::mapping(entity, id, e))
}

fn amount(entity: &'static str, id: Uuid, cents: i64) -> Result<Amount, PersistenceError> {
    Amount::new(cents).map_err(|e| PersistenceError::mapping(entity, id, e))
}

fn text<T>(entity: &'static str, id: Uuid, value: &str) -> Result<T, PersistenceError>
where
    T: std::str::FromStr,
    T::Err: ToString,
{
    value
        .parse()
        .map_err(|e: T::Err| PersistenceError::mapping(entity, id, e))
}

impl TryFrom<AccountRow> for Account {
    type Error = PersistenceError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            account_type: text("Account", row.id, &row.account_type)?,
            balance: money("Account", row.id, row.balance_cents)?,
            id: row.id,
            budget_id: row.budget_id,
            name: row.name,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<EnvelopeRow> for Envelope {
    type Error = PersistenceError;

    fn try_from(row: EnvelopeRow) -> Result<Self, Self::Error> {
        let monthly_limit = money("Envelope", row.id, row.monthly_limit_cents)?;
        let current_balance = money("Envelope", row.id, row.current_balance_cents)?;
        if current_balance.is_negative() || current_balance > monthly_limit {
            return Err(PersistenceError::mapping(
                "Envelope",
                row.id,
                format!(
                    "balance {} outside 0..={}",
                    current_balance.cents(),
                    monthly_limit.cents()
                ),
            ));
        }

        Ok(Envelope {
            id: row.id,
            budget_id: row.budget_id,
            category_id: row.category_id,
            name: row.name,
            monthly_limit,
            current_balance,
            is_active: row.is_active,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<GoalRow> for Goal {
    type Error = PersistenceError;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        let accumulated_amount = money("Goal", row.id, row.accumulated_amount_cents)?;
        if accumulated_amount.is_negative() {
            return Err(PersistenceError::mapping(
                "Goal",
                row.id,
                "accumulated amount is negative",
            ));
        }

        Ok(Goal {
            total_amount: amount("Goal", row.id, row.total_amount_cents)?,
            accumulated_amount,
            id: row.id,
            budget_id: row.budget_id,
            name: row.name,
            source_account_id: row.source_account_id,
            deadline: row.deadline,
            automatic_contribution: row.automatic_contribution.map(|c| c.0),
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<CreditCardBillRow> for CreditCardBill {
    type Error = PersistenceError;

    fn try_from(row: CreditCardBillRow) -> Result<Self, Self::Error> {
        Ok(CreditCardBill {
            amount: money("CreditCardBill", row.id, row.amount_cents)?,
            status: text("CreditCardBill", row.id, &row.status)?,
            id: row.id,
            credit_card_id: row.credit_card_id,
            budget_id: row.budget_id,
            closing_date: row.closing_date,
            due_date: row.due_date,
            paid_at: row.paid_at,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = PersistenceError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            amount: amount("Transaction", row.id, row.amount_cents)?,
            transaction_type: text("Transaction", row.id, &row.transaction_type)?,
            status: text("Transaction", row.id, &row.status)?,
            id: row.id,
            budget_id: row.budget_id,
            account_id: row.account_id,
            category_id: row.category_id,
            description: row.description,
            transaction_date: row.transaction_date,
            cancellation_reason: row.cancellation_reason,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =========================================================================
// Aggregate → row
// =========================================================================

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            budget_id: account.budget_id,
            name: account.name.clone(),
            account_type: account.account_type.as_str().to_string(),
            balance_cents: account.balance.cents(),
            is_deleted: account.is_deleted,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

impl From<&Envelope> for EnvelopeRow {
    fn from(envelope: &Envelope) -> Self {
        Self {
            id: envelope.id,
            budget_id: envelope.budget_id,
            category_id: envelope.category_id,
            name: envelope.name.clone(),
            monthly_limit_cents: envelope.monthly_limit.cents(),
            current_balance_cents: envelope.current_balance.cents(),
            is_active: envelope.is_active,
            is_deleted: envelope.is_deleted,
            created_at: envelope.created_at,
            updated_at: envelope.updated_at,
        }
    }
}

impl From<&Goal> for GoalRow {
    fn from(goal: &Goal) -> Self {
        Self {
            id: goal.id,
            budget_id: goal.budget_id,
            name: goal.name.clone(),
            total_amount_cents: goal.total_amount.cents(),
            accumulated_amount_cents: goal.accumulated_amount.cents(),
            source_account_id: goal.source_account_id,
            deadline: goal.deadline,
            automatic_contribution: goal.automatic_contribution.clone().map(Json),
            is_deleted: goal.is_deleted,
            created_at: goal.created_at,
            updated_at: goal.updated_at,
        }
    }
}

impl From<&CreditCardBill> for CreditCardBillRow {
    fn from(bill: &CreditCardBill) -> Self {
        Self {
            id: bill.id,
            credit_card_id: bill.credit_card_id,
            budget_id: bill.budget_id,
            closing_date: bill.closing_date,
            due_date: bill.due_date,
            amount_cents: bill.amount.cents(),
            status: bill.status.as_str().to_string(),
            paid_at: bill.paid_at,
            is_deleted: bill.is_deleted,
            created_at: bill.created_at,
            updated_at: bill.updated_at,
        }
    }
}

impl From<&Transaction> for TransactionRow {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id,
            budget_id: transaction.budget_id,
            account_id: transaction.account_id,
            category_id: transaction.category_id,
            description: transaction.description.clone(),
            amount_cents: transaction.amount.cents(),
            transaction_type: transaction.transaction_type.as_str().to_string(),
            transaction_date: transaction.transaction_date,
            status: transaction.status.as_str().to_string(),
            cancellation_reason: transaction.cancellation_reason.clone(),
            is_deleted: transaction.is_deleted,
            created_at: transaction.created_at,
            updated_at: transaction.updated_at,
        }
    }
}
