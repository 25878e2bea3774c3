//! PostgreSQL repositories
//!
//! Saves are upserts keyed by id. The write functions take a connection so the
//! Unit-of-Work can run them inside its own transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::aggregate::{Account, CreditCardBill, Envelope, Goal, Transaction};
use crate::domain::TransactionStatus;
use crate::ports::{
    AccountRepository, CreditCardBillRepository, EnvelopeRepository, GoalRepository,
    PersistenceError, TransactionRepository,
};

use super::plan::PendingWrite;
use super::rows::{
    AccountRow, CreditCardBillRow, EnvelopeRow, GoalRow, TransactionRow, ACCOUNT_COLUMNS,
    BILL_COLUMNS, ENVELOPE_COLUMNS, GOAL_COLUMNS, TRANSACTION_COLUMNS,
};

/// All repository ports over one pool
#[derive(Debug, Clone)]
pub struct PgRepositories {
    pool: PgPool,
}

impl PgRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write(&self, write: PendingWrite<'_>) -> Result<(), PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        execute_write(&mut conn, write).await
    }
}

// =========================================================================
// Writes
// =========================================================================

/// Run one pending write on `conn`
pub(crate) async fn execute_write(
    conn: &mut PgConnection,
    write: PendingWrite<'_>,
) -> Result<(), PersistenceError> {
    match write {
        PendingWrite::Account(account) => upsert_account(conn, &AccountRow::from(account)).await,
        PendingWrite::Envelope(envelope) => upsert_envelope(conn, &EnvelopeRow::from(envelope)).await,
        PendingWrite::Goal(goal) => upsert_goal(conn, &GoalRow::from(goal)).await,
        PendingWrite::CreditCardBill(bill) => upsert_bill(conn, &CreditCardBillRow::from(bill)).await,
        PendingWrite::Transaction(transaction) => {
            upsert_transaction(conn, &TransactionRow::from(transaction)).await
        }
    }
}

async fn upsert_account(conn: &mut PgConnection, row: &AccountRow) -> Result<(), PersistenceError> {
    sqlx::query(
        r#"
        INSERT INTO accounts (id, budget_id, name, account_type, balance_cents, is_deleted, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            account_type = EXCLUDED.account_type,
            balance_cents = EXCLUDED.balance_cents,
            is_deleted = EXCLUDED.is_deleted,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(row.id)
    .bind(row.budget_id)
    .bind(&row.name)
    .bind(&row.account_type)
    .bind(row.balance_cents)
    .bind(row.is_deleted)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_envelope(conn: &mut PgConnection, row: &EnvelopeRow) -> Result<(), PersistenceError> {
    sqlx::query(
        r#"
        INSERT INTO envelopes (
            id, budget_id, category_id, name, monthly_limit_cents, current_balance_cents,
            is_active, is_deleted, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            monthly_limit_cents = EXCLUDED.monthly_limit_cents,
            current_balance_cents = EXCLUDED.current_balance_cents,
            is_active = EXCLUDED.is_active,
            is_deleted = EXCLUDED.is_deleted,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(row.id)
    .bind(row.budget_id)
    .bind(row.category_id)
    .bind(&row.name)
    .bind(row.monthly_limit_cents)
    .bind(row.current_balance_cents)
    .bind(row.is_active)
    .bind(row.is_deleted)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_goal(conn: &mut PgConnection, row: &GoalRow) -> Result<(), PersistenceError> {
    sqlx::query(
        r#"
        INSERT INTO goals (
            id, budget_id, name, total_amount_cents, accumulated_amount_cents, source_account_id,
            deadline, automatic_contribution, is_deleted, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            total_amount_cents = EXCLUDED.total_amount_cents,
            accumulated_amount_cents = EXCLUDED.accumulated_amount_cents,
            deadline = EXCLUDED.deadline,
            automatic_contribution = EXCLUDED.automatic_contribution,
            is_deleted = EXCLUDED.is_deleted,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(row.id)
    .bind(row.budget_id)
    .bind(&row.name)
    .bind(row.total_amount_cents)
    .bind(row.accumulated_amount_cents)
    .bind(row.source_account_id)
    .bind(row.deadline)
    .bind(&row.automatic_contribution)
    .bind(row.is_deleted)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_bill(conn: &mut PgConnection, row: &CreditCardBillRow) -> Result<(), PersistenceError> {
    sqlx::query(
        r#"
        INSERT INTO credit_card_bills (
            id, credit_card_id, budget_id, closing_date, due_date, amount_cents, status, paid_at,
            is_deleted, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO UPDATE SET
            amount_cents = EXCLUDED.amount_cents,
            status = EXCLUDED.status,
            paid_at = EXCLUDED.paid_at,
            is_deleted = EXCLUDED.is_deleted,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(row.id)
    .bind(row.credit_card_id)
    .bind(row.budget_id)
    .bind(row.closing_date)
    .bind(row.due_date)
    .bind(row.amount_cents)
    .bind(&row.status)
    .bind(row.paid_at)
    .bind(row.is_deleted)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn upsert_transaction(
    conn: &mut PgConnection,
    row: &TransactionRow,
) -> Result<(), PersistenceError> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, budget_id, account_id, category_id, description, amount_cents, transaction_type,
            transaction_date, status, cancellation_reason, is_deleted, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (id) DO UPDATE SET
            account_id = EXCLUDED.account_id,
            category_id = EXCLUDED.category_id,
            description = EXCLUDED.description,
            amount_cents = EXCLUDED.amount_cents,
            transaction_type = EXCLUDED.transaction_type,
            transaction_date = EXCLUDED.transaction_date,
            status = EXCLUDED.status,
            cancellation_reason = EXCLUDED.cancellation_reason,
            is_deleted = EXCLUDED.is_deleted,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(row.id)
    .bind(row.budget_id)
    .bind(row.account_id)
    .bind(row.category_id)
    .bind(&row.description)
    .bind(row.amount_cents)
    .bind(&row.transaction_type)
    .bind(row.transaction_date)
    .bind(&row.status)
    .bind(&row.cancellation_reason)
    .bind(row.is_deleted)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// =========================================================================
// Ports
// =========================================================================

#[async_trait]
impl AccountRepository for PgRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, PersistenceError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Account::try_from).transpose()
    }

    async fn save(&self, account: &Account) -> Result<(), PersistenceError> {
        self.write(PendingWrite::Account(account)).await
    }

    async fn has_transactions(&self, account_id: Uuid) -> Result<bool, PersistenceError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM transactions WHERE account_id = $1 AND is_deleted = FALSE
            )
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl EnvelopeRepository for PgRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Envelope>, PersistenceError> {
        let row: Option<EnvelopeRow> =
            sqlx::query_as(&format!("SELECT {} FROM envelopes WHERE id = $1", ENVELOPE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Envelope::try_from).transpose()
    }

    async fn save(&self, envelope: &Envelope) -> Result<(), PersistenceError> {
        self.write(PendingWrite::Envelope(envelope)).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM envelopes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn has_transactions(&self, envelope_id: Uuid) -> Result<bool, PersistenceError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM transactions t
                JOIN envelopes e ON e.category_id = t.category_id AND e.budget_id = t.budget_id
                WHERE e.id = $1 AND t.is_deleted = FALSE
            )
            "#,
        )
        .bind(envelope_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl GoalRepository for PgRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Goal>, PersistenceError> {
        let row: Option<GoalRow> =
            sqlx::query_as(&format!("SELECT {} FROM goals WHERE id = $1", GOAL_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Goal::try_from).transpose()
    }

    async fn save(&self, goal: &Goal) -> Result<(), PersistenceError> {
        self.write(PendingWrite::Goal(goal)).await
    }
}

#[async_trait]
impl CreditCardBillRepository for PgRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CreditCardBill>, PersistenceError> {
        let row: Option<CreditCardBillRow> = sqlx::query_as(&format!(
            "SELECT {} FROM credit_card_bills WHERE id = $1",
            BILL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(CreditCardBill::try_from).transpose()
    }

    async fn save(&self, bill: &CreditCardBill) -> Result<(), PersistenceError> {
        self.write(PendingWrite::CreditCardBill(bill)).await
    }
}

#[async_trait]
impl TransactionRepository for PgRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>, PersistenceError> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Transaction::try_from).transpose()
    }

    async fn save(&self, transaction: &Transaction) -> Result<(), PersistenceError> {
        self.write(PendingWrite::Transaction(transaction)).await
    }

    async fn find_overdue_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Transaction>, PersistenceError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE status = $1 AND is_deleted = FALSE AND transaction_date < $2
            ORDER BY transaction_date ASC
            LIMIT $3
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(TransactionStatus::Scheduled.as_str())
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }
}
