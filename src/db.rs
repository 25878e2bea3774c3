//! Database module
//!
//! Connectivity and schema checks. The schema itself lives in `migrations/`.

use sqlx::PgPool;

/// Tables the persistence adapters read and write
pub const REQUIRED_TABLES: [&str; 6] = [
    "budgets",
    "accounts",
    "envelopes",
    "goals",
    "credit_card_bills",
    "transactions",
];

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let mut missing = Vec::new();

    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            missing.push(table);
        }
    }

    if !missing.is_empty() {
        tracing::error!(missing = ?missing, "Required tables do not exist");
        return Ok(false);
    }

    tracing::debug!(tables = REQUIRED_TABLES.len(), "Database schema verified");
    Ok(true)
}
