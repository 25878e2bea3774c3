//! Common test utilities

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

/// Setup test database - truncate tables for a fresh state
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query(
        "TRUNCATE TABLE transactions, credit_card_bills, goals, envelopes, accounts, budgets CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to clean up DB");

    pool
}

/// Insert a budget row and return its id
pub async fn seed_budget(pool: &PgPool) -> Uuid {
    let budget_id = Uuid::new_v4();
    sqlx::query("INSERT INTO budgets (id, name) VALUES ($1, 'Household')")
        .bind(budget_id)
        .execute(pool)
        .await
        .expect("Failed to seed budget");
    budget_id
}
