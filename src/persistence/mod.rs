//! Persistence adapters
//!
//! PostgreSQL (sqlx) and in-memory implementations of the repository and
//! Unit-of-Work ports, plus the row mapping they share.

pub mod memory;
pub mod plan;
pub mod postgres_repository;
pub mod postgres_unit_of_work;
pub mod rows;

pub use memory::{InMemoryRepositories, InMemoryStore, InMemoryUnitOfWork, StaticBudgetAuthorization};
pub use plan::PendingWrite;
pub use postgres_repository::PgRepositories;
pub use postgres_unit_of_work::PgUnitOfWork;
