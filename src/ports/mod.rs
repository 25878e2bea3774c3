//! Ports - interfaces to infrastructure.
//!
//! The use cases depend only on these traits. Adapters live in
//! `persistence` (PostgreSQL and in-memory) and `publisher`.
//!
//! - Repository ports: per-aggregate load/save plus dependency checks
//! - Unit-of-Work ports: one atomic write per composite operation
//! - `BudgetAuthorizationService`: budget access lookup
//! - `EventPublisher`: delivery of committed domain events

mod authorization;
mod event_publisher;
mod repository;
mod unit_of_work;

pub use authorization::BudgetAuthorizationService;
pub use event_publisher::{EventPublisher, PublishError};
pub use repository::{
    AccountRepository, CreditCardBillRepository, EnvelopeRepository, GoalRepository,
    PersistenceError, TransactionRepository,
};
pub use unit_of_work::{
    ExecutionError, PayCreditCardBillUnitOfWork, ReconcileAccountUnitOfWork,
    RegisterPastTransactionUnitOfWork, TransferBetweenAccountsUnitOfWork,
    TransferBetweenEnvelopesUnitOfWork,
};
