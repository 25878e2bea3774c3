//! budget_core Library
//!
//! Financial consistency core of a shared-budget application: the money
//! movement aggregates, the transaction state machine, the domain services
//! and the use cases that persist their effects atomically.

pub mod aggregate;
pub mod domain;
pub mod handlers;
pub mod jobs;
pub mod persistence;
pub mod ports;
pub mod publisher;
pub mod services;

pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorKind};
pub use domain::{Amount, AmountError, DomainError, Money, OperationContext};
pub use domain::{AccountEvent, DomainEvent, TransactionEvent};
