//! Domain module
//!
//! Core domain types: money, errors, events, value types.

pub mod context;
pub mod error;
pub mod events;
pub mod money;
pub mod values;

pub use context::OperationContext;
pub use error::DomainError;
pub use events::{
    AccountEvent, CreditCardBillEvent, DomainEvent, EnvelopeEvent, GoalEvent, TransactionEvent,
};
pub use money::{Amount, AmountError, Money, MAX_CENTS};
pub use values::{
    AccountType, AutomaticContribution, BalanceChangeReason, BillStatus, ContributionFrequency,
    TransactionDetails, TransactionStatus, TransactionType,
};
