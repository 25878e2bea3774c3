//! Aggregate module
//!
//! Aggregate roots of the budget domain. Commands validate against the current
//! state and return the resulting state together with the event describing the
//! change; the value they were called on is never modified.

pub mod account;
pub mod credit_card_bill;
pub mod envelope;
pub mod goal;
pub mod transaction;

pub use account::{Account, Reconciliation};
pub use credit_card_bill::CreditCardBill;
pub use envelope::Envelope;
pub use goal::Goal;
pub use transaction::Transaction;

use uuid::Uuid;

use crate::domain::DomainEvent;

/// New aggregate state paired with the event that produced it
pub type Change<A> = (A, <A as Aggregate>::Event);

/// Aggregate trait that all aggregates must implement
pub trait Aggregate: Sized + Clone {
    /// The type of events this aggregate emits
    type Event: Clone + Into<DomainEvent>;

    /// Get the aggregate type name (for logging and storage)
    fn aggregate_type() -> &'static str;

    fn id(&self) -> Uuid;

    /// Budget the aggregate belongs to
    fn budget_id(&self) -> Uuid;

    fn is_deleted(&self) -> bool;

    /// Apply an event to update the aggregate state
    fn apply(self, event: &Self::Event) -> Self;

    /// Apply `event` to a copy of `self` and hand back both
    fn emit(&self, event: Self::Event) -> Change<Self> {
        (self.clone().apply(&event), event)
    }

    /// Whether the aggregate is visible to `budget_id`
    fn is_visible_to(&self, budget_id: Uuid) -> bool {
        !self.is_deleted() && self.budget_id() == budget_id
    }
}
