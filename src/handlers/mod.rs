//! Command Handlers module
//!
//! One handler per use case. Every handler follows the same sequence:
//! authorize, load, compute, persist, then publish the committed events.
//! A handler never publishes before its write has succeeded.

mod accounts;
mod bills;
mod commands;
mod envelopes;
mod goals;
mod support;
mod transactions;

#[cfg(test)]
mod tests;

pub use accounts::{
    CreateAccountHandler, DeleteAccountHandler, ReconcileAccountHandler,
    ReconcileAccountWithAdjustmentHandler, TransferBetweenAccountsHandler, UpdateAccountHandler,
};
pub use bills::PayCreditCardBillHandler;
pub use commands::*;
pub use envelopes::{
    AddAmountToEnvelopeHandler, CreateEnvelopeHandler, DeleteEnvelopeHandler,
    RemoveAmountFromEnvelopeHandler, TransferBetweenEnvelopesHandler, UpdateEnvelopeLimitHandler,
};
pub use goals::{
    AddAmountToGoalHandler, CancelAutomaticContributionHandler,
    ConfigureAutomaticContributionHandler, CreateGoalHandler, DeleteGoalHandler,
    RemoveAmountFromGoalHandler,
};
pub use support::BudgetPorts;
pub use transactions::{
    CancelScheduledTransactionHandler, CompleteScheduledTransactionHandler,
    CreateTransactionHandler, DeleteTransactionHandler, MarkTransactionLateHandler,
    UpdateTransactionHandler,
};
