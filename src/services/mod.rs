//! Domain services
//!
//! Pure computations over several aggregates. They validate the joint
//! operation and return every changed aggregate with its events; persisting the
//! result atomically is the caller's job.

pub mod pay_credit_card_bill;
pub mod transfer_between_accounts;
pub mod transfer_between_envelopes;

pub use pay_credit_card_bill::{BillPayment, BillPaymentOutcome, PaidBill, PayCreditCardBill};
pub use transfer_between_accounts::{AccountTransfer, TransferBetweenAccounts};
pub use transfer_between_envelopes::{EnvelopeTransfer, TransferBetweenEnvelopes};
