//! Write plans of the Unit-of-Work operations.
//!
//! A plan is the ordered list of writes one composite operation performs.
//! Both Unit-of-Work adapters execute the same plans, so they agree on order
//! and on the step names reported in `ExecutionError`.

use uuid::Uuid;

use crate::aggregate::{Account, Aggregate, CreditCardBill, Envelope, Goal, Transaction};
use crate::services::{AccountTransfer, PaidBill};

/// One upsert of one aggregate
#[derive(Debug, Clone, Copy)]
pub enum PendingWrite<'a> {
    Account(&'a Account),
    Envelope(&'a Envelope),
    Goal(&'a Goal),
    CreditCardBill(&'a CreditCardBill),
    Transaction(&'a Transaction),
}

impl PendingWrite<'_> {
    pub fn entity(&self) -> &'static str {
        match self {
            Self::Account(_) => Account::aggregate_type(),
            Self::Envelope(_) => Envelope::aggregate_type(),
            Self::Goal(_) => Goal::aggregate_type(),
            Self::CreditCardBill(_) => CreditCardBill::aggregate_type(),
            Self::Transaction(_) => Transaction::aggregate_type(),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Account(a) => a.id(),
            Self::Envelope(e) => e.id(),
            Self::Goal(g) => g.id(),
            Self::CreditCardBill(b) => b.id(),
            Self::Transaction(t) => t.id(),
        }
    }
}

/// Step name paired with the write it performs
pub type Step<'a> = (&'static str, PendingWrite<'a>);

pub const RECONCILE_ACCOUNT: &str = "ReconcileAccount";
pub const TRANSFER_BETWEEN_ACCOUNTS: &str = "TransferBetweenAccounts";
pub const TRANSFER_BETWEEN_ENVELOPES: &str = "TransferBetweenEnvelopes";
pub const PAY_CREDIT_CARD_BILL: &str = "PayCreditCardBill";
pub const REGISTER_PAST_TRANSACTION: &str = "RegisterPastTransaction";

pub fn reconcile_account<'a>(account: &'a Account, adjustment: Option<&'a Transaction>) -> Vec<Step<'a>> {
    let mut steps = Vec::with_capacity(2);
    if let Some(transaction) = adjustment {
        steps.push(("adjustment transaction", PendingWrite::Transaction(transaction)));
    }
    steps.push(("account", PendingWrite::Account(account)));
    steps
}

pub fn transfer_between_accounts(transfer: &AccountTransfer) -> Vec<Step<'_>> {
    vec![
        ("debit transaction", PendingWrite::Transaction(&transfer.debit_transaction)),
        ("credit transaction", PendingWrite::Transaction(&transfer.credit_transaction)),
        ("source account", PendingWrite::Account(&transfer.source)),
        ("destination account", PendingWrite::Account(&transfer.destination)),
    ]
}

pub fn transfer_between_envelopes<'a>(source: &'a Envelope, target: &'a Envelope) -> Vec<Step<'a>> {
    vec![
        ("source envelope", PendingWrite::Envelope(source)),
        ("target envelope", PendingWrite::Envelope(target)),
    ]
}

pub fn pay_credit_card_bill(payment: &PaidBill) -> Vec<Step<'_>> {
    vec![
        ("payment transaction", PendingWrite::Transaction(&payment.transaction)),
        ("account", PendingWrite::Account(&payment.account)),
        ("credit card bill", PendingWrite::CreditCardBill(&payment.bill)),
    ]
}

pub fn register_past_transaction<'a>(transaction: &'a Transaction, account: &'a Account) -> Vec<Step<'a>> {
    vec![
        ("transaction", PendingWrite::Transaction(transaction)),
        ("account", PendingWrite::Account(account)),
    ]
}
