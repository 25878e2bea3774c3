//! Domain Events
//!
//! Immutable facts produced by aggregate operations. Each mutating operation
//! returns the event it caused next to the new aggregate state; use cases publish
//! the collected events only after the change is committed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::{Amount, Money};
use super::values::{
    AccountType, AutomaticContribution, BalanceChangeReason, TransactionDetails, TransactionStatus,
    TransactionType,
};

/// Account-related events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AccountEvent {
    AccountCreated {
        account_id: Uuid,
        budget_id: Uuid,
        name: String,
        account_type: AccountType,
        initial_balance: Money,
        created_at: DateTime<Utc>,
    },

    AccountUpdated {
        account_id: Uuid,
        name: String,
        account_type: AccountType,
        updated_at: DateTime<Utc>,
    },

    /// Balance moved by a signed delta
    BalanceChanged {
        account_id: Uuid,
        previous_balance: Money,
        new_balance: Money,
        delta: Money,
        reason: BalanceChangeReason,
        reference_id: Option<Uuid>,
        changed_at: DateTime<Utc>,
    },

    /// Balance replaced to match a real-world observation
    AccountReconciled {
        account_id: Uuid,
        previous_balance: Money,
        new_balance: Money,
        justification: Option<String>,
        reconciled_at: DateTime<Utc>,
    },

    AccountDeleted {
        account_id: Uuid,
        deleted_at: DateTime<Utc>,
    },
}

impl AccountEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountCreated { .. } => "AccountCreated",
            AccountEvent::AccountUpdated { .. } => "AccountUpdated",
            AccountEvent::BalanceChanged { .. } => "AccountBalanceChanged",
            AccountEvent::AccountReconciled { .. } => "AccountReconciled",
            AccountEvent::AccountDeleted { .. } => "AccountDeleted",
        }
    }

    pub fn account_id(&self) -> Uuid {
        match self {
            AccountEvent::AccountCreated { account_id, .. }
            | AccountEvent::AccountUpdated { account_id, .. }
            | AccountEvent::BalanceChanged { account_id, .. }
            | AccountEvent::AccountReconciled { account_id, .. }
            | AccountEvent::AccountDeleted { account_id, .. } => *account_id,
        }
    }
}

/// Envelope-related events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EnvelopeEvent {
    EnvelopeCreated {
        envelope_id: Uuid,
        budget_id: Uuid,
        category_id: Uuid,
        name: String,
        monthly_limit: Money,
        created_at: DateTime<Utc>,
    },

    AmountAdded {
        envelope_id: Uuid,
        amount: Amount,
        new_balance: Money,
        added_at: DateTime<Utc>,
    },

    AmountRemoved {
        envelope_id: Uuid,
        amount: Amount,
        new_balance: Money,
        removed_at: DateTime<Utc>,
    },

    TransferredOut {
        envelope_id: Uuid,
        target_envelope_id: Uuid,
        amount: Amount,
        new_balance: Money,
        transferred_at: DateTime<Utc>,
    },

    TransferredIn {
        envelope_id: Uuid,
        source_envelope_id: Uuid,
        amount: Amount,
        new_balance: Money,
        transferred_at: DateTime<Utc>,
    },

    MonthlyLimitUpdated {
        envelope_id: Uuid,
        previous_limit: Money,
        new_limit: Money,
        updated_at: DateTime<Utc>,
    },

    EnvelopeDeactivated {
        envelope_id: Uuid,
        deactivated_at: DateTime<Utc>,
    },

    EnvelopeDeleted {
        envelope_id: Uuid,
        deleted_at: DateTime<Utc>,
    },
}

impl EnvelopeEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            EnvelopeEvent::EnvelopeCreated { .. } => "EnvelopeCreated",
            EnvelopeEvent::AmountAdded { .. } => "EnvelopeAmountAdded",
            EnvelopeEvent::AmountRemoved { .. } => "EnvelopeAmountRemoved",
            EnvelopeEvent::TransferredOut { .. } => "EnvelopeTransferredOut",
            EnvelopeEvent::TransferredIn { .. } => "EnvelopeTransferredIn",
            EnvelopeEvent::MonthlyLimitUpdated { .. } => "EnvelopeMonthlyLimitUpdated",
            EnvelopeEvent::EnvelopeDeactivated { .. } => "EnvelopeDeactivated",
            EnvelopeEvent::EnvelopeDeleted { .. } => "EnvelopeDeleted",
        }
    }

    pub fn envelope_id(&self) -> Uuid {
        match self {
            EnvelopeEvent::EnvelopeCreated { envelope_id, .. }
            | EnvelopeEvent::AmountAdded { envelope_id, .. }
            | EnvelopeEvent::AmountRemoved { envelope_id, .. }
            | EnvelopeEvent::TransferredOut { envelope_id, .. }
            | EnvelopeEvent::TransferredIn { envelope_id, .. }
            | EnvelopeEvent::MonthlyLimitUpdated { envelope_id, .. }
            | EnvelopeEvent::EnvelopeDeactivated { envelope_id, .. }
            | EnvelopeEvent::EnvelopeDeleted { envelope_id, .. } => *envelope_id,
        }
    }
}

/// Goal-related events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GoalEvent {
    GoalCreated {
        goal_id: Uuid,
        budget_id: Uuid,
        name: String,
        total_amount: Amount,
        source_account_id: Uuid,
        deadline: Option<NaiveDate>,
        created_at: DateTime<Utc>,
    },

    AmountAdded {
        goal_id: Uuid,
        amount: Amount,
        accumulated_amount: Money,
        /// True when this contribution reached the total
        achieved: bool,
        added_at: DateTime<Utc>,
    },

    AmountRemoved {
        goal_id: Uuid,
        amount: Amount,
        accumulated_amount: Money,
        removed_at: DateTime<Utc>,
    },

    AutomaticContributionConfigured {
        goal_id: Uuid,
        contribution: AutomaticContribution,
        configured_at: DateTime<Utc>,
    },

    AutomaticContributionCancelled {
        goal_id: Uuid,
        cancelled_at: DateTime<Utc>,
    },

    GoalDeleted {
        goal_id: Uuid,
        deleted_at: DateTime<Utc>,
    },
}

impl GoalEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            GoalEvent::GoalCreated { .. } => "GoalCreated",
            GoalEvent::AmountAdded { .. } => "GoalAmountAdded",
            GoalEvent::AmountRemoved { .. } => "GoalAmountRemoved",
            GoalEvent::AutomaticContributionConfigured { .. } => "AutomaticContributionConfigured",
            GoalEvent::AutomaticContributionCancelled { .. } => "AutomaticContributionCancelled",
            GoalEvent::GoalDeleted { .. } => "GoalDeleted",
        }
    }

    pub fn goal_id(&self) -> Uuid {
        match self {
            GoalEvent::GoalCreated { goal_id, .. }
            | GoalEvent::AmountAdded { goal_id, .. }
            | GoalEvent::AmountRemoved { goal_id, .. }
            | GoalEvent::AutomaticContributionConfigured { goal_id, .. }
            | GoalEvent::AutomaticContributionCancelled { goal_id, .. }
            | GoalEvent::GoalDeleted { goal_id, .. } => *goal_id,
        }
    }
}

/// Credit card bill events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CreditCardBillEvent {
    BillCreated {
        bill_id: Uuid,
        credit_card_id: Uuid,
        budget_id: Uuid,
        closing_date: NaiveDate,
        due_date: NaiveDate,
        amount: Money,
        created_at: DateTime<Utc>,
    },

    BillPaid {
        bill_id: Uuid,
        credit_card_id: Uuid,
        budget_id: Uuid,
        account_id: Uuid,
        transaction_id: Uuid,
        amount: Amount,
        paid_by: Uuid,
        paid_at: DateTime<Utc>,
    },
}

impl CreditCardBillEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            CreditCardBillEvent::BillCreated { .. } => "CreditCardBillCreated",
            CreditCardBillEvent::BillPaid { .. } => "BillPaid",
        }
    }

    pub fn bill_id(&self) -> Uuid {
        match self {
            CreditCardBillEvent::BillCreated { bill_id, .. }
            | CreditCardBillEvent::BillPaid { bill_id, .. } => *bill_id,
        }
    }
}

/// Transaction lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransactionEvent {
    TransactionCreated {
        transaction_id: Uuid,
        budget_id: Uuid,
        details: TransactionDetails,
        status: TransactionStatus,
        created_at: DateTime<Utc>,
    },

    TransactionUpdated {
        transaction_id: Uuid,
        details: TransactionDetails,
        updated_at: DateTime<Utc>,
    },

    TransactionMarkedLate {
        transaction_id: Uuid,
        transaction_date: DateTime<Utc>,
        marked_at: DateTime<Utc>,
    },

    TransactionCancelled {
        transaction_id: Uuid,
        reason: String,
        cancelled_at: DateTime<Utc>,
    },

    TransactionCompleted {
        transaction_id: Uuid,
        account_id: Uuid,
        amount: Amount,
        transaction_type: TransactionType,
        completed_at: DateTime<Utc>,
    },

    TransactionDeleted {
        transaction_id: Uuid,
        deleted_at: DateTime<Utc>,
    },
}

impl TransactionEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            TransactionEvent::TransactionCreated { .. } => "TransactionCreated",
            TransactionEvent::TransactionUpdated { .. } => "TransactionUpdated",
            TransactionEvent::TransactionMarkedLate { .. } => "TransactionMarkedLate",
            TransactionEvent::TransactionCancelled { .. } => "TransactionCancelled",
            TransactionEvent::TransactionCompleted { .. } => "TransactionCompleted",
            TransactionEvent::TransactionDeleted { .. } => "TransactionDeleted",
        }
    }

    pub fn transaction_id(&self) -> Uuid {
        match self {
            TransactionEvent::TransactionCreated { transaction_id, .. }
            | TransactionEvent::TransactionUpdated { transaction_id, .. }
            | TransactionEvent::TransactionMarkedLate { transaction_id, .. }
            | TransactionEvent::TransactionCancelled { transaction_id, .. }
            | TransactionEvent::TransactionCompleted { transaction_id, .. }
            | TransactionEvent::TransactionDeleted { transaction_id, .. } => *transaction_id,
        }
    }
}

/// Any event the core can publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "aggregate", content = "event")]
pub enum DomainEvent {
    Account(AccountEvent),
    Envelope(EnvelopeEvent),
    Goal(GoalEvent),
    CreditCardBill(CreditCardBillEvent),
    Transaction(TransactionEvent),
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::Account(e) => e.event_type(),
            DomainEvent::Envelope(e) => e.event_type(),
            DomainEvent::Goal(e) => e.event_type(),
            DomainEvent::CreditCardBill(e) => e.event_type(),
            DomainEvent::Transaction(e) => e.event_type(),
        }
    }

    pub fn aggregate_type(&self) -> &'static str {
        match self {
            DomainEvent::Account(_) => "Account",
            DomainEvent::Envelope(_) => "Envelope",
            DomainEvent::Goal(_) => "Goal",
            DomainEvent::CreditCardBill(_) => "CreditCardBill",
            DomainEvent::Transaction(_) => "Transaction",
        }
    }

    pub fn aggregate_id(&self) -> Uuid {
        match self {
            DomainEvent::Account(e) => e.account_id(),
            DomainEvent::Envelope(e) => e.envelope_id(),
            DomainEvent::Goal(e) => e.goal_id(),
            DomainEvent::CreditCardBill(e) => e.bill_id(),
            DomainEvent::Transaction(e) => e.transaction_id(),
        }
    }
}

impl From<AccountEvent> for DomainEvent {
    fn from(event: AccountEvent) -> Self {
        DomainEvent::Account(event)
    }
}

impl From<EnvelopeEvent> for DomainEvent {
    fn from(event: EnvelopeEvent) -> Self {
        DomainEvent::Envelope(event)
    }
}

impl From<GoalEvent> for DomainEvent {
    fn from(event: GoalEvent) -> Self {
        DomainEvent::Goal(event)
    }
}

impl From<CreditCardBillEvent> for DomainEvent {
    fn from(event: CreditCardBillEvent) -> Self {
        DomainEvent::CreditCardBill(event)
    }
}

impl From<TransactionEvent> for DomainEvent {
    fn from(event: TransactionEvent) -> Self {
        DomainEvent::Transaction(event)
    }
}
