//! Credit Card Bill Aggregate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Amount, BillStatus, CreditCardBillEvent, DomainError, Money};

use super::{Aggregate, Change};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCardBill {
    pub(crate) id: Uuid,
    pub(crate) credit_card_id: Uuid,
    pub(crate) budget_id: Uuid,
    pub(crate) closing_date: NaiveDate,
    pub(crate) due_date: NaiveDate,
    pub(crate) amount: Money,
    pub(crate) status: BillStatus,
    pub(crate) paid_at: Option<DateTime<Utc>>,
    pub(crate) is_deleted: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl CreditCardBill {
    pub fn create(
        credit_card_id: Uuid,
        budget_id: Uuid,
        closing_date: NaiveDate,
        due_date: NaiveDate,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        if due_date < closing_date {
            return Err(DomainError::invalid_field(
                "due_date",
                "must not be before the closing date",
            ));
        }
        if amount.is_negative() {
            return Err(DomainError::InvalidAmount(format!(
                "bill amount must not be negative (got {} cents)",
                amount.cents()
            )));
        }

        let bill = Self {
            id: Uuid::new_v4(),
            credit_card_id,
            budget_id,
            closing_date,
            due_date,
            amount,
            status: BillStatus::Open,
            paid_at: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let event = CreditCardBillEvent::BillCreated {
            bill_id: bill.id,
            credit_card_id,
            budget_id,
            closing_date,
            due_date,
            amount,
            created_at: now,
        };

        Ok((bill, event))
    }

    /// Transition OPEN → PAID.
    ///
    /// Callers check `is_paid` first; paying twice is handled as a no-op by the
    /// payment service, so reaching here with a paid bill is a state error.
    pub fn mark_as_paid(
        &self,
        account_id: Uuid,
        transaction_id: Uuid,
        amount: &Amount,
        paid_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Change<Self>, DomainError> {
        if self.is_deleted {
            return Err(DomainError::CreditCardBillNotFound(self.id));
        }
        if self.is_paid() {
            return Err(DomainError::invalid_field("status", "bill is already paid"));
        }

        Ok(self.emit(CreditCardBillEvent::BillPaid {
            bill_id: self.id,
            credit_card_id: self.credit_card_id,
            budget_id: self.budget_id,
            account_id,
            transaction_id,
            amount: *amount,
            paid_by,
            paid_at: now,
        }))
    }

    pub fn is_paid(&self) -> bool {
        self.status == BillStatus::Paid
    }

    /// Open and past its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_paid() && today > self.due_date
    }

    pub fn credit_card_id(&self) -> Uuid {
        self.credit_card_id
    }

    pub fn closing_date(&self) -> NaiveDate {
        self.closing_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> BillStatus {
        self.status
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }
}

impl Aggregate for CreditCardBill {
    type Event = CreditCardBillEvent;

    fn aggregate_type() -> &'static str {
        "CreditCardBill"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn budget_id(&self) -> Uuid {
        self.budget_id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn apply(mut self, event: &Self::Event) -> Self {
        match event {
            CreditCardBillEvent::BillCreated { .. } => {}
            CreditCardBillEvent::BillPaid { paid_at, .. } => {
                self.status = BillStatus::Paid;
                self.paid_at = Some(*paid_at);
                self.updated_at = *paid_at;
            }
        }
        self
    }
}
