//! Credit card bill payment

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregate::{Account, Aggregate, CreditCardBill, Transaction};
use crate::domain::{
    Amount, BalanceChangeReason, DomainError, DomainEvent, TransactionDetails, TransactionType,
};

/// Input of a payment
#[derive(Debug, Clone)]
pub struct BillPayment {
    pub budget_id: Uuid,
    pub amount_cents: i64,
    pub paid_by: Uuid,
    pub payment_date: DateTime<Utc>,
    pub category_id: Uuid,
}

/// Everything a successful payment changed
#[derive(Debug, Clone)]
pub struct PaidBill {
    pub bill: CreditCardBill,
    pub account: Account,
    /// EXPENSE on the paying account
    pub transaction: Transaction,
    pub events: Vec<DomainEvent>,
}

#[derive(Debug, Clone)]
pub enum BillPaymentOutcome {
    /// The bill was already PAID; nothing changed
    AlreadyPaid,
    Paid(PaidBill),
}

pub struct PayCreditCardBill;

impl PayCreditCardBill {
    /// `payment.payment_date` dates the EXPENSE; `now` stamps the records.
    /// A payment dated after `now` is rejected.
    pub fn execute(
        bill: &CreditCardBill,
        account: &Account,
        payment: &BillPayment,
        now: DateTime<Utc>,
    ) -> Result<BillPaymentOutcome, DomainError> {
        // retries of a settled bill succeed without touching anything
        if bill.is_paid() {
            return Ok(BillPaymentOutcome::AlreadyPaid);
        }

        if !account.is_visible_to(payment.budget_id) {
            return Err(DomainError::AccountNotFound(account.id()));
        }
        if !bill.is_visible_to(payment.budget_id) {
            return Err(DomainError::CreditCardBillNotFound(bill.id()));
        }

        let amount = Amount::new(payment.amount_cents)?;
        if payment.payment_date > now {
            return Err(DomainError::invalid_field(
                "payment_date",
                "a bill cannot be paid in the future",
            ));
        }
        if !account.is_debit_capable() {
            return Err(DomainError::AccountNotDebitCapable {
                account_type: account.account_type().to_string(),
            });
        }
        if !account.balance().is_sufficient_for(&amount) {
            return Err(DomainError::insufficient_balance(
                amount.cents(),
                account.balance().cents(),
            ));
        }

        let (transaction, created) = Transaction::create(
            payment.budget_id,
            TransactionDetails {
                account_id: account.id(),
                category_id: payment.category_id,
                description: format!("Credit card bill due {}", bill.due_date()),
                amount,
                transaction_type: TransactionType::Expense,
                transaction_date: payment.payment_date,
            },
            now,
        )?;

        let (account, debited) = account.subtract_amount(
            &amount,
            BalanceChangeReason::BillPayment,
            Some(transaction.id()),
            now,
        )?;
        let (bill, paid) = bill.mark_as_paid(
            account.id(),
            transaction.id(),
            &amount,
            payment.paid_by,
            now,
        )?;

        Ok(BillPaymentOutcome::Paid(PaidBill {
            bill,
            account,
            transaction,
            events: vec![debited.into(), created.into(), paid.into()],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountType, CreditCardBillEvent, Money, TransactionStatus};
    use chrono::{Duration, NaiveDate};

    fn account(budget_id: Uuid, account_type: AccountType, cents: i64) -> Account {
        Account::create(
            budget_id,
            "Main",
            account_type,
            Money::from_cents(cents).unwrap(),
            Utc::now(),
        )
        .unwrap()
        .0
    }

    fn bill(budget_id: Uuid, cents: i64) -> CreditCardBill {
        CreditCardBill::create(
            Uuid::new_v4(),
            budget_id,
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 5, 10).unwrap(),
            Money::from_cents(cents).unwrap(),
            Utc::now(),
        )
        .unwrap()
        .0
    }

    fn payment(budget_id: Uuid, cents: i64) -> BillPayment {
        BillPayment {
            budget_id,
            amount_cents: cents,
            paid_by: Uuid::new_v4(),
            payment_date: Utc::now() - Duration::minutes(1),
            category_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_pay_open_bill() {
        let budget_id = Uuid::new_v4();
        let account = account(budget_id, AccountType::Checking, 100_000);
        let bill = bill(budget_id, 30_000);

        let outcome = PayCreditCardBill::execute(&bill, &account, &payment(budget_id, 30_000), Utc::now()).unwrap();
        let paid = match outcome {
            BillPaymentOutcome::Paid(paid) => paid,
            BillPaymentOutcome::AlreadyPaid => panic!("expected a payment"),
        };

        assert!(paid.bill.is_paid());
        assert_eq!(paid.account.balance().cents(), 70_000);
        assert_eq!(paid.transaction.transaction_type(), TransactionType::Expense);
        assert_eq!(paid.transaction.status(), TransactionStatus::Completed);
        assert!(paid.events.iter().any(|e| matches!(
            e,
            DomainEvent::CreditCardBill(CreditCardBillEvent::BillPaid { .. })
        )));
    }

    #[test]
    fn test_pay_paid_bill_is_noop() {
        let budget_id = Uuid::new_v4();
        let account = account(budget_id, AccountType::Checking, 100_000);
        let open = bill(budget_id, 30_000);
        let paid_bill = match PayCreditCardBill::execute(&open, &account, &payment(budget_id, 30_000), Utc::now()) {
            Ok(BillPaymentOutcome::Paid(paid)) => paid.bill,
            other => panic!("unexpected outcome: {:?}", other),
        };

        // the payer retries with the original account state
        let first = PayCreditCardBill::execute(&paid_bill, &account, &payment(budget_id, 30_000), Utc::now());
        let second = PayCreditCardBill::execute(&paid_bill, &account, &payment(budget_id, 30_000), Utc::now());

        assert!(matches!(first, Ok(BillPaymentOutcome::AlreadyPaid)));
        assert!(matches!(second, Ok(BillPaymentOutcome::AlreadyPaid)));
        assert_eq!(account.balance().cents(), 100_000);
    }

    #[test]
    fn test_pay_with_credit_line_rejected() {
        let budget_id = Uuid::new_v4();
        let account = account(budget_id, AccountType::CreditLine, 100_000);
        let result = PayCreditCardBill::execute(&bill(budget_id, 1_000), &account, &payment(budget_id, 1_000), Utc::now());

        assert_eq!(
            result.unwrap_err(),
            DomainError::AccountNotDebitCapable {
                account_type: "CREDIT_LINE".to_string()
            }
        );
    }

    #[test]
    fn test_pay_with_insufficient_balance() {
        let budget_id = Uuid::new_v4();
        let account = account(budget_id, AccountType::Savings, 500);
        let result = PayCreditCardBill::execute(&bill(budget_id, 1_000), &account, &payment(budget_id, 1_000), Utc::now());

        assert_eq!(result.unwrap_err(), DomainError::insufficient_balance(1_000, 500));
    }

    #[test]
    fn test_pay_from_other_budget_is_not_found() {
        let budget_id = Uuid::new_v4();
        let foreign = account(Uuid::new_v4(), AccountType::Checking, 100_000);
        let bill = bill(budget_id, 1_000);

        let result = PayCreditCardBill::execute(&bill, &foreign, &payment(budget_id, 1_000), Utc::now());
        let err = result.unwrap_err();
        assert_eq!(err, DomainError::AccountNotFound(foreign.id()));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_pay_zero_amount_rejected() {
        let budget_id = Uuid::new_v4();
        let account = account(budget_id, AccountType::Cash, 100_000);
        let result = PayCreditCardBill::execute(&bill(budget_id, 0), &account, &payment(budget_id, 0), Utc::now());

        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
    }

    #[test]
    fn test_backdated_payment_keeps_wall_clock_timestamps() {
        let budget_id = Uuid::new_v4();
        let account = account(budget_id, AccountType::Checking, 100_000);
        let now = Utc::now();
        let mut backdated = payment(budget_id, 30_000);
        backdated.payment_date = now - Duration::days(5);

        let paid = match PayCreditCardBill::execute(&bill(budget_id, 30_000), &account, &backdated, now) {
            Ok(BillPaymentOutcome::Paid(paid)) => paid,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(paid.transaction.transaction_date(), backdated.payment_date);
        assert_eq!(paid.transaction.status(), TransactionStatus::Completed);
        assert_eq!(paid.transaction.created_at, now);
        assert_eq!(paid.account.updated_at(), now);
    }

    #[test]
    fn test_future_payment_date_rejected() {
        let budget_id = Uuid::new_v4();
        let account = account(budget_id, AccountType::Checking, 100_000);
        let bill = bill(budget_id, 30_000);
        let now = Utc::now();
        let mut future = payment(budget_id, 30_000);
        future.payment_date = now + Duration::days(2);

        let result = PayCreditCardBill::execute(&bill, &account, &future, now);

        assert!(matches!(
            result,
            Err(DomainError::InvalidField { field: "payment_date", .. })
        ));
        assert!(!bill.is_paid());
        assert_eq!(account.balance().cents(), 100_000);
    }
}
