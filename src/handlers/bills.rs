//! Credit Card Bill Handler

use chrono::Utc;

use crate::aggregate::{Account, Aggregate};
use crate::domain::OperationContext;
use crate::error::AppError;
use crate::services::{BillPayment, BillPaymentOutcome, PayCreditCardBill};

use super::support::BudgetPorts;
use super::{PayCreditCardBillCommand, PayCreditCardBillResult};

/// Pays a bill from a debit-capable account.
///
/// Paying a bill that is already PAID succeeds with `AlreadyPaid` and writes nothing.
pub struct PayCreditCardBillHandler {
    ports: BudgetPorts,
}

impl PayCreditCardBillHandler {
    pub fn new(ports: BudgetPorts) -> Self {
        Self { ports }
    }

    pub async fn execute(
        &self,
        command: PayCreditCardBillCommand,
        context: &OperationContext,
    ) -> Result<PayCreditCardBillResult, AppError> {
        self.ports.authorize(context, command.budget_id).await?;

        let bill = self.ports.load_bill(command.bill_id, command.budget_id).await?;

        // budget membership of the account is checked by the payment service
        let account = self
            .ports
            .accounts
            .find_by_id(command.account_id)
            .await
            .map_err(AppError::repository(Account::aggregate_type()))?
            .ok_or_else(|| AppError::not_found(Account::aggregate_type(), command.account_id))?;

        let now = Utc::now();
        let payment = BillPayment {
            budget_id: command.budget_id,
            amount_cents: command.amount_cents,
            paid_by: context.user_id,
            payment_date: command.payment_date.unwrap_or(now),
            category_id: command.category_id,
        };

        let paid = match PayCreditCardBill::execute(&bill, &account, &payment, now)? {
            BillPaymentOutcome::AlreadyPaid => {
                tracing::info!(bill_id = %bill.id(), "Bill already paid, nothing to do");
                return Ok(PayCreditCardBillResult::AlreadyPaid { bill_id: bill.id() });
            }
            BillPaymentOutcome::Paid(paid) => paid,
        };

        self.ports
            .pay_credit_card_bill
            .pay_credit_card_bill(&paid)
            .await?;

        let paid_late = bill.is_overdue(payment.payment_date.date_naive());
        if paid_late {
            tracing::warn!(
                bill_id = %bill.id(),
                due_date = %bill.due_date(),
                "Credit card bill paid after its due date"
            );
        }
        tracing::info!(
            bill_id = %bill.id(),
            account_id = %account.id(),
            transaction_id = %paid.transaction.id(),
            amount_cents = command.amount_cents,
            "Credit card bill paid"
        );

        let result = PayCreditCardBillResult::Paid {
            bill: paid.bill.clone(),
            account: paid.account.clone(),
            transaction: paid.transaction.clone(),
            paid_late,
        };
        self.ports.publish(paid.events).await;
        Ok(result)
    }
}
