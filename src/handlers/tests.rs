//! Use case tests
//!
//! Handlers run against the in-memory adapters, so these need no database.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Datelike, Duration, NaiveDate, Utc};
    use uuid::Uuid;

    use crate::aggregate::{Account, Aggregate, CreditCardBill, Envelope, Transaction};
    use crate::domain::{
        AccountType, Amount, BillStatus, ContributionFrequency, DomainError, Money,
        OperationContext, TransactionDetails, TransactionStatus, TransactionType,
    };
    use crate::error::{AppError, ErrorKind};
    use crate::handlers::*;
    use crate::persistence::{InMemoryStore, PendingWrite, StaticBudgetAuthorization};
    use crate::publisher::InMemoryEventBus;

    struct Fixture {
        store: Arc<InMemoryStore>,
        auth: Arc<StaticBudgetAuthorization>,
        bus: Arc<InMemoryEventBus>,
        ports: BudgetPorts,
        context: OperationContext,
        budget_id: Uuid,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let auth = Arc::new(StaticBudgetAuthorization::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let ports = BudgetPorts::in_memory(store.clone(), auth.clone(), bus.clone());

        let user_id = Uuid::new_v4();
        let budget_id = Uuid::new_v4();
        auth.grant(user_id, budget_id);

        Fixture {
            store,
            auth,
            bus,
            ports,
            context: OperationContext::new(user_id),
            budget_id,
        }
    }

    impl Fixture {
        fn account(&self, budget_id: Uuid, account_type: AccountType, balance: i64) -> Account {
            let (account, _) = Account::create(
                budget_id,
                "Main",
                account_type,
                Money::from_cents(balance).unwrap(),
                Utc::now(),
            )
            .unwrap();
            self.store.seed(PendingWrite::Account(&account));
            account
        }

        fn envelope(&self, limit: i64, balance: i64) -> Envelope {
            let now = Utc::now();
            let (mut envelope, _) = Envelope::create(
                self.budget_id,
                Uuid::new_v4(),
                "Groceries",
                Amount::new(limit).unwrap(),
                now,
            )
            .unwrap();
            if balance > 0 {
                envelope = envelope
                    .add_amount(&Amount::new(balance).unwrap(), now)
                    .unwrap()
                    .0;
            }
            self.store.seed(PendingWrite::Envelope(&envelope));
            envelope
        }

        fn bill(&self, amount: i64) -> CreditCardBill {
            let (bill, _) = CreditCardBill::create(
                Uuid::new_v4(),
                self.budget_id,
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
                Money::from_cents(amount).unwrap(),
                Utc::now(),
            )
            .unwrap();
            self.store.seed(PendingWrite::CreditCardBill(&bill));
            bill
        }

        fn scheduled_transaction(&self, account_id: Uuid, amount: i64) -> Transaction {
            let now = Utc::now();
            let (transaction, _) = Transaction::create(
                self.budget_id,
                TransactionDetails {
                    account_id,
                    category_id: Uuid::new_v4(),
                    description: "Rent".to_string(),
                    amount: Amount::new(amount).unwrap(),
                    transaction_type: TransactionType::Expense,
                    transaction_date: now + Duration::days(3),
                },
                now,
            )
            .unwrap();
            self.store.seed(PendingWrite::Transaction(&transaction));
            transaction
        }

        fn balance_of(&self, account_id: Uuid) -> i64 {
            self.store.account(account_id).unwrap().balance().cents()
        }
    }

    fn domain_error(err: &AppError) -> &DomainError {
        err.as_domain()
            .unwrap_or_else(|| panic!("Expected a domain error, got: {:?}", err))
    }

    fn failed_step(err: &AppError) -> Option<&'static str> {
        match err {
            AppError::Execution(e) => e.step(),
            other => panic!("Expected an execution error, got: {:?}", other),
        }
    }

    // =========================================================================
    // Authorization and publication
    // =========================================================================

    #[tokio::test]
    async fn test_denied_user_changes_nothing() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 10_000);
        let stranger = OperationContext::new(Uuid::new_v4());

        let result = UpdateAccountHandler::new(f.ports.clone())
            .execute(
                UpdateAccountCommand {
                    budget_id: f.budget_id,
                    account_id: account.id(),
                    name: "Renamed".to_string(),
                    account_type: AccountType::Savings,
                },
                &stranger,
            )
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(f.store.account(account.id()).unwrap().name(), "Main");
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn test_revoked_access_is_denied() {
        let f = fixture();
        f.auth.revoke(f.context.user_id, f.budget_id);

        let result = CreateEnvelopeHandler::new(f.ports.clone())
            .execute(
                CreateEnvelopeCommand {
                    budget_id: f.budget_id,
                    category_id: Uuid::new_v4(),
                    name: "Fun".to_string(),
                    monthly_limit_cents: 1_000,
                },
                &f.context,
            )
            .await;

        assert!(matches!(result, Err(AppError::InsufficientPermissions { .. })));
    }

    #[tokio::test]
    async fn test_authorization_lookup_failure_is_not_a_denial() {
        let f = fixture();
        f.auth.set_failing(true);

        let result = CreateAccountHandler::new(f.ports.clone())
            .execute(
                CreateAccountCommand {
                    budget_id: f.budget_id,
                    name: "Wallet".to_string(),
                    account_type: AccountType::Cash,
                    initial_balance_cents: 0,
                },
                &f.context,
            )
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, AppError::AuthorizationFailed { .. }));
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_committed_change() {
        let f = fixture();
        f.bus.set_failing(true);

        let account = CreateAccountHandler::new(f.ports.clone())
            .execute(
                CreateAccountCommand {
                    budget_id: f.budget_id,
                    name: "Wallet".to_string(),
                    account_type: AccountType::Cash,
                    initial_balance_cents: 2_500,
                },
                &f.context,
            )
            .await
            .unwrap();

        assert_eq!(f.balance_of(account.id()), 2_500);
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn test_account_of_other_budget_is_not_found() {
        let f = fixture();
        let foreign = f.account(Uuid::new_v4(), AccountType::Checking, 0);

        let err = DeleteAccountHandler::new(f.ports.clone())
            .execute(
                DeleteAccountCommand {
                    budget_id: f.budget_id,
                    account_id: foreign.id(),
                },
                &f.context,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { entity: "Account", .. }));
        assert!(!f.store.account(foreign.id()).unwrap().is_deleted());
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    #[tokio::test]
    async fn test_transfer_between_accounts() {
        let f = fixture();
        let a = f.account(f.budget_id, AccountType::Checking, 100_000);
        let b = f.account(f.budget_id, AccountType::Savings, 50_000);

        let result = TransferBetweenAccountsHandler::new(f.ports.clone())
            .execute(
                TransferBetweenAccountsCommand {
                    budget_id: f.budget_id,
                    source_account_id: a.id(),
                    destination_account_id: b.id(),
                    amount_cents: 20_000,
                    category_id: Uuid::new_v4(),
                },
                &f.context,
            )
            .await
            .unwrap();

        assert_eq!(result.amount_cents, 20_000);
        assert_eq!(f.balance_of(a.id()), 80_000);
        assert_eq!(f.balance_of(b.id()), 70_000);

        let debit = f.store.transaction(result.debit_transaction_id).unwrap();
        let credit = f.store.transaction(result.credit_transaction_id).unwrap();
        assert_eq!(debit.transaction_type(), TransactionType::Expense);
        assert_eq!(credit.transaction_type(), TransactionType::Income);
        assert_eq!(debit.account_id(), a.id());
        assert_eq!(credit.account_id(), b.id());

        let balance_events = f
            .bus
            .event_types()
            .into_iter()
            .filter(|t| *t == "AccountBalanceChanged")
            .count();
        assert_eq!(balance_events, 2);
    }

    #[tokio::test]
    async fn test_transfer_to_account_of_other_budget() {
        let f = fixture();
        let a = f.account(f.budget_id, AccountType::Checking, 100_000);
        let foreign = f.account(Uuid::new_v4(), AccountType::Checking, 0);

        let err = TransferBetweenAccountsHandler::new(f.ports.clone())
            .execute(
                TransferBetweenAccountsCommand {
                    budget_id: f.budget_id,
                    source_account_id: a.id(),
                    destination_account_id: foreign.id(),
                    amount_cents: 100,
                    category_id: Uuid::new_v4(),
                },
                &f.context,
            )
            .await
            .unwrap_err();

        assert_eq!(domain_error(&err), &DomainError::AccountsFromDifferentBudgets);
        assert_eq!(f.balance_of(a.id()), 100_000);
    }

    #[tokio::test]
    async fn test_transfer_rolls_back_when_destination_save_fails() {
        let f = fixture();
        let a = f.account(f.budget_id, AccountType::Checking, 100_000);
        let b = f.account(f.budget_id, AccountType::Checking, 0);
        f.store.fail_saves_of("Account", b.id());

        let err = TransferBetweenAccountsHandler::new(f.ports.clone())
            .execute(
                TransferBetweenAccountsCommand {
                    budget_id: f.budget_id,
                    source_account_id: a.id(),
                    destination_account_id: b.id(),
                    amount_cents: 5_000,
                    category_id: Uuid::new_v4(),
                },
                &f.context,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Execution(_)));
        assert_eq!(f.balance_of(a.id()), 100_000);
        assert!(f.store.transactions_of(a.id()).is_empty());
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_account_with_transactions_is_refused() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 0);
        f.scheduled_transaction(account.id(), 1_000);

        let err = DeleteAccountHandler::new(f.ports.clone())
            .execute(
                DeleteAccountCommand {
                    budget_id: f.budget_id,
                    account_id: account.id(),
                },
                &f.context,
            )
            .await
            .unwrap_err();

        assert_eq!(domain_error(&err), &DomainError::AccountHasTransactions);
    }

    #[tokio::test]
    async fn test_direct_reconciliation() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 10_000);
        let handler = ReconcileAccountHandler::new(f.ports.clone());

        let err = handler
            .execute(
                ReconcileAccountCommand {
                    budget_id: f.budget_id,
                    account_id: account.id(),
                    new_balance_cents: 9_000,
                    justification: "fees".to_string(),
                },
                &f.context,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            domain_error(&err),
            DomainError::ReconciliationJustificationTooShort { .. }
        ));

        let result = handler
            .execute(
                ReconcileAccountCommand {
                    budget_id: f.budget_id,
                    account_id: account.id(),
                    new_balance_cents: 9_000,
                    justification: "Bank statement of March".to_string(),
                },
                &f.context,
            )
            .await
            .unwrap();

        assert_eq!(result.difference_cents, -1_000);
        assert!(result.adjustment.is_none());
        assert_eq!(f.balance_of(account.id()), 9_000);
        assert!(f.store.transactions_of(account.id()).is_empty());
    }

    #[tokio::test]
    async fn test_reconciliation_with_adjustment_records_expense() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 10_000);

        let result = ReconcileAccountWithAdjustmentHandler::new(f.ports.clone())
            .execute(
                ReconcileAccountWithAdjustmentCommand {
                    budget_id: f.budget_id,
                    account_id: account.id(),
                    real_balance_cents: 7_500,
                    category_id: Uuid::new_v4(),
                },
                &f.context,
            )
            .await
            .unwrap();

        assert_eq!(result.difference_cents, -2_500);
        let adjustment = result.adjustment.unwrap();
        assert_eq!(adjustment.transaction_type(), TransactionType::Expense);
        assert_eq!(adjustment.amount().cents(), 2_500);
        assert_eq!(adjustment.status(), TransactionStatus::Completed);

        assert_eq!(f.balance_of(account.id()), 7_500);
        assert!(f.store.transaction(adjustment.id()).is_some());
    }

    #[tokio::test]
    async fn test_reconciliation_without_difference_adds_no_transaction() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 10_000);

        let result = ReconcileAccountWithAdjustmentHandler::new(f.ports.clone())
            .execute(
                ReconcileAccountWithAdjustmentCommand {
                    budget_id: f.budget_id,
                    account_id: account.id(),
                    real_balance_cents: 10_000,
                    category_id: Uuid::new_v4(),
                },
                &f.context,
            )
            .await
            .unwrap();

        assert_eq!(result.difference_cents, 0);
        assert!(result.adjustment.is_none());
        assert!(f.store.transactions_of(account.id()).is_empty());
    }

    #[tokio::test]
    async fn test_reconciliation_adjustment_rolls_back_when_account_save_fails() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 10_000);
        f.store.fail_saves_of("Account", account.id());

        let err = ReconcileAccountWithAdjustmentHandler::new(f.ports.clone())
            .execute(
                ReconcileAccountWithAdjustmentCommand {
                    budget_id: f.budget_id,
                    account_id: account.id(),
                    real_balance_cents: 12_000,
                    category_id: Uuid::new_v4(),
                },
                &f.context,
            )
            .await
            .unwrap_err();

        assert_eq!(failed_step(&err), Some("account"));
        assert_eq!(f.balance_of(account.id()), 10_000);
        assert!(f.store.transactions_of(account.id()).is_empty());
        assert_eq!(f.bus.event_count(), 0);
    }

    // =========================================================================
    // Envelopes
    // =========================================================================

    #[tokio::test]
    async fn test_envelope_limit_is_enforced() {
        let f = fixture();
        let envelope = f.envelope(5_000, 0);

        let err = AddAmountToEnvelopeHandler::new(f.ports.clone())
            .execute(
                EnvelopeAmountCommand {
                    budget_id: f.budget_id,
                    envelope_id: envelope.id(),
                    amount_cents: 10_000,
                },
                &f.context,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            domain_error(&err),
            DomainError::EnvelopeLimitExceeded { limit: 5_000, .. }
        ));
        let stored = f.store.envelope(envelope.id()).unwrap();
        assert_eq!(stored.current_balance().cents(), 0);
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn test_envelope_transfer_rolls_back_when_target_save_fails() {
        let f = fixture();
        let source = f.envelope(10_000, 6_000);
        let target = f.envelope(10_000, 1_000);
        f.store.fail_saves_of("Envelope", target.id());

        let err = TransferBetweenEnvelopesHandler::new(f.ports.clone())
            .execute(
                TransferBetweenEnvelopesCommand {
                    budget_id: f.budget_id,
                    source_envelope_id: source.id(),
                    target_envelope_id: target.id(),
                    amount_cents: 2_000,
                },
                &f.context,
            )
            .await
            .unwrap_err();

        match &err {
            AppError::Execution(e) => assert_eq!(e.step(), Some("target envelope")),
            other => panic!("Expected execution error, got: {:?}", other),
        }
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert_eq!(
            f.store.envelope(source.id()).unwrap().current_balance().cents(),
            6_000
        );
        assert_eq!(
            f.store.envelope(target.id()).unwrap().current_balance().cents(),
            1_000
        );
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn test_envelope_transfer() {
        let f = fixture();
        let source = f.envelope(10_000, 6_000);
        let target = f.envelope(10_000, 1_000);

        let result = TransferBetweenEnvelopesHandler::new(f.ports.clone())
            .execute(
                TransferBetweenEnvelopesCommand {
                    budget_id: f.budget_id,
                    source_envelope_id: source.id(),
                    target_envelope_id: target.id(),
                    amount_cents: 2_000,
                },
                &f.context,
            )
            .await
            .unwrap();

        assert_eq!(result.source.current_balance().cents(), 4_000);
        assert_eq!(result.target.current_balance().cents(), 3_000);
        assert!(f.bus.has_event("EnvelopeTransferredOut"));
        assert!(f.bus.has_event("EnvelopeTransferredIn"));
    }

    #[tokio::test]
    async fn test_delete_empty_envelope_removes_it() {
        let f = fixture();
        let envelope = f.envelope(5_000, 0);

        let result = DeleteEnvelopeHandler::new(f.ports.clone())
            .execute(
                DeleteEnvelopeCommand {
                    budget_id: f.budget_id,
                    envelope_id: envelope.id(),
                },
                &f.context,
            )
            .await
            .unwrap();

        assert!(matches!(result, DeleteEnvelopeResult::Deleted { .. }));
        assert!(f.store.envelope(envelope.id()).is_none());
    }

    #[tokio::test]
    async fn test_delete_funded_envelope_deactivates_it() {
        let f = fixture();
        let envelope = f.envelope(5_000, 1_200);

        let result = DeleteEnvelopeHandler::new(f.ports.clone())
            .execute(
                DeleteEnvelopeCommand {
                    budget_id: f.budget_id,
                    envelope_id: envelope.id(),
                },
                &f.context,
            )
            .await
            .unwrap();

        assert!(matches!(result, DeleteEnvelopeResult::Deactivated { .. }));
        let stored = f.store.envelope(envelope.id()).unwrap();
        assert!(!stored.is_active());
        assert_eq!(stored.current_balance().cents(), 1_200);
    }

    // =========================================================================
    // Goals
    // =========================================================================

    #[tokio::test]
    async fn test_goal_contributions() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Savings, 0);

        let goal = CreateGoalHandler::new(f.ports.clone())
            .execute(
                CreateGoalCommand {
                    budget_id: f.budget_id,
                    name: "Vacation".to_string(),
                    total_amount_cents: 50_000,
                    source_account_id: account.id(),
                    deadline: None,
                },
                &f.context,
            )
            .await
            .unwrap();

        let add = AddAmountToGoalHandler::new(f.ports.clone());
        let command = |amount_cents| GoalAmountCommand {
            budget_id: f.budget_id,
            goal_id: goal.id(),
            amount_cents,
        };

        let err = add.execute(command(0), &f.context).await.unwrap_err();
        assert!(matches!(
            domain_error(&err),
            DomainError::InvalidContributionAmount(_)
        ));

        let goal = add.execute(command(50_000), &f.context).await.unwrap();
        assert!(goal.is_achieved());

        let err = add.execute(command(100), &f.context).await.unwrap_err();
        assert_eq!(domain_error(&err), &DomainError::GoalNotActive);

        let err = RemoveAmountFromGoalHandler::new(f.ports.clone())
            .execute(command(60_000), &f.context)
            .await
            .unwrap_err();
        assert!(matches!(
            domain_error(&err),
            DomainError::InsufficientGoalAmount { .. }
        ));
    }

    #[tokio::test]
    async fn test_automatic_contribution_configured_once() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Savings, 0);
        let goal = CreateGoalHandler::new(f.ports.clone())
            .execute(
                CreateGoalCommand {
                    budget_id: f.budget_id,
                    name: "Car".to_string(),
                    total_amount_cents: 1_000_000,
                    source_account_id: account.id(),
                    deadline: None,
                },
                &f.context,
            )
            .await
            .unwrap();

        let handler = ConfigureAutomaticContributionHandler::new(f.ports.clone());
        let command = ConfigureAutomaticContributionCommand {
            budget_id: f.budget_id,
            goal_id: goal.id(),
            amount_cents: 10_000,
            frequency: ContributionFrequency::Monthly,
            execution_day: 5,
            start_date: Utc::now().date_naive() + Duration::days(1),
            end_date: None,
        };

        let start_date = command.start_date;
        let configured = handler.execute(command.clone(), &f.context).await.unwrap();
        assert!(configured.goal.has_active_automatic_contribution());

        let next = configured.next_execution_date.unwrap();
        assert!(next >= start_date);
        assert_eq!(next.day(), 5);
        assert!(next < start_date + Duration::days(32));

        let err = handler.execute(command, &f.context).await.unwrap_err();
        assert_eq!(
            domain_error(&err),
            &DomainError::AutomaticContributionAlreadyConfigured
        );
    }

    // =========================================================================
    // Credit card bills
    // =========================================================================

    #[tokio::test]
    async fn test_pay_open_bill() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 100_000);
        let bill = f.bill(30_000);

        let result = PayCreditCardBillHandler::new(f.ports.clone())
            .execute(
                PayCreditCardBillCommand {
                    budget_id: f.budget_id,
                    bill_id: bill.id(),
                    account_id: account.id(),
                    amount_cents: 30_000,
                    category_id: Uuid::new_v4(),
                    payment_date: None,
                },
                &f.context,
            )
            .await
            .unwrap();

        let transaction = match result {
            PayCreditCardBillResult::Paid { transaction, .. } => transaction,
            other => panic!("Expected payment, got: {:?}", other),
        };
        assert_eq!(f.balance_of(account.id()), 70_000);
        assert_eq!(f.store.bill(bill.id()).unwrap().status(), BillStatus::Paid);
        assert!(f.store.transaction(transaction.id()).is_some());
        assert!(f.bus.has_event("BillPaid"));
    }

    #[tokio::test]
    async fn test_paying_a_paid_bill_changes_nothing() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 100_000);
        let bill = f.bill(30_000);
        let (paid, _) = bill
            .mark_as_paid(
                account.id(),
                Uuid::new_v4(),
                &Amount::new(30_000).unwrap(),
                f.context.user_id,
                Utc::now(),
            )
            .unwrap();
        f.store.seed(PendingWrite::CreditCardBill(&paid));

        let result = PayCreditCardBillHandler::new(f.ports.clone())
            .execute(
                PayCreditCardBillCommand {
                    budget_id: f.budget_id,
                    bill_id: bill.id(),
                    account_id: account.id(),
                    amount_cents: 30_000,
                    category_id: Uuid::new_v4(),
                    payment_date: None,
                },
                &f.context,
            )
            .await
            .unwrap();

        assert!(matches!(result, PayCreditCardBillResult::AlreadyPaid { .. }));
        assert_eq!(f.balance_of(account.id()), 100_000);
        assert!(f.store.transactions_of(account.id()).is_empty());
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn test_bill_cannot_be_paid_from_credit_line() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::CreditLine, 100_000);
        let bill = f.bill(30_000);

        let err = PayCreditCardBillHandler::new(f.ports.clone())
            .execute(
                PayCreditCardBillCommand {
                    budget_id: f.budget_id,
                    bill_id: bill.id(),
                    account_id: account.id(),
                    amount_cents: 30_000,
                    category_id: Uuid::new_v4(),
                    payment_date: None,
                },
                &f.context,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            domain_error(&err),
            DomainError::AccountNotDebitCapable { .. }
        ));
        assert_eq!(f.store.bill(bill.id()).unwrap().status(), BillStatus::Open);
    }

    #[tokio::test]
    async fn test_bill_payment_rolls_back_when_bill_save_fails() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 100_000);
        let bill = f.bill(30_000);
        f.store.fail_saves_of("CreditCardBill", bill.id());

        let err = PayCreditCardBillHandler::new(f.ports.clone())
            .execute(
                PayCreditCardBillCommand {
                    budget_id: f.budget_id,
                    bill_id: bill.id(),
                    account_id: account.id(),
                    amount_cents: 30_000,
                    category_id: Uuid::new_v4(),
                    payment_date: None,
                },
                &f.context,
            )
            .await
            .unwrap_err();

        assert_eq!(failed_step(&err), Some("credit card bill"));
        assert_eq!(f.balance_of(account.id()), 100_000);
        assert!(f.store.transactions_of(account.id()).is_empty());
        assert_eq!(f.store.bill(bill.id()).unwrap().status(), BillStatus::Open);
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn test_bill_payment_reports_late_payment() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 100_000);
        let handler = PayCreditCardBillHandler::new(f.ports.clone());

        // the fixture bill is due on 2026-03-10
        let mut paid_late = Vec::new();
        for day in [5, 15] {
            let bill = f.bill(1_000);
            let payment_date = NaiveDate::from_ymd_opt(2026, 3, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
                .and_utc();
            let result = handler
                .execute(
                    PayCreditCardBillCommand {
                        budget_id: f.budget_id,
                        bill_id: bill.id(),
                        account_id: account.id(),
                        amount_cents: 1_000,
                        category_id: Uuid::new_v4(),
                        payment_date: Some(payment_date),
                    },
                    &f.context,
                )
                .await
                .unwrap();
            match result {
                PayCreditCardBillResult::Paid {
                    paid_late: late,
                    transaction,
                    ..
                } => {
                    assert_eq!(transaction.transaction_date(), payment_date);
                    paid_late.push(late);
                }
                other => panic!("Expected payment, got: {:?}", other),
            }
        }

        assert_eq!(paid_late, vec![false, true]);
        assert_eq!(f.balance_of(account.id()), 98_000);
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    #[tokio::test]
    async fn test_past_transaction_updates_balance() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 10_000);

        let transaction = CreateTransactionHandler::new(f.ports.clone())
            .execute(
                CreateTransactionCommand {
                    budget_id: f.budget_id,
                    account_id: account.id(),
                    category_id: Uuid::new_v4(),
                    description: "Groceries".to_string(),
                    amount_cents: 3_000,
                    transaction_type: TransactionType::Expense,
                    transaction_date: Utc::now() - Duration::days(2),
                },
                &f.context,
            )
            .await
            .unwrap();

        assert_eq!(transaction.status(), TransactionStatus::Completed);
        assert_eq!(f.balance_of(account.id()), 7_000);
        assert!(f.bus.has_event("TransactionCreated"));
        assert!(f.bus.has_event("AccountBalanceChanged"));
    }

    #[tokio::test]
    async fn test_past_transaction_rolls_back_when_account_save_fails() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 10_000);
        f.store.fail_saves_of("Account", account.id());

        let err = CreateTransactionHandler::new(f.ports.clone())
            .execute(
                CreateTransactionCommand {
                    budget_id: f.budget_id,
                    account_id: account.id(),
                    category_id: Uuid::new_v4(),
                    description: "Groceries".to_string(),
                    amount_cents: 3_000,
                    transaction_type: TransactionType::Expense,
                    transaction_date: Utc::now() - Duration::days(2),
                },
                &f.context,
            )
            .await
            .unwrap_err();

        assert_eq!(failed_step(&err), Some("account"));
        assert_eq!(f.balance_of(account.id()), 10_000);
        assert!(f.store.transactions_of(account.id()).is_empty());
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn test_future_transaction_is_scheduled() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 10_000);

        let transaction = CreateTransactionHandler::new(f.ports.clone())
            .execute(
                CreateTransactionCommand {
                    budget_id: f.budget_id,
                    account_id: account.id(),
                    category_id: Uuid::new_v4(),
                    description: "Salary".to_string(),
                    amount_cents: 500_000,
                    transaction_type: TransactionType::Income,
                    transaction_date: Utc::now() + Duration::days(5),
                },
                &f.context,
            )
            .await
            .unwrap();

        assert_eq!(transaction.status(), TransactionStatus::Scheduled);
        assert_eq!(f.balance_of(account.id()), 10_000);
    }

    #[tokio::test]
    async fn test_transfer_type_is_rejected_for_plain_transactions() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 10_000);

        let err = CreateTransactionHandler::new(f.ports.clone())
            .execute(
                CreateTransactionCommand {
                    budget_id: f.budget_id,
                    account_id: account.id(),
                    category_id: Uuid::new_v4(),
                    description: "Move".to_string(),
                    amount_cents: 500,
                    transaction_type: TransactionType::Transfer,
                    transaction_date: Utc::now(),
                },
                &f.context,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            domain_error(&err),
            DomainError::InvalidField { field: "transaction_type", .. }
        ));
    }

    #[tokio::test]
    async fn test_cancel_scheduled_transaction_dated_yesterday() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 0);
        let mut transaction = f.scheduled_transaction(account.id(), 1_000);
        transaction.transaction_date = Utc::now() - Duration::days(1);
        f.store.seed(PendingWrite::Transaction(&transaction));

        let err = CancelScheduledTransactionHandler::new(f.ports.clone())
            .execute(
                CancelScheduledTransactionCommand {
                    budget_id: f.budget_id,
                    transaction_id: transaction.id(),
                    reason: "No longer needed".to_string(),
                },
                &f.context,
            )
            .await
            .unwrap_err();

        assert_eq!(domain_error(&err), &DomainError::TransactionCannotBeCancelled);
        assert_eq!(
            f.store.transaction(transaction.id()).unwrap().status(),
            TransactionStatus::Scheduled
        );
    }

    #[tokio::test]
    async fn test_cancel_future_scheduled_transaction() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 0);
        let transaction = f.scheduled_transaction(account.id(), 1_000);

        let cancelled = CancelScheduledTransactionHandler::new(f.ports.clone())
            .execute(
                CancelScheduledTransactionCommand {
                    budget_id: f.budget_id,
                    transaction_id: transaction.id(),
                    reason: "Plan changed".to_string(),
                },
                &f.context,
            )
            .await
            .unwrap();

        assert_eq!(cancelled.status(), TransactionStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason(), Some("Plan changed"));
    }

    #[tokio::test]
    async fn test_late_transaction_completes_against_account() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 10_000);
        let mut transaction = f.scheduled_transaction(account.id(), 4_000);
        transaction.transaction_date = Utc::now() - Duration::hours(1);
        f.store.seed(PendingWrite::Transaction(&transaction));

        let command = TransactionCommand {
            budget_id: f.budget_id,
            transaction_id: transaction.id(),
        };
        let late = MarkTransactionLateHandler::new(f.ports.clone())
            .execute(command.clone(), &f.context)
            .await
            .unwrap();
        assert_eq!(late.status(), TransactionStatus::Late);

        let result = CompleteScheduledTransactionHandler::new(f.ports.clone())
            .execute(command.clone(), &f.context)
            .await
            .unwrap();
        assert_eq!(result.transaction.status(), TransactionStatus::Completed);
        assert_eq!(result.account.balance().cents(), 6_000);
        assert_eq!(f.balance_of(account.id()), 6_000);

        let err = DeleteTransactionHandler::new(f.ports.clone())
            .execute(command, &f.context)
            .await
            .unwrap_err();
        assert!(matches!(
            domain_error(&err),
            DomainError::TransactionFinalized { .. }
        ));
    }

    #[tokio::test]
    async fn test_update_scheduled_transaction() {
        let f = fixture();
        let account = f.account(f.budget_id, AccountType::Checking, 0);
        let transaction = f.scheduled_transaction(account.id(), 1_000);

        let updated = UpdateTransactionHandler::new(f.ports.clone())
            .execute(
                UpdateTransactionCommand {
                    budget_id: f.budget_id,
                    transaction_id: transaction.id(),
                    account_id: account.id(),
                    category_id: transaction.category_id(),
                    description: "  Rent (new lease) ".to_string(),
                    amount_cents: 1_250,
                    transaction_type: TransactionType::Expense,
                    transaction_date: transaction.transaction_date(),
                },
                &f.context,
            )
            .await
            .unwrap();

        assert_eq!(updated.description(), "Rent (new lease)");
        assert_eq!(updated.amount().cents(), 1_250);
        assert_eq!(updated.status(), TransactionStatus::Scheduled);
    }
}
