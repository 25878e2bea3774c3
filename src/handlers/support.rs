//! Shared handler plumbing
//!
//! The port bundle every handler is built from, plus the authorize, load and
//! publish steps common to all use cases.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::aggregate::{Account, Aggregate, CreditCardBill, Envelope, Goal, Transaction};
use crate::domain::{Amount, DomainError, DomainEvent, OperationContext};
use crate::error::AppError;
use crate::persistence::{InMemoryRepositories, InMemoryStore, InMemoryUnitOfWork, PgRepositories, PgUnitOfWork};
use crate::ports::{
    AccountRepository, BudgetAuthorizationService, CreditCardBillRepository, EnvelopeRepository,
    EventPublisher, GoalRepository, PayCreditCardBillUnitOfWork, ReconcileAccountUnitOfWork,
    RegisterPastTransactionUnitOfWork, TransactionRepository, TransferBetweenAccountsUnitOfWork,
    TransferBetweenEnvelopesUnitOfWork,
};

/// Every port a use case may need
#[derive(Clone)]
pub struct BudgetPorts {
    pub accounts: Arc<dyn AccountRepository>,
    pub envelopes: Arc<dyn EnvelopeRepository>,
    pub goals: Arc<dyn GoalRepository>,
    pub bills: Arc<dyn CreditCardBillRepository>,
    pub transactions: Arc<dyn TransactionRepository>,

    pub reconcile_account: Arc<dyn ReconcileAccountUnitOfWork>,
    pub transfer_between_accounts: Arc<dyn TransferBetweenAccountsUnitOfWork>,
    pub transfer_between_envelopes: Arc<dyn TransferBetweenEnvelopesUnitOfWork>,
    pub pay_credit_card_bill: Arc<dyn PayCreditCardBillUnitOfWork>,
    pub register_past_transaction: Arc<dyn RegisterPastTransactionUnitOfWork>,

    pub authorization: Arc<dyn BudgetAuthorizationService>,
    pub publisher: Arc<dyn EventPublisher>,
}

impl BudgetPorts {
    /// Ports backed by PostgreSQL
    pub fn postgres(
        pool: PgPool,
        authorization: Arc<dyn BudgetAuthorizationService>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let repositories = Arc::new(PgRepositories::new(pool.clone()));
        let unit_of_work = Arc::new(PgUnitOfWork::new(pool));
        Self {
            accounts: repositories.clone(),
            envelopes: repositories.clone(),
            goals: repositories.clone(),
            bills: repositories.clone(),
            transactions: repositories,
            reconcile_account: unit_of_work.clone(),
            transfer_between_accounts: unit_of_work.clone(),
            transfer_between_envelopes: unit_of_work.clone(),
            pay_credit_card_bill: unit_of_work.clone(),
            register_past_transaction: unit_of_work,
            authorization,
            publisher,
        }
    }

    /// Ports backed by one shared in-memory store
    pub fn in_memory(
        store: Arc<InMemoryStore>,
        authorization: Arc<dyn BudgetAuthorizationService>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let repositories = Arc::new(InMemoryRepositories::new(store.clone()));
        let unit_of_work = Arc::new(InMemoryUnitOfWork::new(store));
        Self {
            accounts: repositories.clone(),
            envelopes: repositories.clone(),
            goals: repositories.clone(),
            bills: repositories.clone(),
            transactions: repositories,
            reconcile_account: unit_of_work.clone(),
            transfer_between_accounts: unit_of_work.clone(),
            transfer_between_envelopes: unit_of_work.clone(),
            pay_credit_card_bill: unit_of_work.clone(),
            register_past_transaction: unit_of_work,
            authorization,
            publisher,
        }
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    /// Fail unless the acting user may access `budget_id`
    pub(crate) async fn authorize(
        &self,
        context: &OperationContext,
        budget_id: Uuid,
    ) -> Result<(), AppError> {
        let allowed = self
            .authorization
            .can_access_budget(context.user_id, budget_id)
            .await
            .map_err(|source| AppError::AuthorizationFailed { source })?;

        if !allowed {
            warn!(
                user_id = %context.user_id,
                budget_id = %budget_id,
                "Budget access denied"
            );
            return Err(AppError::InsufficientPermissions {
                user_id: context.user_id,
                budget_id,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Loading
    // =========================================================================

    pub(crate) async fn load_account(&self, id: Uuid, budget_id: Uuid) -> Result<Account, AppError> {
        let found = self
            .accounts
            .find_by_id(id)
            .await
            .map_err(AppError::repository(Account::aggregate_type()))?;
        visible(found, id, budget_id)
    }

    pub(crate) async fn load_envelope(&self, id: Uuid, budget_id: Uuid) -> Result<Envelope, AppError> {
        let found = self
            .envelopes
            .find_by_id(id)
            .await
            .map_err(AppError::repository(Envelope::aggregate_type()))?;
        visible(found, id, budget_id)
    }

    pub(crate) async fn load_goal(&self, id: Uuid, budget_id: Uuid) -> Result<Goal, AppError> {
        let found = self
            .goals
            .find_by_id(id)
            .await
            .map_err(AppError::repository(Goal::aggregate_type()))?;
        visible(found, id, budget_id)
    }

    pub(crate) async fn load_bill(&self, id: Uuid, budget_id: Uuid) -> Result<CreditCardBill, AppError> {
        let found = self
            .bills
            .find_by_id(id)
            .await
            .map_err(AppError::repository(CreditCardBill::aggregate_type()))?;
        visible(found, id, budget_id)
    }

    pub(crate) async fn load_transaction(
        &self,
        id: Uuid,
        budget_id: Uuid,
    ) -> Result<Transaction, AppError> {
        let found = self
            .transactions
            .find_by_id(id)
            .await
            .map_err(AppError::repository(Transaction::aggregate_type()))?;
        visible(found, id, budget_id)
    }

    // =========================================================================
    // Publishing
    // =========================================================================

    /// Publish committed events. Failures are logged and never reported.
    pub(crate) async fn publish<E>(&self, events: impl IntoIterator<Item = E>)
    where
        E: Into<DomainEvent>,
    {
        for event in events {
            let event = event.into();
            if let Err(e) = self.publisher.publish(&event).await {
                warn!(
                    event_type = event.event_type(),
                    aggregate_id = %event.aggregate_id(),
                    error = %e,
                    "Failed to publish event"
                );
            }
        }
    }
}

/// Soft-deleted and cross-budget aggregates are reported as absent
fn visible<A: Aggregate>(found: Option<A>, id: Uuid, budget_id: Uuid) -> Result<A, AppError> {
    found
        .filter(|aggregate| aggregate.is_visible_to(budget_id))
        .ok_or_else(|| AppError::not_found(A::aggregate_type(), id))
}

/// Strictly positive amount from raw cents
pub(crate) fn amount(cents: i64) -> Result<Amount, AppError> {
    Amount::new(cents).map_err(|e| AppError::Domain(DomainError::from(e)))
}
