//! In-memory adapters
//!
//! A process-local store implementing every repository and Unit-of-Work port.
//! Unit-of-Work operations stage their writes on a copy of the tables and swap
//! it in only when every step succeeded. Saves can be made to fail on demand.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::aggregate::{Account, Aggregate, CreditCardBill, Envelope, Goal, Transaction};
use crate::domain::TransactionStatus;
use crate::ports::{
    AccountRepository, BudgetAuthorizationService, CreditCardBillRepository, EnvelopeRepository,
    ExecutionError, GoalRepository, PayCreditCardBillUnitOfWork, PersistenceError,
    ReconcileAccountUnitOfWork, RegisterPastTransactionUnitOfWork, TransactionRepository,
    TransferBetweenAccountsUnitOfWork, TransferBetweenEnvelopesUnitOfWork,
};
use crate::services::{AccountTransfer, PaidBill};

use super::plan::{self, PendingWrite, Step};

#[derive(Debug, Clone, Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    envelopes: HashMap<Uuid, Envelope>,
    goals: HashMap<Uuid, Goal>,
    bills: HashMap<Uuid, CreditCardBill>,
    transactions: HashMap<Uuid, Transaction>,
}

impl Tables {
    fn put(&mut self, write: PendingWrite<'_>) {
        match write {
            PendingWrite::Account(a) => {
                self.accounts.insert(a.id(), a.clone());
            }
            PendingWrite::Envelope(e) => {
                self.envelopes.insert(e.id(), e.clone());
            }
            PendingWrite::Goal(g) => {
                self.goals.insert(g.id(), g.clone());
            }
            PendingWrite::CreditCardBill(b) => {
                self.bills.insert(b.id(), b.clone());
            }
            PendingWrite::Transaction(t) => {
                self.transactions.insert(t.id(), t.clone());
            }
        }
    }
}

/// Shared state behind the in-memory adapters
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    failures: Mutex<HashSet<(&'static str, Uuid)>>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next save of `entity` `id` fail with `PersistenceError::Simulated`.
    ///
    /// `entity` is the aggregate type name, e.g. `"Envelope"`.
    pub fn fail_saves_of(&self, entity: &'static str, id: Uuid) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((entity, id));
    }

    /// Store an aggregate directly, bypassing failure injection
    pub fn seed(&self, write: PendingWrite<'_>) {
        self.write_tables().put(write);
    }

    pub fn account(&self, id: Uuid) -> Option<Account> {
        self.read_tables().accounts.get(&id).cloned()
    }

    pub fn envelope(&self, id: Uuid) -> Option<Envelope> {
        self.read_tables().envelopes.get(&id).cloned()
    }

    pub fn goal(&self, id: Uuid) -> Option<Goal> {
        self.read_tables().goals.get(&id).cloned()
    }

    pub fn bill(&self, id: Uuid) -> Option<CreditCardBill> {
        self.read_tables().bills.get(&id).cloned()
    }

    pub fn transaction(&self, id: Uuid) -> Option<Transaction> {
        self.read_tables().transactions.get(&id).cloned()
    }

    /// Stored transactions of an account, deleted ones included
    pub fn transactions_of(&self, account_id: Uuid) -> Vec<Transaction> {
        self.read_tables()
            .transactions
            .values()
            .filter(|t| t.account_id() == account_id)
            .cloned()
            .collect()
    }

    fn read_tables(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_tables(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_injected_failure(&self, write: &PendingWrite<'_>) -> Result<(), PersistenceError> {
        let key = (write.entity(), write.id());
        let injected = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        if injected {
            return Err(PersistenceError::Simulated {
                entity: key.0,
                id: key.1,
            });
        }
        Ok(())
    }

    fn save(&self, write: PendingWrite<'_>) -> Result<(), PersistenceError> {
        self.check_injected_failure(&write)?;
        self.write_tables().put(write);
        Ok(())
    }

    /// Apply every step or none
    fn commit(&self, operation: &'static str, steps: Vec<Step<'_>>) -> Result<(), ExecutionError> {
        let mut tables = self.write_tables();
        let mut staged = tables.clone();

        for (step, write) in steps {
            if let Err(source) = self.check_injected_failure(&write) {
                warn!(operation, step, error = %source, "Unit of work failed, discarding staged writes");
                return Err(ExecutionError::Save {
                    operation,
                    step,
                    source,
                });
            }
            staged.put(write);
        }

        *tables = staged;
        Ok(())
    }
}

// =========================================================================
// Repositories
// =========================================================================

#[derive(Debug, Clone)]
pub struct InMemoryRepositories {
    store: Arc<InMemoryStore>,
}

impl InMemoryRepositories {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AccountRepository for InMemoryRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, PersistenceError> {
        Ok(self.store.account(id))
    }

    async fn save(&self, account: &Account) -> Result<(), PersistenceError> {
        self.store.save(PendingWrite::Account(account))
    }

    async fn has_transactions(&self, account_id: Uuid) -> Result<bool, PersistenceError> {
        Ok(self
            .store
            .read_tables()
            .transactions
            .values()
            .any(|t| t.account_id() == account_id && !t.is_deleted()))
    }
}

#[async_trait]
impl EnvelopeRepository for InMemoryRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Envelope>, PersistenceError> {
        Ok(self.store.envelope(id))
    }

    async fn save(&self, envelope: &Envelope) -> Result<(), PersistenceError> {
        self.store.save(PendingWrite::Envelope(envelope))
    }

    async fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        self.store.write_tables().envelopes.remove(&id);
        Ok(())
    }

    async fn has_transactions(&self, envelope_id: Uuid) -> Result<bool, PersistenceError> {
        let tables = self.store.read_tables();
        let Some(envelope) = tables.envelopes.get(&envelope_id) else {
            return Ok(false);
        };
        Ok(tables.transactions.values().any(|t| {
            t.category_id() == envelope.category_id()
                && t.budget_id() == envelope.budget_id()
                && !t.is_deleted()
        }))
    }
}

#[async_trait]
impl GoalRepository for InMemoryRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Goal>, PersistenceError> {
        Ok(self.store.goal(id))
    }

    async fn save(&self, goal: &Goal) -> Result<(), PersistenceError> {
        self.store.save(PendingWrite::Goal(goal))
    }
}

#[async_trait]
impl CreditCardBillRepository for InMemoryRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CreditCardBill>, PersistenceError> {
        Ok(self.store.bill(id))
    }

    async fn save(&self, bill: &CreditCardBill) -> Result<(), PersistenceError> {
        self.store.save(PendingWrite::CreditCardBill(bill))
    }
}

#[async_trait]
impl TransactionRepository for InMemoryRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>, PersistenceError> {
        Ok(self.store.transaction(id))
    }

    async fn save(&self, transaction: &Transaction) -> Result<(), PersistenceError> {
        self.store.save(PendingWrite::Transaction(transaction))
    }

    async fn find_overdue_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Transaction>, PersistenceError> {
        let mut overdue: Vec<Transaction> = self
            .store
            .read_tables()
            .transactions
            .values()
            .filter(|t| {
                t.status() == TransactionStatus::Scheduled && !t.is_deleted() && t.is_overdue(now)
            })
            .cloned()
            .collect();
        overdue.sort_by_key(|t| t.transaction_date());
        overdue.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(overdue)
    }
}

// =========================================================================
// Unit of Work
// =========================================================================

#[derive(Debug, Clone)]
pub struct InMemoryUnitOfWork {
    store: Arc<InMemoryStore>,
}

impl InMemoryUnitOfWork {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReconcileAccountUnitOfWork for InMemoryUnitOfWork {
    async fn reconcile_account(
        &self,
        account: &Account,
        adjustment: Option<&Transaction>,
    ) -> Result<(), ExecutionError> {
        self.store.commit(
            plan::RECONCILE_ACCOUNT,
            plan::reconcile_account(account, adjustment),
        )
    }
}

#[async_trait]
impl TransferBetweenAccountsUnitOfWork for InMemoryUnitOfWork {
    async fn transfer_between_accounts(
        &self,
        transfer: &AccountTransfer,
    ) -> Result<(), ExecutionError> {
        self.store.commit(
            plan::TRANSFER_BETWEEN_ACCOUNTS,
            plan::transfer_between_accounts(transfer),
        )
    }
}

#[async_trait]
impl TransferBetweenEnvelopesUnitOfWork for InMemoryUnitOfWork {
    async fn transfer_between_envelopes(
        &self,
        source: &Envelope,
        target: &Envelope,
    ) -> Result<(), ExecutionError> {
        self.store.commit(
            plan::TRANSFER_BETWEEN_ENVELOPES,
            plan::transfer_between_envelopes(source, target),
        )
    }
}

#[async_trait]
impl PayCreditCardBillUnitOfWork for InMemoryUnitOfWork {
    async fn pay_credit_card_bill(&self, payment: &PaidBill) -> Result<(), ExecutionError> {
        self.store
            .commit(plan::PAY_CREDIT_CARD_BILL, plan::pay_credit_card_bill(payment))
    }
}

#[async_trait]
impl RegisterPastTransactionUnitOfWork for InMemoryUnitOfWork {
    async fn register_past_transaction(
        &self,
        transaction: &Transaction,
        account: &Account,
    ) -> Result<(), ExecutionError> {
        self.store.commit(
            plan::REGISTER_PAST_TRANSACTION,
            plan::register_past_transaction(transaction, account),
        )
    }
}

// =========================================================================
// Authorization
// =========================================================================

/// Grants access from a fixed set of `(user_id, budget_id)` pairs
#[derive(Debug, Default)]
pub struct StaticBudgetAuthorization {
    grants: RwLock<HashSet<(Uuid, Uuid)>>,
    failing: AtomicBool,
}

impl StaticBudgetAuthorization {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, user_id: Uuid, budget_id: Uuid) {
        self.grants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((user_id, budget_id));
    }

    pub fn revoke(&self, user_id: Uuid, budget_id: Uuid) {
        self.grants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(user_id, budget_id));
    }

    /// Make every lookup fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl BudgetAuthorizationService for StaticBudgetAuthorization {
    async fn can_access_budget(
        &self,
        user_id: Uuid,
        budget_id: Uuid,
    ) -> Result<bool, PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Simulated {
                entity: "BudgetAccess",
                id: budget_id,
            });
        }
        Ok(self
            .grants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(user_id, budget_id)))
    }
}
