//! Scheduled Jobs
//!
//! Background jobs run on a fixed interval. The only job today marks
//! SCHEDULED transactions whose date has passed as LATE.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::interval;

use crate::aggregate::Aggregate;
use crate::domain::DomainEvent;
use crate::ports::{EventPublisher, PersistenceError, TransactionRepository};

// =========================================================================
// Late Transaction Sweep
// =========================================================================

/// Mark up to `batch_size` overdue SCHEDULED transactions as LATE.
///
/// A transaction that fails to save is reported and skipped; the sweep goes
/// on with the rest of the batch. Only a failing lookup aborts the run.
pub async fn mark_overdue_transactions_late(
    transactions: &dyn TransactionRepository,
    publisher: &dyn EventPublisher,
    now: DateTime<Utc>,
    batch_size: i64,
) -> Result<SweepResult, JobError> {
    let overdue = transactions.find_overdue_scheduled(now, batch_size).await?;
    let mut result = SweepResult::default();

    for transaction in overdue {
        // changed since the lookup
        let (late, event) = match transaction.mark_as_late(now) {
            Ok(change) => change,
            Err(e) => {
                tracing::debug!(transaction_id = %transaction.id(), reason = %e, "Skipping transaction");
                result.skipped += 1;
                continue;
            }
        };

        if let Err(e) = transactions.save(&late).await {
            tracing::error!(transaction_id = %late.id(), error = %e, "Failed to mark transaction late");
            result
                .failures
                .push(format!("transaction {}: {}", late.id(), e));
            continue;
        }

        let event = DomainEvent::from(event);
        if let Err(e) = publisher.publish(&event).await {
            tracing::warn!(
                event_type = event.event_type(),
                aggregate_id = %late.id(),
                error = %e,
                "Failed to publish event"
            );
        }
        result.marked_late += 1;
    }

    if result.marked_late > 0 {
        tracing::info!(marked_late = result.marked_late, "Marked overdue transactions as late");
    }

    Ok(result)
}

/// Outcome of one sweep
#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    pub marked_late: u64,
    /// No longer SCHEDULED or no longer overdue when processed
    pub skipped: u64,
    pub failures: Vec<String>,
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval of the late transaction sweep (default: 5 minutes)
    pub late_sweep_interval: Duration,
    /// Transactions handled per sweep
    pub batch_size: i64,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            late_sweep_interval: Duration::from_secs(300),
            batch_size: 500,
        }
    }
}

/// Job Scheduler - runs the periodic jobs
pub struct JobScheduler {
    transactions: Arc<dyn TransactionRepository>,
    publisher: Arc<dyn EventPublisher>,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self::with_config(transactions, publisher, JobSchedulerConfig::default())
    }

    pub fn with_config(
        transactions: Arc<dyn TransactionRepository>,
        publisher: Arc<dyn EventPublisher>,
        config: JobSchedulerConfig,
    ) -> Self {
        Self {
            transactions,
            publisher,
            config,
        }
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        tracing::info!(
            interval_secs = self.config.late_sweep_interval.as_secs(),
            "Job scheduler started"
        );

        let mut late_sweep_interval = interval(self.config.late_sweep_interval);
        loop {
            late_sweep_interval.tick().await;
            if let Err(e) = self.sweep().await {
                tracing::error!(error = %e, "Late transaction sweep failed");
            }
        }
    }

    async fn sweep(&self) -> Result<SweepResult, JobError> {
        mark_overdue_transactions_late(
            self.transactions.as_ref(),
            self.publisher.as_ref(),
            Utc::now(),
            self.config.batch_size,
        )
        .await
    }

    /// Run all jobs once (for manual trigger or testing)
    pub async fn run_all_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match self.sweep().await {
            Ok(result) => {
                report.transactions_marked_late = result.marked_late;
                report.errors.extend(result.failures);
            }
            Err(e) => report.errors.push(format!("Late transaction sweep: {}", e)),
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from running the jobs once
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub transactions_marked_late: u64,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Transaction;
    use crate::domain::{Amount, TransactionDetails, TransactionStatus, TransactionType};
    use crate::persistence::{InMemoryRepositories, InMemoryStore, PendingWrite};
    use crate::publisher::InMemoryEventBus;
    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;

    fn scheduled(store: &InMemoryStore, offset: ChronoDuration) -> Transaction {
        let now = Utc::now();
        let (mut transaction, _) = Transaction::create(
            Uuid::new_v4(),
            TransactionDetails {
                account_id: Uuid::new_v4(),
                category_id: Uuid::new_v4(),
                description: "Internet".to_string(),
                amount: Amount::new(9_990).unwrap(),
                transaction_type: TransactionType::Expense,
                transaction_date: now + ChronoDuration::days(1),
            },
            now,
        )
        .unwrap();
        transaction.transaction_date = now + offset;
        store.seed(PendingWrite::Transaction(&transaction));
        transaction
    }

    fn scheduler(store: &Arc<InMemoryStore>, bus: &Arc<InMemoryEventBus>) -> JobScheduler {
        JobScheduler::new(
            Arc::new(InMemoryRepositories::new(store.clone())),
            bus.clone(),
        )
    }

    #[test]
    fn test_job_scheduler_config_default() {
        let config = JobSchedulerConfig::default();
        assert_eq!(config.late_sweep_interval, Duration::from_secs(300));
        assert_eq!(config.batch_size, 500);
    }

    #[tokio::test]
    async fn test_sweep_marks_only_overdue_transactions() {
        let store = InMemoryStore::new();
        let bus = Arc::new(InMemoryEventBus::new());
        let overdue = scheduled(&store, ChronoDuration::hours(-2));
        let upcoming = scheduled(&store, ChronoDuration::days(2));

        let report = scheduler(&store, &bus).run_all_once().await;

        assert_eq!(report.transactions_marked_late, 1);
        assert!(report.errors.is_empty());
        assert_eq!(
            store.transaction(overdue.id()).unwrap().status(),
            TransactionStatus::Late
        );
        assert_eq!(
            store.transaction(upcoming.id()).unwrap().status(),
            TransactionStatus::Scheduled
        );
        assert_eq!(bus.event_types(), vec!["TransactionMarkedLate"]);
    }

    #[tokio::test]
    async fn test_sweep_continues_after_failed_save() {
        let store = InMemoryStore::new();
        let bus = Arc::new(InMemoryEventBus::new());
        let failing = scheduled(&store, ChronoDuration::hours(-3));
        let healthy = scheduled(&store, ChronoDuration::hours(-1));
        store.fail_saves_of("Transaction", failing.id());

        let report = scheduler(&store, &bus).run_all_once().await;

        assert_eq!(report.transactions_marked_late, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            store.transaction(failing.id()).unwrap().status(),
            TransactionStatus::Scheduled
        );
        assert_eq!(
            store.transaction(healthy.id()).unwrap().status(),
            TransactionStatus::Late
        );
    }

    #[test]
    fn test_maintenance_report_default() {
        let report = MaintenanceReport::default();
        assert_eq!(report.transactions_marked_late, 0);
        assert_eq!(report.errors.len(), 0);
    }
}
