//! Recurring transfer worker
//!
//! Periodically scans for due standing instructions and fires each one
//! through the transfer engine. Items are isolated: one failure marks that
//! instruction FAILED and the pass continues with the rest.

use chrono::{Days, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::audit::AuditTrail;
use crate::config::SchedulerConfig;
use crate::error::EngineError;
use crate::savings::SavingsService;
use crate::store::{RecurringStore, Store, WalletStore};
use crate::transfer::models::TransferRequest;
use crate::transfer::TransferEngine;

use super::models::{RecurringStatus, RecurringTransfer};
use super::schedule::next_execution_date;

/// Counters from one worker pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub fired: usize,
    pub failed: usize,
    pub completed: usize,
}

pub struct RecurringWorker {
    store: Arc<dyn Store>,
    engine: TransferEngine,
    savings: SavingsService,
    audit: AuditTrail,
    config: SchedulerConfig,
}

impl RecurringWorker {
    pub fn new(
        store: Arc<dyn Store>,
        engine: TransferEngine,
        savings: SavingsService,
        audit: AuditTrail,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            engine,
            savings,
            audit,
            config,
        }
    }

    /// Run forever at the configured interval.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        info!(
            interval_secs = self.config.interval_secs,
            batch_size = self.config.batch_size,
            "Recurring worker started"
        );
        loop {
            ticker.tick().await;
            let today = Utc::now().date_naive();
            match self.run_once(today).await {
                Ok(stats) if stats.fired + stats.failed > 0 => {
                    info!(
                        fired = stats.fired,
                        failed = stats.failed,
                        completed = stats.completed,
                        "Recurring pass finished"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Recurring pass aborted"),
            }
        }
    }

    /// One scan-and-fire pass for `today`.
    pub async fn run_once(&self, today: NaiveDate) -> Result<RunStats, EngineError> {
        let mut due = self.store.due_recurring(today).await?;
        due.truncate(self.config.batch_size);

        let mut stats = RunStats::default();
        for item in due {
            let recurring_id = item.recurring_id;
            match self.fire(&item, today).await {
                Ok(completed) => {
                    stats.fired += 1;
                    if completed {
                        stats.completed += 1;
                    }
                }
                Err(e) => {
                    warn!(recurring_id, error = %e, "Recurring execution failed");
                    stats.failed += 1;
                    if let Err(e) = self
                        .store
                        .update_recurring_status(recurring_id, RecurringStatus::Failed)
                        .await
                    {
                        error!(recurring_id, error = %e, "Could not mark recurring FAILED");
                    }
                    self.audit
                        .record(
                            "RECURRING_TRANSFER",
                            recurring_id,
                            "RECURRING_FAILED",
                            None,
                            Some(RecurringStatus::Active.to_string()),
                            Some(e.to_string()),
                        )
                        .await;
                }
            }
        }
        Ok(stats)
    }

    /// Fire one instruction. Returns whether it reached COMPLETED.
    async fn fire(&self, item: &RecurringTransfer, today: NaiveDate) -> Result<bool, EngineError> {
        let source = self
            .store
            .wallet_by_id(item.source_wallet_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("wallet {}", item.source_wallet_id)))?;
        let destination = self
            .store
            .wallet_by_id(item.destination_wallet_id)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("wallet {}", item.destination_wallet_id))
            })?;

        self.engine
            .initiate(
                TransferRequest {
                    source_wallet_number: source.wallet_number,
                    destination_wallet_number: destination.wallet_number,
                    amount: item.amount,
                    currency: item.currency.clone(),
                    description: Some(match &item.description {
                        Some(d) => format!("Recurring: {}", d),
                        None => format!("Recurring transfer #{}", item.recurring_id),
                    }),
                },
                item.user_id,
            )
            .await?;

        if let Some(goal_id) = item.savings_goal_id
            && let Err(e) = self
                .savings
                .contribute(goal_id, item.amount, Some(item.user_id))
                .await
        {
            // Money already moved; a broken goal link must not fail the firing
            warn!(
                recurring_id = item.recurring_id,
                goal_id,
                error = %e,
                "Goal contribution not recorded"
            );
        }

        let executed_at = Utc::now();
        let next = next_execution_date(
            today + Days::new(1),
            today,
            item.frequency,
            item.day_of_week,
            item.day_of_month,
        );
        self.store
            .update_recurring_after_execution(item.recurring_id, next, executed_at)
            .await?;

        let execution_count = item.execution_count + 1;
        let max_reached = item
            .max_executions
            .is_some_and(|max| execution_count >= max);
        let past_end = item.end_date.is_some_and(|end| next > end);

        if max_reached || past_end {
            self.store
                .update_recurring_status(item.recurring_id, RecurringStatus::Completed)
                .await?;
            info!(
                recurring_id = item.recurring_id,
                execution_count, "Recurring transfer completed"
            );
            self.audit
                .record(
                    "RECURRING_TRANSFER",
                    item.recurring_id,
                    "RECURRING_COMPLETED",
                    None,
                    Some(RecurringStatus::Active.to_string()),
                    Some(RecurringStatus::Completed.to_string()),
                )
                .await;
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransferConfig;
    use crate::events::EventPublisher;
    use crate::recurring::models::{Frequency, NewRecurringTransfer};
    use crate::store::{MemoryStore, SavingsStore};
    use chrono::NaiveTime;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn worker(store: Arc<MemoryStore>) -> RecurringWorker {
        let store: Arc<dyn Store> = store;
        let audit = AuditTrail::new(store.clone());
        RecurringWorker::new(
            store.clone(),
            TransferEngine::new(
                store.clone(),
                audit.clone(),
                EventPublisher::default(),
                TransferConfig::default(),
            ),
            SavingsService::new(store.clone(), audit.clone()),
            audit,
            SchedulerConfig::default(),
        )
    }

    async fn seed_recurring(
        store: &MemoryStore,
        source_wallet_id: i64,
        destination_wallet_id: i64,
        amount: &str,
        savings_goal_id: Option<i64>,
        max_executions: Option<i32>,
    ) -> i64 {
        let today = Utc::now().date_naive();
        store
            .insert_recurring(NewRecurringTransfer {
                user_id: 1001,
                source_wallet_id,
                destination_wallet_id,
                savings_goal_id,
                amount: dec(amount),
                currency: "USD".to_string(),
                frequency: Frequency::Daily,
                day_of_week: None,
                day_of_month: None,
                execution_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                start_date: today,
                end_date: None,
                next_execution_date: today,
                max_executions,
                description: None,
            })
            .await
            .unwrap()
            .recurring_id
    }

    #[tokio::test]
    async fn test_due_item_fires_and_reschedules() {
        let store = Arc::new(MemoryStore::new());
        let source = store
            .seed_wallet(1001, "WAL-001", dec("500"), "USD", dec("10000"))
            .await;
        let destination = store
            .seed_wallet(1001, "WAL-002", dec("0"), "USD", dec("10000"))
            .await;
        let recurring_id = seed_recurring(
            &store,
            source.wallet_id,
            destination.wallet_id,
            "50",
            None,
            None,
        )
        .await;

        let today = Utc::now().date_naive();
        let stats = worker(store.clone()).run_once(today).await.unwrap();
        assert_eq!(stats, RunStats { fired: 1, failed: 0, completed: 0 });

        let recurring = store.recurring_by_id(recurring_id).await.unwrap().unwrap();
        assert_eq!(recurring.execution_count, 1);
        assert_eq!(recurring.next_execution_date, today + Days::new(1));
        assert!(recurring.last_executed_at.is_some());

        let destination = store
            .wallet_by_id(destination.wallet_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(destination.balance, dec("50"));
    }

    #[tokio::test]
    async fn test_not_due_item_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let source = store
            .seed_wallet(1001, "WAL-001", dec("500"), "USD", dec("10000"))
            .await;
        let destination = store
            .seed_wallet(1001, "WAL-002", dec("0"), "USD", dec("10000"))
            .await;
        seed_recurring(&store, source.wallet_id, destination.wallet_id, "50", None, None).await;

        // Pass runs "yesterday", before the due date
        let yesterday = Utc::now().date_naive() - Days::new(1);
        let stats = worker(store).run_once(yesterday).await.unwrap();
        assert_eq!(stats, RunStats::default());
    }

    #[tokio::test]
    async fn test_failed_firing_marks_failed_and_continues() {
        let store = Arc::new(MemoryStore::new());
        let poor = store
            .seed_wallet(1001, "WAL-001", dec("10"), "USD", dec("10000"))
            .await;
        let rich = store
            .seed_wallet(1001, "WAL-002", dec("500"), "USD", dec("10000"))
            .await;
        let sink = store
            .seed_wallet(1001, "WAL-003", dec("0"), "USD", dec("10000"))
            .await;

        // First item cannot cover its amount, second can
        let failing =
            seed_recurring(&store, poor.wallet_id, sink.wallet_id, "100", None, None).await;
        let passing =
            seed_recurring(&store, rich.wallet_id, sink.wallet_id, "100", None, None).await;

        let today = Utc::now().date_naive();
        let stats = worker(store.clone()).run_once(today).await.unwrap();
        assert_eq!(stats.fired, 1);
        assert_eq!(stats.failed, 1);

        let failing = store.recurring_by_id(failing).await.unwrap().unwrap();
        assert_eq!(failing.status, RecurringStatus::Failed);
        let passing = store.recurring_by_id(passing).await.unwrap().unwrap();
        assert_eq!(passing.status, RecurringStatus::Active);
        assert_eq!(passing.execution_count, 1);
    }

    #[tokio::test]
    async fn test_max_executions_completes_instruction() {
        let store = Arc::new(MemoryStore::new());
        let source = store
            .seed_wallet(1001, "WAL-001", dec("500"), "USD", dec("10000"))
            .await;
        let destination = store
            .seed_wallet(1001, "WAL-002", dec("0"), "USD", dec("10000"))
            .await;
        let recurring_id = seed_recurring(
            &store,
            source.wallet_id,
            destination.wallet_id,
            "50",
            None,
            Some(1),
        )
        .await;

        let today = Utc::now().date_naive();
        let stats = worker(store.clone()).run_once(today).await.unwrap();
        assert_eq!(stats.completed, 1);

        let recurring = store.recurring_by_id(recurring_id).await.unwrap().unwrap();
        assert_eq!(recurring.status, RecurringStatus::Completed);

        // No longer due on later passes
        let stats = worker(store)
            .run_once(today + Days::new(1))
            .await
            .unwrap();
        assert_eq!(stats, RunStats::default());
    }

    #[tokio::test]
    async fn test_linked_goal_receives_contribution() {
        let store = Arc::new(MemoryStore::new());
        let source = store
            .seed_wallet(1001, "WAL-001", dec("500"), "USD", dec("10000"))
            .await;
        let savings = store
            .seed_wallet(1001, "WAL-SAVE", dec("0"), "USD", dec("10000"))
            .await;
        let goal = store
            .insert_goal(crate::savings::models::NewSavingsGoal {
                user_id: 1001,
                savings_wallet_id: savings.wallet_id,
                goal_name: "Vacation".to_string(),
                description: None,
                target_amount: dec("100"),
                currency: "USD".to_string(),
                target_date: Utc::now().date_naive() + Days::new(365),
            })
            .await
            .unwrap();
        seed_recurring(
            &store,
            source.wallet_id,
            savings.wallet_id,
            "100",
            Some(goal.goal_id),
            None,
        )
        .await;

        let today = Utc::now().date_naive();
        worker(store.clone()).run_once(today).await.unwrap();

        let goal = store.goal_by_id(goal.goal_id).await.unwrap().unwrap();
        assert_eq!(goal.current_amount, dec("100"));
        // Target reached by this contribution
        assert_eq!(goal.status, crate::savings::models::GoalStatus::Achieved);
    }
}
