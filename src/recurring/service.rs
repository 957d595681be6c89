//! Recurring transfer management
//!
//! Creation validates the standing instruction up front; actual firing is
//! the worker's job. Lifecycle: ACTIVE <-> PAUSED, ACTIVE -> COMPLETED or
//! CANCELLED, and FAILED after a firing error. FAILED is recoverable by a
//! manual resume.

use chrono::{NaiveTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::audit::AuditTrail;
use crate::error::EngineError;
use crate::store::{RecurringStore, SavingsStore, Store, WalletStore};

use super::models::{
    NewRecurringTransfer, RecurringStatus, RecurringTransfer, RecurringTransferRequest,
};
use super::schedule::next_execution_date;

/// Default firing time when the request does not pick one
const DEFAULT_EXECUTION_TIME: (u32, u32, u32) = (9, 0, 0);

#[derive(Clone)]
pub struct RecurringService {
    store: Arc<dyn Store>,
    audit: AuditTrail,
}

impl RecurringService {
    pub fn new(store: Arc<dyn Store>, audit: AuditTrail) -> Self {
        Self { store, audit }
    }

    pub async fn create(
        &self,
        request: RecurringTransferRequest,
        user_id: i64,
    ) -> Result<RecurringTransfer, EngineError> {
        let today = Utc::now().date_naive();

        if request.amount <= Decimal::ZERO {
            return Err(EngineError::InvalidRequest(
                "amount must be positive".to_string(),
            ));
        }
        if request.source_wallet_number == request.destination_wallet_number {
            return Err(EngineError::InvalidRequest(
                "source and destination wallets must differ".to_string(),
            ));
        }
        if request.start_date < today {
            return Err(EngineError::InvalidRequest(
                "start date must not be in the past".to_string(),
            ));
        }
        if let Some(end) = request.end_date
            && end <= request.start_date
        {
            return Err(EngineError::InvalidRequest(
                "end date must be after the start date".to_string(),
            ));
        }
        if let Some(dow) = request.day_of_week
            && !(1..=7).contains(&dow)
        {
            return Err(EngineError::InvalidRequest(
                "day of week must be 1 (Monday) to 7 (Sunday)".to_string(),
            ));
        }
        if let Some(dom) = request.day_of_month
            && !(1..=31).contains(&dom)
        {
            return Err(EngineError::InvalidRequest(
                "day of month must be 1 to 31".to_string(),
            ));
        }
        if let Some(max) = request.max_executions
            && max <= 0
        {
            return Err(EngineError::InvalidRequest(
                "max executions must be positive".to_string(),
            ));
        }

        let source = self
            .store
            .wallet_by_number(&request.source_wallet_number)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("wallet {}", request.source_wallet_number))
            })?;
        let destination = self
            .store
            .wallet_by_number(&request.destination_wallet_number)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("wallet {}", request.destination_wallet_number))
            })?;

        if source.user_id != user_id {
            return Err(EngineError::Conflict(
                "source wallet is not owned by the caller".to_string(),
            ));
        }
        if !source.is_active() || !destination.is_active() {
            return Err(EngineError::InvalidState(
                "both wallets must be active".to_string(),
            ));
        }
        if source.currency != destination.currency {
            return Err(EngineError::CurrencyMismatch {
                expected: source.currency,
                actual: destination.currency,
            });
        }

        if let Some(goal_id) = request.savings_goal_id {
            let goal = self
                .store
                .goal_by_id(goal_id)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("savings goal {}", goal_id)))?;
            if goal.user_id != user_id {
                return Err(EngineError::Conflict(
                    "linked goal is not owned by the caller".to_string(),
                ));
            }
            if goal.savings_wallet_id != destination.wallet_id {
                return Err(EngineError::InvalidRequest(
                    "linked goal does not belong to the destination wallet".to_string(),
                ));
            }
        }

        let next = next_execution_date(
            request.start_date,
            today,
            request.frequency,
            request.day_of_week,
            request.day_of_month,
        );
        let (h, m, s) = DEFAULT_EXECUTION_TIME;
        let execution_time = request
            .execution_time
            .unwrap_or_else(|| NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN));

        let recurring = self
            .store
            .insert_recurring(NewRecurringTransfer {
                user_id,
                source_wallet_id: source.wallet_id,
                destination_wallet_id: destination.wallet_id,
                savings_goal_id: request.savings_goal_id,
                amount: request.amount,
                currency: source.currency,
                frequency: request.frequency,
                day_of_week: request.day_of_week,
                day_of_month: request.day_of_month,
                execution_time,
                start_date: request.start_date,
                end_date: request.end_date,
                next_execution_date: next,
                max_executions: request.max_executions,
                description: request.description,
            })
            .await?;

        info!(
            recurring_id = recurring.recurring_id,
            frequency = %recurring.frequency,
            next = %recurring.next_execution_date,
            "Recurring transfer created"
        );
        self.audit
            .record(
                "RECURRING_TRANSFER",
                recurring.recurring_id,
                "RECURRING_CREATED",
                Some(user_id),
                None,
                Some(format!(
                    "{} {} {}",
                    recurring.frequency, recurring.amount, recurring.currency
                )),
            )
            .await;

        Ok(recurring)
    }

    pub async fn pause(
        &self,
        recurring_id: i64,
        user_id: i64,
    ) -> Result<RecurringTransfer, EngineError> {
        let recurring = self.owned(recurring_id, user_id).await?;
        if recurring.status != RecurringStatus::Active {
            return Err(EngineError::InvalidState(format!(
                "recurring transfer {} is {}",
                recurring_id, recurring.status
            )));
        }
        self.set_status(recurring_id, user_id, recurring.status, RecurringStatus::Paused)
            .await
    }

    /// Resume a paused or failed instruction. A next execution date left in
    /// the past fires once on the next worker pass; the date computed after
    /// that firing starts from today, so no backlog accumulates.
    pub async fn resume(
        &self,
        recurring_id: i64,
        user_id: i64,
    ) -> Result<RecurringTransfer, EngineError> {
        let recurring = self.owned(recurring_id, user_id).await?;
        if !matches!(
            recurring.status,
            RecurringStatus::Paused | RecurringStatus::Failed
        ) {
            return Err(EngineError::InvalidState(format!(
                "recurring transfer {} is {}",
                recurring_id, recurring.status
            )));
        }
        self.set_status(recurring_id, user_id, recurring.status, RecurringStatus::Active)
            .await
    }

    pub async fn cancel(
        &self,
        recurring_id: i64,
        user_id: i64,
    ) -> Result<RecurringTransfer, EngineError> {
        let recurring = self.owned(recurring_id, user_id).await?;
        if recurring.status.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "recurring transfer {} is {}",
                recurring_id, recurring.status
            )));
        }
        self.set_status(
            recurring_id,
            user_id,
            recurring.status,
            RecurringStatus::Cancelled,
        )
        .await
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<RecurringTransfer>, EngineError> {
        self.store.recurring_by_user(user_id).await
    }

    pub async fn by_id(
        &self,
        recurring_id: i64,
        user_id: i64,
    ) -> Result<RecurringTransfer, EngineError> {
        self.owned(recurring_id, user_id).await
    }

    async fn set_status(
        &self,
        recurring_id: i64,
        user_id: i64,
        old: RecurringStatus,
        new: RecurringStatus,
    ) -> Result<RecurringTransfer, EngineError> {
        self.store.update_recurring_status(recurring_id, new).await?;
        self.audit
            .record(
                "RECURRING_TRANSFER",
                recurring_id,
                "RECURRING_STATUS_CHANGED",
                Some(user_id),
                Some(old.to_string()),
                Some(new.to_string()),
            )
            .await;
        self.require(recurring_id).await
    }

    async fn owned(
        &self,
        recurring_id: i64,
        user_id: i64,
    ) -> Result<RecurringTransfer, EngineError> {
        let recurring = self.require(recurring_id).await?;
        if recurring.user_id != user_id {
            return Err(EngineError::Conflict(
                "recurring transfer is not owned by the caller".to_string(),
            ));
        }
        Ok(recurring)
    }

    async fn require(&self, recurring_id: i64) -> Result<RecurringTransfer, EngineError> {
        self.store
            .recurring_by_id(recurring_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("recurring transfer {}", recurring_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurring::models::Frequency;
    use crate::store::MemoryStore;
    use chrono::Days;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn service(store: Arc<MemoryStore>) -> RecurringService {
        let store: Arc<dyn Store> = store;
        RecurringService::new(store.clone(), AuditTrail::new(store))
    }

    fn daily_request(from: &str, to: &str) -> RecurringTransferRequest {
        RecurringTransferRequest {
            source_wallet_number: from.to_string(),
            destination_wallet_number: to.to_string(),
            savings_goal_id: None,
            amount: dec("50"),
            currency: "USD".to_string(),
            frequency: Frequency::Daily,
            day_of_week: None,
            day_of_month: None,
            execution_time: None,
            start_date: Utc::now().date_naive(),
            end_date: None,
            max_executions: None,
            description: None,
        }
    }

    async fn seed_pair(store: &MemoryStore) {
        store
            .seed_wallet(1001, "WAL-001", dec("1000"), "USD", dec("10000"))
            .await;
        store
            .seed_wallet(1001, "WAL-002", dec("0"), "USD", dec("10000"))
            .await;
    }

    #[tokio::test]
    async fn test_create_daily_due_today() {
        let store = Arc::new(MemoryStore::new());
        seed_pair(&store).await;

        let service = service(store.clone());
        let recurring = service
            .create(daily_request("WAL-001", "WAL-002"), 1001)
            .await
            .unwrap();

        assert_eq!(recurring.status, RecurringStatus::Active);
        assert_eq!(recurring.next_execution_date, Utc::now().date_naive());
        assert_eq!(recurring.execution_count, 0);

        let due = store.due_recurring(Utc::now().date_naive()).await.unwrap();
        assert_eq!(due.len(), 1);
    }

    #[tokio::test]
    async fn test_past_start_date_rejected() {
        let store = Arc::new(MemoryStore::new());
        seed_pair(&store).await;

        let mut request = daily_request("WAL-001", "WAL-002");
        request.start_date = Utc::now().date_naive() - Days::new(1);

        let err = service(store).create(request, 1001).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_invalid_anchors_rejected() {
        let store = Arc::new(MemoryStore::new());
        seed_pair(&store).await;
        let service = service(store);

        let mut request = daily_request("WAL-001", "WAL-002");
        request.frequency = Frequency::Weekly;
        request.day_of_week = Some(8);
        assert!(service.create(request, 1001).await.is_err());

        let mut request = daily_request("WAL-001", "WAL-002");
        request.frequency = Frequency::Monthly;
        request.day_of_month = Some(32);
        assert!(service.create(request, 1001).await.is_err());
    }

    #[tokio::test]
    async fn test_pause_resume_cancel_lifecycle() {
        let store = Arc::new(MemoryStore::new());
        seed_pair(&store).await;

        let service = service(store);
        let recurring = service
            .create(daily_request("WAL-001", "WAL-002"), 1001)
            .await
            .unwrap();

        let recurring = service.pause(recurring.recurring_id, 1001).await.unwrap();
        assert_eq!(recurring.status, RecurringStatus::Paused);

        // Pausing twice is an invalid transition
        assert!(service.pause(recurring.recurring_id, 1001).await.is_err());

        let recurring = service.resume(recurring.recurring_id, 1001).await.unwrap();
        assert_eq!(recurring.status, RecurringStatus::Active);

        let recurring = service.cancel(recurring.recurring_id, 1001).await.unwrap();
        assert_eq!(recurring.status, RecurringStatus::Cancelled);
        assert!(service.resume(recurring.recurring_id, 1001).await.is_err());
    }

    #[tokio::test]
    async fn test_goal_linkage_must_match_destination() {
        let store = Arc::new(MemoryStore::new());
        seed_pair(&store).await;
        // Goal lives on a third wallet, not the destination
        let other = store
            .seed_wallet(1001, "WAL-003", dec("0"), "USD", dec("10000"))
            .await;
        let goal = store
            .insert_goal(crate::savings::models::NewSavingsGoal {
                user_id: 1001,
                savings_wallet_id: other.wallet_id,
                goal_name: "Vacation".to_string(),
                description: None,
                target_amount: dec("1000"),
                currency: "USD".to_string(),
                target_date: Utc::now().date_naive() + Days::new(365),
            })
            .await
            .unwrap();

        let mut request = daily_request("WAL-001", "WAL-002");
        request.savings_goal_id = Some(goal.goal_id);

        let err = service(store).create(request, 1001).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_foreign_source_rejected() {
        let store = Arc::new(MemoryStore::new());
        seed_pair(&store).await;

        let err = service(store)
            .create(daily_request("WAL-001", "WAL-002"), 1002)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }
}
