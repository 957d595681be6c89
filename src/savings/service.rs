//! Savings goal service
//!
//! Goals track progress toward a target amount on a dedicated wallet. A
//! contribution mirrors a completed transfer into the goal's wallet; the
//! money itself moved through the transfer engine.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::audit::AuditTrail;
use crate::error::EngineError;
use crate::store::{SavingsStore, Store, WalletStore};

use super::models::{GoalStatus, NewSavingsGoal, SavingsGoal, SavingsGoalRequest};

#[derive(Clone)]
pub struct SavingsService {
    store: Arc<dyn Store>,
    audit: AuditTrail,
}

impl SavingsService {
    pub fn new(store: Arc<dyn Store>, audit: AuditTrail) -> Self {
        Self { store, audit }
    }

    pub async fn create(
        &self,
        request: SavingsGoalRequest,
        user_id: i64,
    ) -> Result<SavingsGoal, EngineError> {
        if request.target_amount <= Decimal::ZERO {
            return Err(EngineError::InvalidRequest(
                "target amount must be positive".to_string(),
            ));
        }
        if request.goal_name.trim().is_empty() {
            return Err(EngineError::InvalidRequest(
                "goal name must not be empty".to_string(),
            ));
        }

        let wallet = self
            .store
            .wallet_by_number(&request.savings_wallet_number)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("wallet {}", request.savings_wallet_number))
            })?;
        if wallet.user_id != user_id {
            return Err(EngineError::Conflict(
                "savings wallet is not owned by the caller".to_string(),
            ));
        }
        if !wallet.is_active() {
            return Err(EngineError::InvalidState(format!(
                "savings wallet {} is {}",
                wallet.wallet_number, wallet.status
            )));
        }
        if wallet.currency != request.currency {
            return Err(EngineError::CurrencyMismatch {
                expected: request.currency,
                actual: wallet.currency,
            });
        }

        let goal = self
            .store
            .insert_goal(NewSavingsGoal {
                user_id,
                savings_wallet_id: wallet.wallet_id,
                goal_name: request.goal_name,
                description: request.description,
                target_amount: request.target_amount,
                currency: wallet.currency,
                target_date: request.target_date,
            })
            .await?;

        info!(goal_id = goal.goal_id, goal_name = %goal.goal_name, "Savings goal created");
        self.audit
            .record(
                "SAVINGS_GOAL",
                goal.goal_id,
                "GOAL_CREATED",
                Some(user_id),
                None,
                Some(format!("{} target {}", goal.goal_name, goal.target_amount)),
            )
            .await;

        Ok(goal)
    }

    /// Resolve the goal an incoming contribution targets: it must belong to
    /// the caller and be ACTIVE. Called before any money moves; a goal that
    /// cannot accept the contribution must reject it while the operation is
    /// still side-effect free. Existence is not disclosed to non-owners.
    pub async fn contribution_target(
        &self,
        goal_id: i64,
        user_id: i64,
    ) -> Result<SavingsGoal, EngineError> {
        let goal = self.require_goal(goal_id).await?;
        if goal.user_id != user_id {
            return Err(EngineError::NotFound(format!("savings goal {}", goal_id)));
        }
        if goal.status != GoalStatus::Active {
            return Err(EngineError::InvalidState(format!(
                "goal {} is {}",
                goal_id, goal.status
            )));
        }
        Ok(goal)
    }

    /// Mirror a completed transfer into the goal's wallet as progress.
    /// Reaching the target flips the goal to ACHIEVED.
    pub async fn contribute(
        &self,
        goal_id: i64,
        amount: Decimal,
        performed_by: Option<i64>,
    ) -> Result<SavingsGoal, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidRequest(
                "contribution must be positive".to_string(),
            ));
        }

        let goal = self.require_goal(goal_id).await?;
        if goal.status != GoalStatus::Active {
            return Err(EngineError::InvalidState(format!(
                "goal {} is {}",
                goal.goal_id, goal.status
            )));
        }

        let new_amount = goal.current_amount + amount;
        self.store.update_goal_progress(goal_id, new_amount).await?;
        self.audit
            .record(
                "SAVINGS_GOAL",
                goal_id,
                "CONTRIBUTION_MADE",
                performed_by,
                Some(goal.current_amount.to_string()),
                Some(new_amount.to_string()),
            )
            .await;

        if new_amount >= goal.target_amount {
            self.store
                .update_goal_status(goal_id, GoalStatus::Achieved)
                .await?;
            info!(goal_id, goal_name = %goal.goal_name, "Savings goal achieved");
            self.audit
                .record(
                    "SAVINGS_GOAL",
                    goal_id,
                    "GOAL_ACHIEVED",
                    performed_by,
                    Some(GoalStatus::Active.to_string()),
                    Some(GoalStatus::Achieved.to_string()),
                )
                .await;
        }

        self.require_goal(goal_id).await
    }

    pub async fn pause(&self, goal_id: i64, user_id: i64) -> Result<SavingsGoal, EngineError> {
        self.transition(goal_id, user_id, GoalStatus::Active, GoalStatus::Paused)
            .await
    }

    pub async fn resume(&self, goal_id: i64, user_id: i64) -> Result<SavingsGoal, EngineError> {
        self.transition(goal_id, user_id, GoalStatus::Paused, GoalStatus::Active)
            .await
    }

    pub async fn cancel(&self, goal_id: i64, user_id: i64) -> Result<SavingsGoal, EngineError> {
        let goal = self.owned_goal(goal_id, user_id).await?;
        if matches!(goal.status, GoalStatus::Achieved | GoalStatus::Cancelled) {
            return Err(EngineError::InvalidState(format!(
                "goal {} is {}",
                goal_id, goal.status
            )));
        }
        self.store
            .update_goal_status(goal_id, GoalStatus::Cancelled)
            .await?;
        self.audit
            .record(
                "SAVINGS_GOAL",
                goal_id,
                "GOAL_CANCELLED",
                Some(user_id),
                Some(goal.status.to_string()),
                Some(GoalStatus::Cancelled.to_string()),
            )
            .await;
        self.require_goal(goal_id).await
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<SavingsGoal>, EngineError> {
        self.store.goals_by_user(user_id).await
    }

    async fn transition(
        &self,
        goal_id: i64,
        user_id: i64,
        expected: GoalStatus,
        new: GoalStatus,
    ) -> Result<SavingsGoal, EngineError> {
        let goal = self.owned_goal(goal_id, user_id).await?;
        if goal.status != expected {
            return Err(EngineError::InvalidState(format!(
                "goal {} is {}, expected {}",
                goal_id, goal.status, expected
            )));
        }
        self.store.update_goal_status(goal_id, new).await?;
        self.audit
            .record(
                "SAVINGS_GOAL",
                goal_id,
                "GOAL_STATUS_CHANGED",
                Some(user_id),
                Some(expected.to_string()),
                Some(new.to_string()),
            )
            .await;
        self.require_goal(goal_id).await
    }

    async fn owned_goal(&self, goal_id: i64, user_id: i64) -> Result<SavingsGoal, EngineError> {
        let goal = self.require_goal(goal_id).await?;
        if goal.user_id != user_id {
            return Err(EngineError::Conflict(
                "goal is not owned by the caller".to_string(),
            ));
        }
        Ok(goal)
    }

    async fn require_goal(&self, goal_id: i64) -> Result<SavingsGoal, EngineError> {
        self.store
            .goal_by_id(goal_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("savings goal {}", goal_id)))
    }
}
