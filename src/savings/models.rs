//! Savings goal types
//!
//! Savings goals are bookkeeping on top of the transfer engine: a completed
//! transfer into the goal's wallet can be mirrored as a contribution. The
//! goal itself never moves money.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Savings goal lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum GoalStatus {
    Active = 1,
    Paused = 2,
    /// Current amount reached the target
    Achieved = 3,
    Cancelled = 4,
}

impl GoalStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(GoalStatus::Active),
            2 => Some(GoalStatus::Paused),
            3 => Some(GoalStatus::Achieved),
            4 => Some(GoalStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "ACTIVE",
            GoalStatus::Paused => "PAUSED",
            GoalStatus::Achieved => "ACHIEVED",
            GoalStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A savings goal
#[derive(Debug, Clone)]
pub struct SavingsGoal {
    pub goal_id: i64,
    pub user_id: i64,
    pub savings_wallet_id: i64,
    pub goal_name: String,
    pub description: Option<String>,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub currency: String,
    pub target_date: NaiveDate,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New savings goal awaiting insertion (status starts ACTIVE, amount zero)
#[derive(Debug, Clone)]
pub struct NewSavingsGoal {
    pub user_id: i64,
    pub savings_wallet_id: i64,
    pub goal_name: String,
    pub description: Option<String>,
    pub target_amount: Decimal,
    pub currency: String,
    pub target_date: NaiveDate,
}

/// Create-goal request as the service consumes it
#[derive(Debug, Clone)]
pub struct SavingsGoalRequest {
    pub savings_wallet_number: String,
    pub goal_name: String,
    pub description: Option<String>,
    pub target_amount: Decimal,
    pub currency: String,
    pub target_date: NaiveDate,
}

/// Caller-facing goal view with computed progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoalResponse {
    pub goal_id: i64,
    pub goal_name: String,
    pub description: Option<String>,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub currency: String,
    pub target_date: NaiveDate,
    pub status: String,
    pub progress_percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&SavingsGoal> for SavingsGoalResponse {
    fn from(goal: &SavingsGoal) -> Self {
        let progress_percentage = if goal.target_amount > Decimal::ZERO {
            (goal.current_amount / goal.target_amount * Decimal::from(100)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Self {
            goal_id: goal.goal_id,
            goal_name: goal.goal_name.clone(),
            description: goal.description.clone(),
            target_amount: goal.target_amount,
            current_amount: goal.current_amount,
            currency: goal.currency.clone(),
            target_date: goal.target_date,
            status: goal.status.to_string(),
            progress_percentage,
            created_at: goal.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_id_roundtrip() {
        for status in [
            GoalStatus::Active,
            GoalStatus::Paused,
            GoalStatus::Achieved,
            GoalStatus::Cancelled,
        ] {
            assert_eq!(GoalStatus::from_id(status.id()), Some(status));
        }
        assert!(GoalStatus::from_id(0).is_none());
    }

    #[test]
    fn test_progress_percentage() {
        let goal = SavingsGoal {
            goal_id: 1,
            user_id: 1001,
            savings_wallet_id: 2,
            goal_name: "Vacation".to_string(),
            description: None,
            target_amount: Decimal::from(3000),
            current_amount: Decimal::from_str("750.50").unwrap(),
            currency: "USD".to_string(),
            target_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            status: GoalStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response = SavingsGoalResponse::from(&goal);
        assert_eq!(
            response.progress_percentage,
            Decimal::from_str("25.02").unwrap()
        );
    }

    #[test]
    fn test_progress_with_zero_target() {
        let goal = SavingsGoal {
            goal_id: 1,
            user_id: 1001,
            savings_wallet_id: 2,
            goal_name: "Empty".to_string(),
            description: None,
            target_amount: Decimal::ZERO,
            current_amount: Decimal::ZERO,
            currency: "USD".to_string(),
            target_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            status: GoalStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(
            SavingsGoalResponse::from(&goal).progress_percentage,
            Decimal::ZERO
        );
    }
}
