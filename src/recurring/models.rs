//! Recurring transfer types

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recurring transfer frequency
///
/// Stored as TEXT; parsed back with `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    /// Anchored to a day of week (1 = Monday .. 7 = Sunday)
    Weekly,
    /// Weekly anchor, firing every other occurrence
    Biweekly,
    /// Anchored to a day of month, clamped to the month's length
    Monthly,
    /// Fixed three-month stride; day of month clamped to 28
    Quarterly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Biweekly => "BIWEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Quarterly => "QUARTERLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "BIWEEKLY" => Ok(Frequency::Biweekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "QUARTERLY" => Ok(Frequency::Quarterly),
            _ => Err(()),
        }
    }
}

/// Recurring transfer lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum RecurringStatus {
    Active = 1,
    Paused = 2,
    /// Terminal: end date or max executions reached
    Completed = 3,
    /// Terminal: cancelled by the owner
    Cancelled = 4,
    /// A firing failed; requires a manual resume, no automatic retry
    Failed = -1,
}

impl RecurringStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(RecurringStatus::Active),
            2 => Some(RecurringStatus::Paused),
            3 => Some(RecurringStatus::Completed),
            4 => Some(RecurringStatus::Cancelled),
            -1 => Some(RecurringStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringStatus::Active => "ACTIVE",
            RecurringStatus::Paused => "PAUSED",
            RecurringStatus::Completed => "COMPLETED",
            RecurringStatus::Cancelled => "CANCELLED",
            RecurringStatus::Failed => "FAILED",
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecurringStatus::Completed | RecurringStatus::Cancelled)
    }
}

impl fmt::Display for RecurringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A standing transfer instruction
#[derive(Debug, Clone)]
pub struct RecurringTransfer {
    pub recurring_id: i64,
    pub user_id: i64,
    pub source_wallet_id: i64,
    pub destination_wallet_id: i64,
    /// Optional linked savings goal; contributions mirror each firing
    pub savings_goal_id: Option<i64>,
    pub amount: Decimal,
    pub currency: String,
    pub frequency: Frequency,
    pub day_of_week: Option<u32>,
    pub day_of_month: Option<u32>,
    pub execution_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_execution_date: NaiveDate,
    pub last_executed_at: Option<DateTime<Utc>>,
    pub status: RecurringStatus,
    pub execution_count: i32,
    pub max_executions: Option<i32>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New recurring transfer awaiting insertion (status starts ACTIVE)
#[derive(Debug, Clone)]
pub struct NewRecurringTransfer {
    pub user_id: i64,
    pub source_wallet_id: i64,
    pub destination_wallet_id: i64,
    pub savings_goal_id: Option<i64>,
    pub amount: Decimal,
    pub currency: String,
    pub frequency: Frequency,
    pub day_of_week: Option<u32>,
    pub day_of_month: Option<u32>,
    pub execution_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_execution_date: NaiveDate,
    pub max_executions: Option<i32>,
    pub description: Option<String>,
}

/// Create-recurring request as the service consumes it
#[derive(Debug, Clone)]
pub struct RecurringTransferRequest {
    pub source_wallet_number: String,
    pub destination_wallet_number: String,
    pub savings_goal_id: Option<i64>,
    pub amount: Decimal,
    pub currency: String,
    pub frequency: Frequency,
    pub day_of_week: Option<u32>,
    pub day_of_month: Option<u32>,
    pub execution_time: Option<NaiveTime>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub max_executions: Option<i32>,
    pub description: Option<String>,
}

/// Caller-facing recurring transfer view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTransferResponse {
    pub recurring_id: i64,
    pub source_wallet_number: String,
    pub destination_wallet_number: String,
    pub savings_goal_id: Option<i64>,
    pub savings_goal_name: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub frequency: String,
    pub day_of_week: Option<u32>,
    pub day_of_month: Option<u32>,
    pub execution_time: NaiveTime,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_execution_date: NaiveDate,
    pub last_executed_at: Option<DateTime<Utc>>,
    pub status: String,
    pub execution_count: i32,
    pub max_executions: Option<i32>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
