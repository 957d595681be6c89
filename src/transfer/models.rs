//! Transfer state machine types
//!
//! A transfer moves through `PENDING -> PROCESSING -> COMPLETED`, or
//! `PROCESSING -> FAILED`. Terminal records are never mutated again.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transfer FSM states
///
/// State IDs are stored as SMALLINT. Terminal states: COMPLETED (20),
/// FAILED (-10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum TransferStatus {
    /// Request validated and recorded
    Pending = 0,

    /// Posting in progress (debit/credit sequence running)
    Processing = 10,

    /// Terminal: both ledger entries written, balances moved
    Completed = 20,

    /// Terminal: posting failed, no balance movement committed
    Failed = -10,
}

impl TransferStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed)
    }

    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TransferStatus::Pending),
            10 => Some(TransferStatus::Processing),
            20 => Some(TransferStatus::Completed),
            -10 => Some(TransferStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::Processing => "PROCESSING",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for TransferStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        TransferStatus::from_id(value).ok_or(())
    }
}

/// A transfer record
#[derive(Debug, Clone)]
pub struct Transfer {
    pub transfer_id: i64,
    /// Globally unique human-legible reference, e.g. "TXN-3F2A9C1B"
    pub transfer_reference: String,
    pub source_wallet_id: i64,
    pub destination_wallet_id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub status: TransferStatus,
    pub description: Option<String>,
    pub initiated_by: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// New transfer awaiting insertion (status starts at PENDING)
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub transfer_reference: String,
    pub source_wallet_id: i64,
    pub destination_wallet_id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
    pub initiated_by: i64,
}

/// Generate a transfer reference: "TXN-" + 8 uppercase hex characters drawn
/// from a random 128-bit value. Collision probability is negligible at the
/// volumes this system handles.
pub fn new_transfer_reference() -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("TXN-{}", token[..8].to_uppercase())
}

/// Transfer request as the engine consumes it (amounts already parsed to
/// fixed-point decimal)
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub source_wallet_number: String,
    pub destination_wallet_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub description: Option<String>,
}

/// Caller-facing transfer view
///
/// Wallet numbers are masked; the caller already knows its own and has no
/// business learning the counterparty's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub transfer_reference: String,
    pub source_wallet_number: String,
    pub destination_wallet_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub description: Option<String>,
    pub initiated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub message: String,
}

impl From<&Transfer> for TransferResponse {
    fn from(transfer: &Transfer) -> Self {
        Self {
            transfer_reference: transfer.transfer_reference.clone(),
            source_wallet_number: "****".to_string(),
            destination_wallet_number: "****".to_string(),
            amount: transfer.amount,
            currency: transfer.currency.clone(),
            status: transfer.status.to_string(),
            description: transfer.description.clone(),
            initiated_at: transfer.created_at,
            completed_at: transfer.completed_at,
            message: format!("Transfer {}", transfer.status.as_str().to_lowercase()),
        }
    }
}
