//! Wallet model
//!
//! Wallets hold a balance in a single currency. Balances are only ever
//! mutated through the store's conditional credit/debit primitives.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Wallet lifecycle status
///
/// Status IDs are stored as SMALLINT. Wallets are never deleted; a closed
/// wallet keeps its ledger history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum WalletStatus {
    Inactive = 0,
    Active = 1,
    Frozen = 2,
    Closed = 3,
}

impl WalletStatus {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(WalletStatus::Inactive),
            1 => Some(WalletStatus::Active),
            2 => Some(WalletStatus::Frozen),
            3 => Some(WalletStatus::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletStatus::Inactive => "INACTIVE",
            WalletStatus::Active => "ACTIVE",
            WalletStatus::Frozen => "FROZEN",
            WalletStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for WalletStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        WalletStatus::from_id(value).ok_or(())
    }
}

/// A wallet account
#[derive(Debug, Clone)]
pub struct Wallet {
    pub wallet_id: i64,
    pub user_id: i64,
    /// Unique human-readable number, e.g. "WAL-10000001"
    pub wallet_number: String,
    /// Current balance; non-negative invariant enforced by the debit guard
    pub balance: Decimal,
    pub currency: String,
    pub status: WalletStatus,
    /// Maximum completed debit volume per UTC calendar day
    pub daily_limit: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }
}

/// Balance query response
#[derive(Debug, Clone, Serialize)]
pub struct WalletBalanceResponse {
    pub wallet_id: i64,
    pub wallet_number: String,
    pub balance: Decimal,
    pub currency: String,
    pub status: String,
    pub daily_limit: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl From<&Wallet> for WalletBalanceResponse {
    fn from(wallet: &Wallet) -> Self {
        Self {
            wallet_id: wallet.wallet_id,
            wallet_number: wallet.wallet_number.clone(),
            balance: wallet.balance,
            currency: wallet.currency.clone(),
            status: wallet.status.to_string(),
            daily_limit: wallet.daily_limit,
            last_updated: wallet.updated_at,
        }
    }
}
