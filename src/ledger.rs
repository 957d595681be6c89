//! Double-entry ledger records
//!
//! Every completed transfer is reflected by exactly two entries: a DEBIT on
//! the source wallet and a CREDIT on the destination, both capturing the
//! wallet balance before and after. Entries are append-only; once written
//! they are never updated or deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Ledger entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum EntryType {
    Debit = 1,
    Credit = 2,
}

impl EntryType {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(EntryType::Debit),
            2 => Some(EntryType::Credit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Debit => "DEBIT",
            EntryType::Credit => "CREDIT",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable ledger entry
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub entry_id: i64,
    pub transfer_id: i64,
    pub wallet_id: i64,
    #[serde(serialize_with = "serialize_entry_type")]
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub currency: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

fn serialize_entry_type<S: serde::Serializer>(
    entry_type: &EntryType,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(entry_type.as_str())
}

/// Signed contribution of an entry to a wallet's ledger-derived balance
/// (credits add, debits subtract).
pub fn signed_amount(entry: &LedgerEntry) -> Decimal {
    match entry.entry_type {
        EntryType::Credit => entry.amount,
        EntryType::Debit => -entry.amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_roundtrip() {
        assert_eq!(EntryType::from_id(1), Some(EntryType::Debit));
        assert_eq!(EntryType::from_id(2), Some(EntryType::Credit));
        assert_eq!(EntryType::from_id(0), None);
    }

    #[test]
    fn test_signed_amount() {
        let entry = LedgerEntry {
            entry_id: 1,
            transfer_id: 1,
            wallet_id: 1,
            entry_type: EntryType::Debit,
            amount: Decimal::from(200),
            balance_before: Decimal::from(1000),
            balance_after: Decimal::from(800),
            currency: "USD".to_string(),
            description: "DEBIT for transfer TXN-ABCD1234".to_string(),
            created_at: Utc::now(),
        };
        assert_eq!(signed_amount(&entry), Decimal::from(-200));

        let credit = LedgerEntry {
            entry_type: EntryType::Credit,
            ..entry
        };
        assert_eq!(signed_amount(&credit), Decimal::from(200));
    }
}
