//! Reconciliation engine
//!
//! Compares each wallet's stored balance against the balance derived from
//! its ledger entries (credits minus debits). The two agree on a healthy
//! system; any difference is reported as a discrepancy, never corrected.
//! Reconciliation only reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::audit::AuditTrail;
use crate::error::EngineError;
use crate::store::{LedgerStore, Store, WalletStore};
use crate::wallet::models::Wallet;

/// Outcome of a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconciliationStatus {
    Success,
    DiscrepanciesFound,
}

impl ReconciliationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationStatus::Success => "SUCCESS",
            ReconciliationStatus::DiscrepanciesFound => "DISCREPANCIES_FOUND",
        }
    }
}

/// One wallet whose stored balance disagrees with its ledger
#[derive(Debug, Clone, Serialize)]
pub struct Discrepancy {
    pub wallet_id: i64,
    pub wallet_number: String,
    pub stored_balance: Decimal,
    pub ledger_balance: Decimal,
    /// stored minus derived; positive means the wallet shows more money
    /// than the ledger accounts for
    pub difference: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    /// Run identifier: milliseconds since the Unix epoch at run start
    pub report_id: i64,
    pub executed_at: DateTime<Utc>,
    pub wallets_checked: usize,
    pub total_stored_balance: Decimal,
    pub total_ledger_balance: Decimal,
    pub discrepancies: Vec<Discrepancy>,
    pub status: ReconciliationStatus,
    pub summary: String,
}

#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn Store>,
    audit: AuditTrail,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn Store>, audit: AuditTrail) -> Self {
        Self { store, audit }
    }

    /// Reconcile every wallet in the system.
    pub async fn run_full(&self) -> Result<ReconciliationReport, EngineError> {
        let wallets = self.store.all_wallets().await?;
        self.run(wallets).await
    }

    /// Reconcile one wallet by its public number.
    pub async fn run_single(
        &self,
        wallet_number: &str,
    ) -> Result<ReconciliationReport, EngineError> {
        let wallet = self
            .store
            .wallet_by_number(wallet_number)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("wallet {}", wallet_number)))?;
        self.run(vec![wallet]).await
    }

    async fn run(&self, wallets: Vec<Wallet>) -> Result<ReconciliationReport, EngineError> {
        let executed_at = Utc::now();
        let report_id = executed_at.timestamp_millis();

        let wallets_checked = wallets.len();
        let mut total_stored_balance = Decimal::ZERO;
        let mut total_ledger_balance = Decimal::ZERO;
        let mut discrepancies = Vec::new();

        for wallet in &wallets {
            let ledger_balance = self.store.ledger_balance(wallet.wallet_id).await?;
            total_stored_balance += wallet.balance;
            total_ledger_balance += ledger_balance;

            let difference = wallet.balance - ledger_balance;
            if difference != Decimal::ZERO {
                warn!(
                    wallet_number = %wallet.wallet_number,
                    stored = %wallet.balance,
                    derived = %ledger_balance,
                    "Balance discrepancy detected"
                );
                discrepancies.push(Discrepancy {
                    wallet_id: wallet.wallet_id,
                    wallet_number: wallet.wallet_number.clone(),
                    stored_balance: wallet.balance,
                    ledger_balance,
                    difference,
                });
            }
        }

        let status = if discrepancies.is_empty() {
            ReconciliationStatus::Success
        } else {
            ReconciliationStatus::DiscrepanciesFound
        };
        let summary = format!(
            "Checked {} wallets, found {} discrepancies",
            wallets_checked,
            discrepancies.len()
        );

        info!(report_id, status = status.as_str(), %summary, "Reconciliation run finished");
        self.audit
            .record(
                "RECONCILIATION",
                report_id,
                "RECONCILIATION_RUN",
                None,
                None,
                Some(summary.clone()),
            )
            .await;

        Ok(ReconciliationReport {
            report_id,
            executed_at,
            wallets_checked,
            total_stored_balance,
            total_ledger_balance,
            discrepancies,
            status,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::EntryType;
    use crate::store::MemoryStore;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn engine(store: Arc<MemoryStore>) -> ReconciliationEngine {
        let store: Arc<dyn Store> = store;
        ReconciliationEngine::new(store.clone(), AuditTrail::new(store))
    }

    #[tokio::test]
    async fn test_consistent_wallet_reconciles_clean() {
        let store = Arc::new(MemoryStore::new());
        let wallet = store
            .seed_wallet(1001, "WAL-001", dec("500"), "USD", dec("10000"))
            .await;
        store
            .seed_ledger_entry(wallet.wallet_id, EntryType::Credit, dec("700"), "USD")
            .await;
        store
            .seed_ledger_entry(wallet.wallet_id, EntryType::Debit, dec("200"), "USD")
            .await;

        let report = engine(store).run_full().await.unwrap();
        assert_eq!(report.status, ReconciliationStatus::Success);
        assert!(report.discrepancies.is_empty());
        assert_eq!(report.total_stored_balance, dec("500"));
        assert_eq!(report.total_ledger_balance, dec("500"));
    }

    #[tokio::test]
    async fn test_drift_is_reported_not_corrected() {
        let store = Arc::new(MemoryStore::new());
        let wallet = store
            .seed_wallet(1001, "WAL-001", dec("500"), "USD", dec("10000"))
            .await;
        // Ledger only accounts for 480
        store
            .seed_ledger_entry(wallet.wallet_id, EntryType::Credit, dec("480"), "USD")
            .await;

        let report = engine(store.clone()).run_full().await.unwrap();
        assert_eq!(report.status, ReconciliationStatus::DiscrepanciesFound);
        assert_eq!(report.discrepancies.len(), 1);
        assert_eq!(report.discrepancies[0].difference, dec("20"));
        assert_eq!(report.summary, "Checked 1 wallets, found 1 discrepancies");

        // Stored balance untouched
        let wallet = store.wallet_by_id(wallet.wallet_id).await.unwrap().unwrap();
        assert_eq!(wallet.balance, dec("500"));
    }

    #[tokio::test]
    async fn test_empty_ledger_derives_to_zero() {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_wallet(1001, "WAL-001", dec("0"), "USD", dec("10000"))
            .await;

        let report = engine(store).run_single("WAL-001").await.unwrap();
        assert_eq!(report.status, ReconciliationStatus::Success);
        assert_eq!(report.wallets_checked, 1);
    }

    #[tokio::test]
    async fn test_single_unknown_wallet() {
        let store = Arc::new(MemoryStore::new());
        let err = engine(store).run_single("WAL-NOPE").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}
