//! In-memory store
//!
//! Backs the test suite and the no-database demo mode. A single mutex
//! around the whole state gives the same guarantees the engine needs from
//! PostgreSQL: the debit guard is checked and applied without interleaving,
//! and `post_transfer` is one critical section.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::audit::{AuditRecord, NewAuditRecord};
use crate::error::EngineError;
use crate::ledger::{EntryType, LedgerEntry};
use crate::recurring::models::{NewRecurringTransfer, RecurringStatus, RecurringTransfer};
use crate::savings::models::{GoalStatus, NewSavingsGoal, SavingsGoal};
use crate::transfer::models::{NewTransfer, Transfer, TransferStatus};
use crate::wallet::models::{Wallet, WalletStatus};

use super::{
    AuditStore, LedgerStore, RecurringStore, SavingsStore, TransferPosting, TransferStore,
    WalletStore,
};

#[derive(Default)]
struct Inner {
    wallets: HashMap<i64, Wallet>,
    ledger: Vec<LedgerEntry>,
    transfers: HashMap<i64, Transfer>,
    recurring: HashMap<i64, RecurringTransfer>,
    goals: HashMap<i64, SavingsGoal>,
    audits: Vec<AuditRecord>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provision a wallet. Account provisioning is outside the engine, so
    /// this lives on the concrete store rather than the trait.
    pub async fn seed_wallet(
        &self,
        user_id: i64,
        wallet_number: &str,
        balance: Decimal,
        currency: &str,
        daily_limit: Decimal,
    ) -> Wallet {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let wallet = Wallet {
            wallet_id: inner.next_id(),
            user_id,
            wallet_number: wallet_number.to_string(),
            balance,
            currency: currency.to_string(),
            status: WalletStatus::Active,
            daily_limit,
            created_at: now,
            updated_at: now,
        };
        inner.wallets.insert(wallet.wallet_id, wallet.clone());
        wallet
    }

    /// Force a wallet status (test scaffolding for INACTIVE/FROZEN paths)
    pub async fn set_wallet_status(&self, wallet_id: i64, status: WalletStatus) {
        let mut inner = self.inner.lock().await;
        if let Some(wallet) = inner.wallets.get_mut(&wallet_id) {
            wallet.status = status;
            wallet.updated_at = Utc::now();
        }
    }

    /// Force a wallet balance without a ledger entry, the way drift enters
    /// a real system. Reconciliation tests use this to inject discrepancies.
    pub async fn set_wallet_balance(&self, wallet_id: i64, balance: Decimal) {
        let mut inner = self.inner.lock().await;
        if let Some(wallet) = inner.wallets.get_mut(&wallet_id) {
            wallet.balance = balance;
            wallet.updated_at = Utc::now();
        }
    }

    /// Append a raw ledger entry outside any transfer (reconciliation test
    /// scaffolding).
    pub async fn seed_ledger_entry(
        &self,
        wallet_id: i64,
        entry_type: EntryType,
        amount: Decimal,
        currency: &str,
    ) -> LedgerEntry {
        let mut inner = self.inner.lock().await;
        let entry = LedgerEntry {
            entry_id: inner.next_id(),
            transfer_id: 0,
            wallet_id,
            entry_type,
            amount,
            balance_before: Decimal::ZERO,
            balance_after: Decimal::ZERO,
            currency: currency.to_string(),
            description: format!("{} (seeded)", entry_type),
            created_at: Utc::now(),
        };
        inner.ledger.push(entry.clone());
        entry
    }

    /// Audit records written for one entity, in write order (test scaffolding)
    pub async fn audits_for(&self, entity_type: &str, entity_id: i64) -> Vec<AuditRecord> {
        self.inner
            .lock()
            .await
            .audits
            .iter()
            .filter(|a| a.entity_type == entity_type && a.entity_id == entity_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn wallet_by_id(&self, wallet_id: i64) -> Result<Option<Wallet>, EngineError> {
        Ok(self.inner.lock().await.wallets.get(&wallet_id).cloned())
    }

    async fn wallet_by_number(&self, wallet_number: &str) -> Result<Option<Wallet>, EngineError> {
        Ok(self
            .inner
            .lock()
            .await
            .wallets
            .values()
            .find(|w| w.wallet_number == wallet_number)
            .cloned())
    }

    async fn active_wallet_by_id(&self, wallet_id: i64) -> Result<Option<Wallet>, EngineError> {
        Ok(self
            .inner
            .lock()
            .await
            .wallets
            .get(&wallet_id)
            .filter(|w| w.is_active())
            .cloned())
    }

    async fn active_wallets_by_user(&self, user_id: i64) -> Result<Vec<Wallet>, EngineError> {
        let inner = self.inner.lock().await;
        let mut wallets: Vec<Wallet> = inner
            .wallets
            .values()
            .filter(|w| w.user_id == user_id && w.is_active())
            .cloned()
            .collect();
        wallets.sort_by_key(|w| w.wallet_id);
        Ok(wallets)
    }

    async fn all_wallets(&self) -> Result<Vec<Wallet>, EngineError> {
        let inner = self.inner.lock().await;
        let mut wallets: Vec<Wallet> = inner.wallets.values().cloned().collect();
        wallets.sort_by_key(|w| w.wallet_id);
        Ok(wallets)
    }

    async fn credit_wallet(&self, wallet_id: i64, amount: Decimal) -> Result<u64, EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.wallets.get_mut(&wallet_id) {
            Some(wallet) => {
                wallet.balance += amount;
                wallet.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn debit_wallet(&self, wallet_id: i64, amount: Decimal) -> Result<u64, EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.wallets.get_mut(&wallet_id) {
            Some(wallet) if wallet.balance >= amount => {
                wallet.balance -= amount;
                wallet.updated_at = Utc::now();
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn ledger_balance(&self, wallet_id: i64) -> Result<Decimal, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .ledger
            .iter()
            .filter(|e| e.wallet_id == wallet_id)
            .map(crate::ledger::signed_amount)
            .sum())
    }

    async fn entries_for_wallet(&self, wallet_id: i64) -> Result<Vec<LedgerEntry>, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .ledger
            .iter()
            .filter(|e| e.wallet_id == wallet_id)
            .cloned()
            .collect())
    }

    async fn entries_for_transfer(
        &self,
        transfer_id: i64,
    ) -> Result<Vec<LedgerEntry>, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .ledger
            .iter()
            .filter(|e| e.transfer_id == transfer_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransferStore for MemoryStore {
    async fn insert_transfer(&self, new: NewTransfer) -> Result<Transfer, EngineError> {
        let mut inner = self.inner.lock().await;
        let transfer = Transfer {
            transfer_id: inner.next_id(),
            transfer_reference: new.transfer_reference,
            source_wallet_id: new.source_wallet_id,
            destination_wallet_id: new.destination_wallet_id,
            amount: new.amount,
            currency: new.currency,
            status: TransferStatus::Pending,
            description: new.description,
            initiated_by: new.initiated_by,
            created_at: Utc::now(),
            completed_at: None,
        };
        inner.transfers.insert(transfer.transfer_id, transfer.clone());
        Ok(transfer)
    }

    async fn transfer_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transfer>, EngineError> {
        Ok(self
            .inner
            .lock()
            .await
            .transfers
            .values()
            .find(|t| t.transfer_reference == reference)
            .cloned())
    }

    async fn update_transfer_status(
        &self,
        transfer_id: i64,
        expected: TransferStatus,
        new: TransferStatus,
    ) -> Result<bool, EngineError> {
        let mut inner = self.inner.lock().await;
        match inner.transfers.get_mut(&transfer_id) {
            Some(transfer) if transfer.status == expected => {
                transfer.status = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_transfer_failed(
        &self,
        transfer_id: i64,
        reason: &str,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        if let Some(transfer) = inner.transfers.get_mut(&transfer_id)
            && !transfer.status.is_terminal()
        {
            transfer.status = TransferStatus::Failed;
            let suffix = format!("Failure reason: {}", reason);
            transfer.description = Some(match transfer.description.take() {
                Some(description) => format!("{} | {}", description, suffix),
                None => suffix,
            });
        }
        Ok(())
    }

    async fn completed_debit_total(
        &self,
        source_wallet_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Decimal, EngineError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .transfers
            .values()
            .filter(|t| {
                t.source_wallet_id == source_wallet_id
                    && t.status == TransferStatus::Completed
                    && t.created_at >= from
                    && t.created_at < to
            })
            .map(|t| t.amount)
            .sum())
    }

    async fn post_transfer(&self, transfer: &Transfer) -> Result<TransferPosting, EngineError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();

        // Every row the posting touches is validated before any mutation;
        // an error return must leave no visible side effects.
        if !inner.wallets.contains_key(&transfer.destination_wallet_id) {
            return Err(EngineError::NotFound(format!(
                "wallet {}",
                transfer.destination_wallet_id
            )));
        }
        if !inner.transfers.contains_key(&transfer.transfer_id) {
            return Err(EngineError::NotFound(format!(
                "transfer {}",
                transfer.transfer_id
            )));
        }

        // Conditional debit; when the guard fails no state is touched.
        let (source_before, source_after) =
            match inner.wallets.get_mut(&transfer.source_wallet_id) {
                Some(wallet) if wallet.balance >= transfer.amount => {
                    let before = wallet.balance;
                    wallet.balance -= transfer.amount;
                    wallet.updated_at = now;
                    (before, wallet.balance)
                }
                Some(wallet) => {
                    return Err(EngineError::InsufficientBalance(
                        wallet.wallet_number.clone(),
                    ));
                }
                None => {
                    return Err(EngineError::NotFound(format!(
                        "wallet {}",
                        transfer.source_wallet_id
                    )));
                }
            };

        let (destination_before, destination_after) =
            match inner.wallets.get_mut(&transfer.destination_wallet_id) {
                Some(wallet) => {
                    let before = wallet.balance;
                    wallet.balance += transfer.amount;
                    wallet.updated_at = now;
                    (before, wallet.balance)
                }
                None => {
                    return Err(EngineError::NotFound(format!(
                        "wallet {}",
                        transfer.destination_wallet_id
                    )));
                }
            };

        let debit_id = inner.next_id();
        inner.ledger.push(LedgerEntry {
            entry_id: debit_id,
            transfer_id: transfer.transfer_id,
            wallet_id: transfer.source_wallet_id,
            entry_type: EntryType::Debit,
            amount: transfer.amount,
            balance_before: source_before,
            balance_after: source_after,
            currency: transfer.currency.clone(),
            description: format!("DEBIT for transfer {}", transfer.transfer_reference),
            created_at: now,
        });

        let credit_id = inner.next_id();
        inner.ledger.push(LedgerEntry {
            entry_id: credit_id,
            transfer_id: transfer.transfer_id,
            wallet_id: transfer.destination_wallet_id,
            entry_type: EntryType::Credit,
            amount: transfer.amount,
            balance_before: destination_before,
            balance_after: destination_after,
            currency: transfer.currency.clone(),
            description: format!("CREDIT for transfer {}", transfer.transfer_reference),
            created_at: now,
        });

        let completed = match inner.transfers.get_mut(&transfer.transfer_id) {
            Some(record) => {
                record.status = TransferStatus::Completed;
                record.completed_at = Some(now);
                record.clone()
            }
            None => {
                return Err(EngineError::NotFound(format!(
                    "transfer {}",
                    transfer.transfer_id
                )));
            }
        };

        Ok(TransferPosting {
            transfer: completed,
            source_balance_before: source_before,
            source_balance_after: source_after,
            destination_balance_before: destination_before,
            destination_balance_after: destination_after,
        })
    }
}

#[async_trait]
impl RecurringStore for MemoryStore {
    async fn insert_recurring(
        &self,
        new: NewRecurringTransfer,
    ) -> Result<RecurringTransfer, EngineError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let recurring = RecurringTransfer {
            recurring_id: inner.next_id(),
            user_id: new.user_id,
            source_wallet_id: new.source_wallet_id,
            destination_wallet_id: new.destination_wallet_id,
            savings_goal_id: new.savings_goal_id,
            amount: new.amount,
            currency: new.currency,
            frequency: new.frequency,
            day_of_week: new.day_of_week,
            day_of_month: new.day_of_month,
            execution_time: new.execution_time,
            start_date: new.start_date,
            end_date: new.end_date,
            next_execution_date: new.next_execution_date,
            last_executed_at: None,
            status: RecurringStatus::Active,
            execution_count: 0,
            max_executions: new.max_executions,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        inner
            .recurring
            .insert(recurring.recurring_id, recurring.clone());
        Ok(recurring)
    }

    async fn recurring_by_id(
        &self,
        recurring_id: i64,
    ) -> Result<Option<RecurringTransfer>, EngineError> {
        Ok(self.inner.lock().await.recurring.get(&recurring_id).cloned())
    }

    async fn recurring_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<RecurringTransfer>, EngineError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<RecurringTransfer> = inner
            .recurring
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.recurring_id);
        Ok(rows)
    }

    async fn due_recurring(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<RecurringTransfer>, EngineError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<RecurringTransfer> = inner
            .recurring
            .values()
            .filter(|r| r.status == RecurringStatus::Active && r.next_execution_date <= today)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.next_execution_date, r.recurring_id));
        Ok(rows)
    }

    async fn update_recurring_after_execution(
        &self,
        recurring_id: i64,
        next_execution_date: NaiveDate,
        executed_at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        if let Some(recurring) = inner.recurring.get_mut(&recurring_id) {
            recurring.next_execution_date = next_execution_date;
            recurring.last_executed_at = Some(executed_at);
            recurring.execution_count += 1;
            recurring.updated_at = executed_at;
        }
        Ok(())
    }

    async fn update_recurring_status(
        &self,
        recurring_id: i64,
        status: RecurringStatus,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        if let Some(recurring) = inner.recurring.get_mut(&recurring_id) {
            recurring.status = status;
            recurring.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl SavingsStore for MemoryStore {
    async fn insert_goal(&self, new: NewSavingsGoal) -> Result<SavingsGoal, EngineError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let goal = SavingsGoal {
            goal_id: inner.next_id(),
            user_id: new.user_id,
            savings_wallet_id: new.savings_wallet_id,
            goal_name: new.goal_name,
            description: new.description,
            target_amount: new.target_amount,
            current_amount: Decimal::ZERO,
            currency: new.currency,
            target_date: new.target_date,
            status: GoalStatus::Active,
            created_at: now,
            updated_at: now,
        };
        inner.goals.insert(goal.goal_id, goal.clone());
        Ok(goal)
    }

    async fn goal_by_id(&self, goal_id: i64) -> Result<Option<SavingsGoal>, EngineError> {
        Ok(self.inner.lock().await.goals.get(&goal_id).cloned())
    }

    async fn goals_by_user(&self, user_id: i64) -> Result<Vec<SavingsGoal>, EngineError> {
        let inner = self.inner.lock().await;
        let mut goals: Vec<SavingsGoal> = inner
            .goals
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        goals.sort_by_key(|g| g.goal_id);
        Ok(goals)
    }

    async fn update_goal_progress(
        &self,
        goal_id: i64,
        current_amount: Decimal,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        if let Some(goal) = inner.goals.get_mut(&goal_id) {
            goal.current_amount = current_amount;
            goal.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_goal_status(
        &self,
        goal_id: i64,
        status: GoalStatus,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        if let Some(goal) = inner.goals.get_mut(&goal_id) {
            goal.status = status;
            goal.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn insert_audit(&self, record: NewAuditRecord) -> Result<(), EngineError> {
        let mut inner = self.inner.lock().await;
        let audit = AuditRecord {
            audit_id: inner.next_id(),
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            action: record.action,
            performed_by: record.performed_by,
            old_value: record.old_value,
            new_value: record.new_value,
            created_at: Utc::now(),
        };
        inner.audits.push(audit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_conditional_debit_guard() {
        let store = MemoryStore::new();
        let wallet = store
            .seed_wallet(1001, "WAL-001", dec("100"), "USD", dec("1000"))
            .await;

        assert_eq!(store.debit_wallet(wallet.wallet_id, dec("60")).await.unwrap(), 1);
        // Guard fails: 40 remaining, 60 requested
        assert_eq!(store.debit_wallet(wallet.wallet_id, dec("60")).await.unwrap(), 0);

        let wallet = store.wallet_by_id(wallet.wallet_id).await.unwrap().unwrap();
        assert_eq!(wallet.balance, dec("40"));
    }

    #[tokio::test]
    async fn test_debit_missing_wallet() {
        let store = MemoryStore::new();
        assert_eq!(store.debit_wallet(42, dec("1")).await.unwrap(), 0);
        assert_eq!(store.credit_wallet(42, dec("1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transfer_status_cas() {
        let store = MemoryStore::new();
        let transfer = store
            .insert_transfer(NewTransfer {
                transfer_reference: "TXN-00000001".to_string(),
                source_wallet_id: 1,
                destination_wallet_id: 2,
                amount: dec("10"),
                currency: "USD".to_string(),
                description: None,
                initiated_by: 1001,
            })
            .await
            .unwrap();

        assert!(
            store
                .update_transfer_status(
                    transfer.transfer_id,
                    TransferStatus::Pending,
                    TransferStatus::Processing
                )
                .await
                .unwrap()
        );
        // Second CAS from PENDING must lose
        assert!(
            !store
                .update_transfer_status(
                    transfer.transfer_id,
                    TransferStatus::Pending,
                    TransferStatus::Processing
                )
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_posting_to_missing_destination_leaves_source_untouched() {
        let store = MemoryStore::new();
        let source = store
            .seed_wallet(1001, "WAL-001", dec("100"), "USD", dec("1000"))
            .await;

        let transfer = store
            .insert_transfer(NewTransfer {
                transfer_reference: "TXN-00000003".to_string(),
                source_wallet_id: source.wallet_id,
                destination_wallet_id: 999,
                amount: dec("60"),
                currency: "USD".to_string(),
                description: None,
                initiated_by: 1001,
            })
            .await
            .unwrap();

        let err = store.post_transfer(&transfer).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));

        let source = store.wallet_by_id(source.wallet_id).await.unwrap().unwrap();
        assert_eq!(source.balance, dec("100"));
        assert!(
            store
                .entries_for_transfer(transfer.transfer_id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_failed_posting_leaves_no_side_effects() {
        let store = MemoryStore::new();
        let source = store
            .seed_wallet(1001, "WAL-001", dec("50"), "USD", dec("1000"))
            .await;
        let destination = store
            .seed_wallet(1002, "WAL-002", dec("0"), "USD", dec("1000"))
            .await;

        let transfer = store
            .insert_transfer(NewTransfer {
                transfer_reference: "TXN-00000002".to_string(),
                source_wallet_id: source.wallet_id,
                destination_wallet_id: destination.wallet_id,
                amount: dec("80"),
                currency: "USD".to_string(),
                description: None,
                initiated_by: 1001,
            })
            .await
            .unwrap();

        let err = store.post_transfer(&transfer).await.unwrap_err();
        assert!(matches!(err, EngineError::InsufficientBalance(_)));

        // Nothing moved, nothing written
        assert_eq!(
            store.wallet_by_id(source.wallet_id).await.unwrap().unwrap().balance,
            dec("50")
        );
        assert!(
            store
                .entries_for_transfer(transfer.transfer_id)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
