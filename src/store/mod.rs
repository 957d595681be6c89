//! Abstract transactional store
//!
//! The engine is written against these traits rather than a database
//! product. Two implementations ship:
//!
//! - [`PgStore`]: PostgreSQL via sqlx, the production store;
//! - [`MemoryStore`]: a single-mutex in-memory store for tests and the
//!   no-database demo mode.
//!
//! Both provide the same two guarantees the engine relies on:
//!
//! 1. `debit_wallet` is a single atomic conditional update; the balance
//!    guard and the subtraction cannot be interleaved with another debit;
//! 2. `post_transfer` executes the whole posting sequence (debit source,
//!    append DEBIT entry, credit destination, append CREDIT entry, mark
//!    COMPLETED) as one atomic unit. Either all five effects become
//!    visible or none do.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::audit::NewAuditRecord;
use crate::error::EngineError;
use crate::ledger::LedgerEntry;
use crate::recurring::models::{NewRecurringTransfer, RecurringStatus, RecurringTransfer};
use crate::savings::models::{GoalStatus, NewSavingsGoal, SavingsGoal};
use crate::transfer::models::{NewTransfer, Transfer, TransferStatus};
use crate::wallet::models::Wallet;

/// Result of the atomic posting unit
#[derive(Debug, Clone)]
pub struct TransferPosting {
    /// The transfer record after posting (status COMPLETED, completion stamped)
    pub transfer: Transfer,
    pub source_balance_before: Decimal,
    pub source_balance_after: Decimal,
    pub destination_balance_before: Decimal,
    pub destination_balance_after: Decimal,
}

/// Wallet reads and the conditional mutation primitives
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn wallet_by_id(&self, wallet_id: i64) -> Result<Option<Wallet>, EngineError>;

    async fn wallet_by_number(&self, wallet_number: &str) -> Result<Option<Wallet>, EngineError>;

    /// Wallet by id, restricted to ACTIVE status
    async fn active_wallet_by_id(&self, wallet_id: i64) -> Result<Option<Wallet>, EngineError>;

    /// All ACTIVE wallets owned by a user
    async fn active_wallets_by_user(&self, user_id: i64) -> Result<Vec<Wallet>, EngineError>;

    /// Every wallet regardless of status (reconciliation scan)
    async fn all_wallets(&self) -> Result<Vec<Wallet>, EngineError>;

    /// Unconditionally add `amount` to the balance; stamps `updated_at`.
    /// Returns affected row count (0 only when the wallet is missing).
    async fn credit_wallet(&self, wallet_id: i64, amount: Decimal) -> Result<u64, EngineError>;

    /// Subtract `amount` only if `balance >= amount`, as a single atomic
    /// conditional update. Returns 0 affected rows when the guard fails;
    /// that is the insufficient-balance signal, and it is authoritative
    /// over any application-level pre-check.
    async fn debit_wallet(&self, wallet_id: i64, amount: Decimal) -> Result<u64, EngineError>;
}

/// Append-only ledger reads (appends happen inside `post_transfer`)
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Ledger-derived balance: sum of credits minus sum of debits.
    /// An empty ledger derives to zero.
    async fn ledger_balance(&self, wallet_id: i64) -> Result<Decimal, EngineError>;

    async fn entries_for_wallet(&self, wallet_id: i64) -> Result<Vec<LedgerEntry>, EngineError>;

    async fn entries_for_transfer(
        &self,
        transfer_id: i64,
    ) -> Result<Vec<LedgerEntry>, EngineError>;
}

/// Transfer records and the atomic posting unit
#[async_trait]
pub trait TransferStore: Send + Sync {
    async fn insert_transfer(&self, new: NewTransfer) -> Result<Transfer, EngineError>;

    async fn transfer_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transfer>, EngineError>;

    /// CAS status update: succeeds only when the current status matches
    /// `expected`. Returns false when another actor already moved it.
    async fn update_transfer_status(
        &self,
        transfer_id: i64,
        expected: TransferStatus,
        new: TransferStatus,
    ) -> Result<bool, EngineError>;

    /// Terminal FAILED transition; appends the reason to the description.
    /// No-op when the transfer is already terminal.
    async fn mark_transfer_failed(
        &self,
        transfer_id: i64,
        reason: &str,
    ) -> Result<(), EngineError>;

    /// Sum of COMPLETED debit amounts out of a wallet within
    /// `[from, to)`. Pending and failed transfers do not count.
    async fn completed_debit_total(
        &self,
        source_wallet_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Decimal, EngineError>;

    /// The atomic posting unit: conditional debit of the source, DEBIT
    /// ledger entry, credit of the destination, CREDIT ledger entry,
    /// COMPLETED transition with completion timestamp, all or nothing.
    /// A failed balance guard surfaces as
    /// `InsufficientBalance` with no visible side effects.
    ///
    /// The transfer must be in PROCESSING when this is called.
    async fn post_transfer(&self, transfer: &Transfer) -> Result<TransferPosting, EngineError>;
}

/// Recurring transfer persistence
#[async_trait]
pub trait RecurringStore: Send + Sync {
    async fn insert_recurring(
        &self,
        new: NewRecurringTransfer,
    ) -> Result<RecurringTransfer, EngineError>;

    async fn recurring_by_id(&self, recurring_id: i64)
    -> Result<Option<RecurringTransfer>, EngineError>;

    async fn recurring_by_user(&self, user_id: i64)
    -> Result<Vec<RecurringTransfer>, EngineError>;

    /// ACTIVE rows with `next_execution_date <= today`, oldest first
    async fn due_recurring(&self, today: NaiveDate)
    -> Result<Vec<RecurringTransfer>, EngineError>;

    /// After a successful firing: set the next execution date, stamp the
    /// last execution, increment the execution counter.
    async fn update_recurring_after_execution(
        &self,
        recurring_id: i64,
        next_execution_date: NaiveDate,
        executed_at: DateTime<Utc>,
    ) -> Result<(), EngineError>;

    async fn update_recurring_status(
        &self,
        recurring_id: i64,
        status: RecurringStatus,
    ) -> Result<(), EngineError>;
}

/// Savings goal persistence
#[async_trait]
pub trait SavingsStore: Send + Sync {
    async fn insert_goal(&self, new: NewSavingsGoal) -> Result<SavingsGoal, EngineError>;

    async fn goal_by_id(&self, goal_id: i64) -> Result<Option<SavingsGoal>, EngineError>;

    async fn goals_by_user(&self, user_id: i64) -> Result<Vec<SavingsGoal>, EngineError>;

    async fn update_goal_progress(
        &self,
        goal_id: i64,
        current_amount: Decimal,
    ) -> Result<(), EngineError>;

    async fn update_goal_status(
        &self,
        goal_id: i64,
        status: GoalStatus,
    ) -> Result<(), EngineError>;
}

/// Audit record persistence
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert_audit(&self, record: NewAuditRecord) -> Result<(), EngineError>;
}

/// The full store surface the services are wired against
pub trait Store:
    WalletStore + LedgerStore + TransferStore + RecurringStore + SavingsStore + AuditStore
{
}

impl<T> Store for T where
    T: WalletStore + LedgerStore + TransferStore + RecurringStore + SavingsStore + AuditStore
{
}
