//! walletd: wallet ledger and transfer engine
//!
//! Core pieces:
//! - `wallet`: wallet accounts and the read accessor
//! - `ledger`: append-only double-entry records
//! - `transfer`: the transfer state machine and engine
//! - `store`: the transactional store traits with PostgreSQL and in-memory
//!   implementations
//! - `reconciliation`: stored-vs-derived balance checking
//! - `recurring`: standing instructions and the scheduler worker
//! - `savings`: goal tracking on top of the engine
//! - `gateway`: the HTTP surface

pub mod audit;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod reconciliation;
pub mod recurring;
pub mod savings;
pub mod store;
pub mod transfer;
pub mod wallet;

pub use config::AppConfig;
pub use error::EngineError;
