pub mod models;
pub mod service;

pub use models::{Wallet, WalletBalanceResponse, WalletStatus};
pub use service::WalletService;
