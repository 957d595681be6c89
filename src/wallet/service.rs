//! Wallet read accessor
//!
//! Read-only views over the wallet store. Balance mutation is the transfer
//! engine's job; nothing here writes.

use std::sync::Arc;

use crate::error::EngineError;
use crate::store::{Store, WalletStore};

use super::models::{Wallet, WalletBalanceResponse};

#[derive(Clone)]
pub struct WalletService {
    store: Arc<dyn Store>,
}

impl WalletService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Wallet by its public number, any status
    pub async fn by_number(&self, wallet_number: &str) -> Result<Wallet, EngineError> {
        self.store
            .wallet_by_number(wallet_number)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("wallet {}", wallet_number)))
    }

    /// Wallet by id, restricted to ACTIVE
    pub async fn active_by_id(&self, wallet_id: i64) -> Result<Wallet, EngineError> {
        self.store
            .active_wallet_by_id(wallet_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("active wallet {}", wallet_id)))
    }

    /// All ACTIVE wallets owned by a user
    pub async fn user_wallets(&self, user_id: i64) -> Result<Vec<Wallet>, EngineError> {
        self.store.active_wallets_by_user(user_id).await
    }

    /// Current stored balance for a wallet number
    pub async fn balance(&self, wallet_number: &str) -> Result<WalletBalanceResponse, EngineError> {
        let wallet = self.by_number(wallet_number).await?;
        Ok(WalletBalanceResponse::from(&wallet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::wallet::models::WalletStatus;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_balance_lookup() {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_wallet(1001, "WAL-001", Decimal::from(250), "USD", Decimal::from(1000))
            .await;

        let service = WalletService::new(store);
        let balance = service.balance("WAL-001").await.unwrap();
        assert_eq!(balance.balance, Decimal::from(250));
        assert_eq!(balance.status, "ACTIVE");
    }

    #[tokio::test]
    async fn test_unknown_wallet_is_not_found() {
        let service = WalletService::new(Arc::new(MemoryStore::new()));
        let err = service.by_number("WAL-MISSING").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_inactive_wallet_excluded_from_active_lookup() {
        let store = Arc::new(MemoryStore::new());
        let wallet = store
            .seed_wallet(1001, "WAL-001", Decimal::ZERO, "USD", Decimal::from(1000))
            .await;
        store
            .set_wallet_status(wallet.wallet_id, WalletStatus::Frozen)
            .await;

        let service = WalletService::new(store);
        assert!(service.active_by_id(wallet.wallet_id).await.is_err());
        assert!(service.user_wallets(1001).await.unwrap().is_empty());
    }
}
