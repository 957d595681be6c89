use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{info, warn};

use walletd::audit::AuditTrail;
use walletd::config::AppConfig;
use walletd::gateway::{self, AppState};
use walletd::logging::init_logging;
use walletd::recurring::RecurringWorker;
use walletd::savings::SavingsService;
use walletd::store::{MemoryStore, PgStore, Store};
use walletd::transfer::TransferEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WALLETD_ENV").ok())
        .unwrap_or_else(|| "dev".to_string());
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    info!(env = %env, "Starting walletd");

    let store: Arc<dyn Store> = match &config.postgres_url {
        Some(url) => {
            let store = PgStore::connect(
                url,
                config.db_max_connections,
                Duration::from_secs(config.db_acquire_timeout_secs),
            )
            .await?;
            store.health_check().await?;
            Arc::new(store)
        }
        None => {
            warn!("No postgres_url configured; running with the in-memory store");
            let store = MemoryStore::new();
            seed_demo_wallets(&store, &config).await;
            Arc::new(store)
        }
    };

    let state = AppState::new(store.clone(), &config);

    if config.scheduler.enabled {
        let audit = AuditTrail::new(store.clone());
        let worker = RecurringWorker::new(
            store.clone(),
            TransferEngine::new(
                store.clone(),
                audit.clone(),
                state.events.clone(),
                config.transfer.clone(),
            ),
            SavingsService::new(store.clone(), audit.clone()),
            audit,
            config.scheduler.clone(),
        );
        tokio::spawn(worker.run());
    }

    gateway::serve(state, &config.gateway.host, config.gateway.port).await
}

/// Demo-mode fixtures so the API is usable without a database
async fn seed_demo_wallets(store: &MemoryStore, config: &AppConfig) {
    let limit = config.transfer.default_daily_limit;
    store
        .seed_wallet(1001, "WAL-10000001", Decimal::from(1000), "USD", limit)
        .await;
    store
        .seed_wallet(1001, "WAL-10000002", Decimal::ZERO, "USD", limit)
        .await;
    store
        .seed_wallet(1002, "WAL-10000003", Decimal::from(500), "USD", limit)
        .await;
    info!("Seeded demo wallets for users 1001 and 1002");
}
