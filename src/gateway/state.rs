use std::sync::Arc;

use crate::audit::AuditTrail;
use crate::config::AppConfig;
use crate::events::EventPublisher;
use crate::reconciliation::ReconciliationEngine;
use crate::recurring::RecurringService;
use crate::savings::SavingsService;
use crate::store::Store;
use crate::transfer::TransferEngine;
use crate::wallet::WalletService;

/// Shared gateway state: one store, the services wired over it
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub wallets: WalletService,
    pub transfers: TransferEngine,
    pub recurring: RecurringService,
    pub savings: SavingsService,
    pub reconciliation: ReconciliationEngine,
    pub events: EventPublisher,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        let audit = AuditTrail::new(store.clone());
        let events = EventPublisher::default();
        Self {
            wallets: WalletService::new(store.clone()),
            transfers: TransferEngine::new(
                store.clone(),
                audit.clone(),
                events.clone(),
                config.transfer.clone(),
            ),
            recurring: RecurringService::new(store.clone(), audit.clone()),
            savings: SavingsService::new(store.clone(), audit.clone()),
            reconciliation: ReconciliationEngine::new(store.clone(), audit),
            events,
            store,
        }
    }
}
