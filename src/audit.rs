//! Best-effort audit trail
//!
//! Every state transition in the engine writes one audit record. Emission
//! is fire-and-forget: a failed write is logged at WARN and never rolls
//! back or fails the primary operation.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

use crate::store::{AuditStore, Store};

/// A recorded audit event
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub audit_id: i64,
    pub entity_type: String,
    pub entity_id: i64,
    pub action: String,
    pub performed_by: Option<i64>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New audit record awaiting insertion
#[derive(Debug, Clone)]
pub struct NewAuditRecord {
    pub entity_type: String,
    pub entity_id: i64,
    pub action: String,
    pub performed_by: Option<i64>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Audit writer shared by the services
#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<dyn Store>,
}

impl AuditTrail {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record an action. Never fails the caller.
    pub async fn record(
        &self,
        entity_type: &str,
        entity_id: i64,
        action: &str,
        performed_by: Option<i64>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        let record = NewAuditRecord {
            entity_type: entity_type.to_string(),
            entity_id,
            action: action.to_string(),
            performed_by,
            old_value,
            new_value,
        };

        if let Err(e) = self.store.insert_audit(record).await {
            warn!(
                entity_type,
                entity_id,
                action,
                error = %e,
                "Audit write failed (state change already committed)"
            );
        }
    }
}
