//! HTTP gateway
//!
//! Thin axum layer over the services: request parsing, caller
//! identification, and the response envelope. No business rules live here.

pub mod handlers;
pub mod state;
pub mod types;

pub use state::AppState;
pub use types::{ApiError, ApiResponse, ApiResult};

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/transfers", post(handlers::create_transfer))
        .route(
            "/api/v1/transfers/{reference}",
            get(handlers::transfer_status),
        )
        .route("/api/v1/wallets", get(handlers::list_wallets))
        .route(
            "/api/v1/wallets/{wallet_number}/balance",
            get(handlers::wallet_balance),
        )
        .route(
            "/api/v1/wallets/{wallet_number}/ledger",
            get(handlers::wallet_ledger),
        )
        .route(
            "/api/v1/recurring",
            post(handlers::create_recurring).get(handlers::list_recurring),
        )
        .route(
            "/api/v1/recurring/{id}/pause",
            post(handlers::pause_recurring),
        )
        .route(
            "/api/v1/recurring/{id}/resume",
            post(handlers::resume_recurring),
        )
        .route(
            "/api/v1/recurring/{id}/cancel",
            post(handlers::cancel_recurring),
        )
        .route(
            "/api/v1/goals",
            post(handlers::create_goal).get(handlers::list_goals),
        )
        .route(
            "/api/v1/goals/{id}/contribute",
            post(handlers::contribute_to_goal),
        )
        .route("/api/v1/goals/{id}/pause", post(handlers::pause_goal))
        .route("/api/v1/goals/{id}/resume", post(handlers::resume_goal))
        .route("/api/v1/goals/{id}/cancel", post(handlers::cancel_goal))
        .route(
            "/api/v1/reconciliation/run",
            post(handlers::run_reconciliation),
        )
        .route(
            "/api/v1/reconciliation/run/{wallet_number}",
            post(handlers::run_reconciliation_single),
        )
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Gateway listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
