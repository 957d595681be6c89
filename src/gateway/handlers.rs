//! HTTP handlers
//!
//! Callers are identified by the `x-user-id` header (authentication proper
//! sits in front of this service). Amounts cross the wire as strings and
//! are parsed to fixed-point decimals here.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use crate::ledger::LedgerEntry;
use crate::reconciliation::ReconciliationReport;
use crate::recurring::models::{
    Frequency, RecurringTransfer, RecurringTransferRequest, RecurringTransferResponse,
};
use crate::savings::models::{SavingsGoalRequest, SavingsGoalResponse};
use crate::store::{LedgerStore, SavingsStore, WalletStore};
use crate::transfer::models::{TransferRequest, TransferResponse};
use crate::wallet::models::WalletBalanceResponse;

use super::state::AppState;
use super::types::{ApiError, ApiResult, ok};

fn caller_id(headers: &HeaderMap) -> Result<i64, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ApiError::unauthorized("missing or invalid x-user-id header"))
}

fn parse_amount(raw: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(raw).map_err(|_| ApiError::bad_request(format!("invalid amount: {}", raw)))
}

pub async fn health() -> ApiResult<&'static str> {
    ok("healthy")
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateTransferBody {
    pub source_wallet_number: String,
    pub destination_wallet_number: String,
    pub amount: String,
    pub currency: String,
    pub description: Option<String>,
}

/// POST /api/v1/transfers
pub async fn create_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateTransferBody>,
) -> ApiResult<TransferResponse> {
    let user_id = caller_id(&headers)?;
    let amount = parse_amount(&body.amount)?;

    let response = state
        .transfers
        .initiate(
            TransferRequest {
                source_wallet_number: body.source_wallet_number,
                destination_wallet_number: body.destination_wallet_number,
                amount,
                currency: body.currency,
                description: body.description,
            },
            user_id,
        )
        .await?;
    ok(response)
}

/// GET /api/v1/transfers/{reference}
pub async fn transfer_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> ApiResult<TransferResponse> {
    caller_id(&headers)?;
    let response = state.transfers.status(&reference).await?;
    ok(response)
}

// ---------------------------------------------------------------------------
// Wallets
// ---------------------------------------------------------------------------

/// GET /api/v1/wallets
pub async fn list_wallets(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<WalletBalanceResponse>> {
    let user_id = caller_id(&headers)?;
    let wallets = state.wallets.user_wallets(user_id).await?;
    ok(wallets.iter().map(WalletBalanceResponse::from).collect())
}

/// GET /api/v1/wallets/{wallet_number}/balance
pub async fn wallet_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(wallet_number): Path<String>,
) -> ApiResult<WalletBalanceResponse> {
    let user_id = caller_id(&headers)?;
    let wallet = state.wallets.by_number(&wallet_number).await?;
    if wallet.user_id != user_id {
        // Same shape as an unknown wallet; existence is not disclosed
        return Err(ApiError::not_found(format!(
            "wallet {} not found",
            wallet_number
        )));
    }
    ok(WalletBalanceResponse::from(&wallet))
}

/// GET /api/v1/wallets/{wallet_number}/ledger
pub async fn wallet_ledger(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(wallet_number): Path<String>,
) -> ApiResult<Vec<LedgerEntry>> {
    let user_id = caller_id(&headers)?;
    let wallet = state.wallets.by_number(&wallet_number).await?;
    if wallet.user_id != user_id {
        return Err(ApiError::not_found(format!(
            "wallet {} not found",
            wallet_number
        )));
    }
    let entries = state.store.entries_for_wallet(wallet.wallet_id).await?;
    ok(entries)
}

// ---------------------------------------------------------------------------
// Recurring transfers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRecurringBody {
    pub source_wallet_number: String,
    pub destination_wallet_number: String,
    pub savings_goal_id: Option<i64>,
    pub amount: String,
    pub currency: String,
    pub frequency: String,
    pub day_of_week: Option<u32>,
    pub day_of_month: Option<u32>,
    pub execution_time: Option<NaiveTime>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub max_executions: Option<i32>,
    pub description: Option<String>,
}

/// POST /api/v1/recurring
pub async fn create_recurring(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateRecurringBody>,
) -> ApiResult<RecurringTransferResponse> {
    let user_id = caller_id(&headers)?;
    let amount = parse_amount(&body.amount)?;
    let frequency = Frequency::from_str(&body.frequency)
        .map_err(|_| ApiError::bad_request(format!("invalid frequency: {}", body.frequency)))?;

    let recurring = state
        .recurring
        .create(
            RecurringTransferRequest {
                source_wallet_number: body.source_wallet_number,
                destination_wallet_number: body.destination_wallet_number,
                savings_goal_id: body.savings_goal_id,
                amount,
                currency: body.currency,
                frequency,
                day_of_week: body.day_of_week,
                day_of_month: body.day_of_month,
                execution_time: body.execution_time,
                start_date: body.start_date,
                end_date: body.end_date,
                max_executions: body.max_executions,
                description: body.description,
            },
            user_id,
        )
        .await?;
    ok(recurring_view(&state, recurring).await?)
}

/// GET /api/v1/recurring
pub async fn list_recurring(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<RecurringTransferResponse>> {
    let user_id = caller_id(&headers)?;
    let rows = state.recurring.list(user_id).await?;
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(recurring_view(&state, row).await?);
    }
    ok(views)
}

/// POST /api/v1/recurring/{id}/pause
pub async fn pause_recurring(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(recurring_id): Path<i64>,
) -> ApiResult<RecurringTransferResponse> {
    let user_id = caller_id(&headers)?;
    let recurring = state.recurring.pause(recurring_id, user_id).await?;
    ok(recurring_view(&state, recurring).await?)
}

/// POST /api/v1/recurring/{id}/resume
pub async fn resume_recurring(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(recurring_id): Path<i64>,
) -> ApiResult<RecurringTransferResponse> {
    let user_id = caller_id(&headers)?;
    let recurring = state.recurring.resume(recurring_id, user_id).await?;
    ok(recurring_view(&state, recurring).await?)
}

/// POST /api/v1/recurring/{id}/cancel
pub async fn cancel_recurring(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(recurring_id): Path<i64>,
) -> ApiResult<RecurringTransferResponse> {
    let user_id = caller_id(&headers)?;
    let recurring = state.recurring.cancel(recurring_id, user_id).await?;
    ok(recurring_view(&state, recurring).await?)
}

async fn recurring_view(
    state: &AppState,
    recurring: RecurringTransfer,
) -> Result<RecurringTransferResponse, ApiError> {
    let source = state.store.wallet_by_id(recurring.source_wallet_id).await?;
    let destination = state
        .store
        .wallet_by_id(recurring.destination_wallet_id)
        .await?;
    let goal_name = match recurring.savings_goal_id {
        Some(goal_id) => state
            .store
            .goal_by_id(goal_id)
            .await?
            .map(|g| g.goal_name),
        None => None,
    };

    Ok(RecurringTransferResponse {
        recurring_id: recurring.recurring_id,
        source_wallet_number: source.map(|w| w.wallet_number).unwrap_or_default(),
        destination_wallet_number: destination.map(|w| w.wallet_number).unwrap_or_default(),
        savings_goal_id: recurring.savings_goal_id,
        savings_goal_name: goal_name,
        amount: recurring.amount,
        currency: recurring.currency,
        frequency: recurring.frequency.to_string(),
        day_of_week: recurring.day_of_week,
        day_of_month: recurring.day_of_month,
        execution_time: recurring.execution_time,
        start_date: recurring.start_date,
        end_date: recurring.end_date,
        next_execution_date: recurring.next_execution_date,
        last_executed_at: recurring.last_executed_at,
        status: recurring.status.to_string(),
        execution_count: recurring.execution_count,
        max_executions: recurring.max_executions,
        description: recurring.description,
        created_at: recurring.created_at,
    })
}

// ---------------------------------------------------------------------------
// Savings goals
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateGoalBody {
    pub savings_wallet_number: String,
    pub goal_name: String,
    pub description: Option<String>,
    pub target_amount: String,
    pub currency: String,
    pub target_date: NaiveDate,
}

/// POST /api/v1/goals
pub async fn create_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateGoalBody>,
) -> ApiResult<SavingsGoalResponse> {
    let user_id = caller_id(&headers)?;
    let target_amount = parse_amount(&body.target_amount)?;

    let goal = state
        .savings
        .create(
            SavingsGoalRequest {
                savings_wallet_number: body.savings_wallet_number,
                goal_name: body.goal_name,
                description: body.description,
                target_amount,
                currency: body.currency,
                target_date: body.target_date,
            },
            user_id,
        )
        .await?;
    ok(SavingsGoalResponse::from(&goal))
}

/// GET /api/v1/goals
pub async fn list_goals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<SavingsGoalResponse>> {
    let user_id = caller_id(&headers)?;
    let goals = state.savings.list(user_id).await?;
    ok(goals.iter().map(SavingsGoalResponse::from).collect())
}

#[derive(Debug, Deserialize)]
pub struct ContributeBody {
    pub source_wallet_number: String,
    pub amount: String,
}

/// POST /api/v1/goals/{id}/contribute
///
/// Moves money from the caller's wallet into the goal's savings wallet via
/// the transfer engine, then mirrors the amount as goal progress. The goal
/// is checked for eligibility first so a rejection never moves money.
pub async fn contribute_to_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(goal_id): Path<i64>,
    Json(body): Json<ContributeBody>,
) -> ApiResult<SavingsGoalResponse> {
    let user_id = caller_id(&headers)?;
    let amount = parse_amount(&body.amount)?;

    let goal = state.savings.contribution_target(goal_id, user_id).await?;
    let savings_wallet = state
        .store
        .wallet_by_id(goal.savings_wallet_id)
        .await?
        .ok_or_else(|| ApiError::not_found("savings wallet not found"))?;

    state
        .transfers
        .initiate(
            TransferRequest {
                source_wallet_number: body.source_wallet_number,
                destination_wallet_number: savings_wallet.wallet_number,
                amount,
                currency: goal.currency.clone(),
                description: Some(format!("Contribution to goal: {}", goal.goal_name)),
            },
            user_id,
        )
        .await?;

    let goal = state
        .savings
        .contribute(goal_id, amount, Some(user_id))
        .await?;
    ok(SavingsGoalResponse::from(&goal))
}

/// POST /api/v1/goals/{id}/pause
pub async fn pause_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(goal_id): Path<i64>,
) -> ApiResult<SavingsGoalResponse> {
    let user_id = caller_id(&headers)?;
    let goal = state.savings.pause(goal_id, user_id).await?;
    ok(SavingsGoalResponse::from(&goal))
}

/// POST /api/v1/goals/{id}/resume
pub async fn resume_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(goal_id): Path<i64>,
) -> ApiResult<SavingsGoalResponse> {
    let user_id = caller_id(&headers)?;
    let goal = state.savings.resume(goal_id, user_id).await?;
    ok(SavingsGoalResponse::from(&goal))
}

/// POST /api/v1/goals/{id}/cancel
pub async fn cancel_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(goal_id): Path<i64>,
) -> ApiResult<SavingsGoalResponse> {
    let user_id = caller_id(&headers)?;
    let goal = state.savings.cancel(goal_id, user_id).await?;
    ok(SavingsGoalResponse::from(&goal))
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// POST /api/v1/reconciliation/run
pub async fn run_reconciliation(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<ReconciliationReport> {
    caller_id(&headers)?;
    let report = state.reconciliation.run_full().await?;
    ok(report)
}

/// POST /api/v1/reconciliation/run/{wallet_number}
pub async fn run_reconciliation_single(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(wallet_number): Path<String>,
) -> ApiResult<ReconciliationReport> {
    caller_id(&headers)?;
    let report = state.reconciliation.run_single(&wallet_number).await?;
    ok(report)
}
