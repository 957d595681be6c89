//! Transfer engine
//!
//! Drives a transfer through its state machine:
//!
//! ```text
//! PENDING -> PROCESSING -> COMPLETED
//!                       -> FAILED
//! ```
//!
//! Validation happens before the PENDING record exists; failures after it
//! always leave a durable FAILED record with the reason appended. The
//! balance guard inside `post_transfer` is the authority on sufficiency,
//! not any pre-check here.

use chrono::{Days, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::audit::AuditTrail;
use crate::config::TransferConfig;
use crate::error::EngineError;
use crate::events::{EventPublisher, TransferEventKind};
use crate::store::{Store, TransferStore, WalletStore};
use crate::wallet::models::Wallet;

use super::models::{
    NewTransfer, Transfer, TransferRequest, TransferResponse, TransferStatus,
    new_transfer_reference,
};

#[derive(Clone)]
pub struct TransferEngine {
    store: Arc<dyn Store>,
    audit: AuditTrail,
    events: EventPublisher,
    limits: TransferConfig,
}

impl TransferEngine {
    pub fn new(
        store: Arc<dyn Store>,
        audit: AuditTrail,
        events: EventPublisher,
        limits: TransferConfig,
    ) -> Self {
        Self {
            store,
            audit,
            events,
            limits,
        }
    }

    /// Initiate and execute a transfer on behalf of `initiated_by`.
    pub async fn initiate(
        &self,
        request: TransferRequest,
        initiated_by: i64,
    ) -> Result<TransferResponse, EngineError> {
        self.validate_static(&request)?;

        let source = self.resolve_wallet(&request.source_wallet_number).await?;
        let destination = self
            .resolve_wallet(&request.destination_wallet_number)
            .await?;

        self.validate_wallets(&request, &source, &destination, initiated_by)?;
        self.check_daily_limit(&source, request.amount).await?;

        let transfer = self
            .store
            .insert_transfer(NewTransfer {
                transfer_reference: new_transfer_reference(),
                source_wallet_id: source.wallet_id,
                destination_wallet_id: destination.wallet_id,
                amount: request.amount,
                currency: source.currency.clone(),
                description: request.description,
                initiated_by,
            })
            .await?;

        info!(
            reference = %transfer.transfer_reference,
            amount = %transfer.amount,
            currency = %transfer.currency,
            "Transfer initiated"
        );
        self.audit
            .record(
                "TRANSFER",
                transfer.transfer_id,
                "TRANSFER_INITIATED",
                Some(initiated_by),
                None,
                Some(format!(
                    "{} {} {}",
                    transfer.transfer_reference, transfer.amount, transfer.currency
                )),
            )
            .await;
        self.events.publish(
            &transfer.transfer_reference,
            TransferEventKind::Initiated,
            transfer.amount,
            &transfer.currency,
            None,
        );

        match self.execute(&transfer, initiated_by).await {
            Ok(response) => Ok(response),
            Err(e) => {
                self.fail(&transfer, initiated_by, &e).await;
                Err(e)
            }
        }
    }

    /// Current state of a transfer by its public reference
    pub async fn status(&self, reference: &str) -> Result<TransferResponse, EngineError> {
        let transfer = self
            .store
            .transfer_by_reference(reference)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("transfer {}", reference)))?;
        Ok(TransferResponse::from(&transfer))
    }

    async fn execute(
        &self,
        transfer: &Transfer,
        initiated_by: i64,
    ) -> Result<TransferResponse, EngineError> {
        // Claim the transfer. Losing the CAS means another actor holds it.
        let claimed = self
            .store
            .update_transfer_status(
                transfer.transfer_id,
                TransferStatus::Pending,
                TransferStatus::Processing,
            )
            .await?;
        if !claimed {
            return Err(EngineError::Conflict(format!(
                "transfer {} is already being processed",
                transfer.transfer_reference
            )));
        }

        self.audit
            .record(
                "TRANSFER",
                transfer.transfer_id,
                "TRANSFER_PROCESSING",
                Some(initiated_by),
                Some(TransferStatus::Pending.to_string()),
                Some(TransferStatus::Processing.to_string()),
            )
            .await;

        let mut processing = transfer.clone();
        processing.status = TransferStatus::Processing;

        let posting = self.store.post_transfer(&processing).await?;

        self.audit
            .record(
                "WALLET",
                transfer.source_wallet_id,
                "WALLET_DEBITED",
                Some(initiated_by),
                Some(posting.source_balance_before.to_string()),
                Some(posting.source_balance_after.to_string()),
            )
            .await;
        self.audit
            .record(
                "WALLET",
                transfer.destination_wallet_id,
                "WALLET_CREDITED",
                Some(initiated_by),
                Some(posting.destination_balance_before.to_string()),
                Some(posting.destination_balance_after.to_string()),
            )
            .await;
        self.audit
            .record(
                "TRANSFER",
                transfer.transfer_id,
                "TRANSFER_COMPLETED",
                Some(initiated_by),
                Some(TransferStatus::Processing.to_string()),
                Some(TransferStatus::Completed.to_string()),
            )
            .await;

        info!(
            reference = %transfer.transfer_reference,
            "Transfer completed"
        );
        self.events.publish(
            &transfer.transfer_reference,
            TransferEventKind::Completed,
            transfer.amount,
            &transfer.currency,
            None,
        );

        Ok(TransferResponse::from(&posting.transfer))
    }

    async fn fail(&self, transfer: &Transfer, initiated_by: i64, error: &EngineError) {
        warn!(
            reference = %transfer.transfer_reference,
            error = %error,
            "Transfer failed"
        );

        let reason = error.to_string();
        if let Err(e) = self
            .store
            .mark_transfer_failed(transfer.transfer_id, &reason)
            .await
        {
            warn!(
                reference = %transfer.transfer_reference,
                error = %e,
                "Could not record FAILED state"
            );
        }

        self.audit
            .record(
                "TRANSFER",
                transfer.transfer_id,
                "TRANSFER_FAILED",
                Some(initiated_by),
                None,
                Some(reason.clone()),
            )
            .await;
        self.events.publish(
            &transfer.transfer_reference,
            TransferEventKind::Failed,
            transfer.amount,
            &transfer.currency,
            Some(reason),
        );
    }

    fn validate_static(&self, request: &TransferRequest) -> Result<(), EngineError> {
        if request.amount < self.limits.min_amount {
            return Err(EngineError::InvalidRequest(format!(
                "amount must be at least {}",
                self.limits.min_amount
            )));
        }
        if request.amount > self.limits.max_amount {
            return Err(EngineError::InvalidRequest(format!(
                "amount must not exceed {}",
                self.limits.max_amount
            )));
        }
        if request.source_wallet_number == request.destination_wallet_number {
            return Err(EngineError::InvalidRequest(
                "source and destination wallets must differ".to_string(),
            ));
        }
        Ok(())
    }

    async fn resolve_wallet(&self, wallet_number: &str) -> Result<Wallet, EngineError> {
        self.store
            .wallet_by_number(wallet_number)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("wallet {}", wallet_number)))
    }

    fn validate_wallets(
        &self,
        request: &TransferRequest,
        source: &Wallet,
        destination: &Wallet,
        initiated_by: i64,
    ) -> Result<(), EngineError> {
        if source.user_id != initiated_by {
            return Err(EngineError::Conflict(
                "source wallet is not owned by the caller".to_string(),
            ));
        }
        if !source.is_active() {
            return Err(EngineError::InvalidState(format!(
                "source wallet {} is {}",
                source.wallet_number, source.status
            )));
        }
        if !destination.is_active() {
            return Err(EngineError::InvalidState(format!(
                "destination wallet {} is {}",
                destination.wallet_number, destination.status
            )));
        }
        if source.currency != destination.currency {
            return Err(EngineError::CurrencyMismatch {
                expected: source.currency.clone(),
                actual: destination.currency.clone(),
            });
        }
        if request.currency != source.currency {
            return Err(EngineError::CurrencyMismatch {
                expected: request.currency.clone(),
                actual: source.currency.clone(),
            });
        }
        // Best-effort pre-check; the conditional debit inside posting is
        // the authority and can still fail under concurrency.
        if source.balance < request.amount {
            return Err(EngineError::InsufficientBalance(
                source.wallet_number.clone(),
            ));
        }
        Ok(())
    }

    /// Completed debit volume for the current UTC calendar day must stay
    /// within the wallet's daily limit after this transfer.
    async fn check_daily_limit(&self, source: &Wallet, amount: Decimal) -> Result<(), EngineError> {
        let day_start = Utc::now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();
        let day_end = day_start + Days::new(1);

        let used = self
            .store
            .completed_debit_total(source.wallet_id, day_start, day_end)
            .await?;

        if used + amount > source.daily_limit {
            return Err(EngineError::DailyLimitExceeded {
                limit: source.daily_limit,
                used,
            });
        }
        Ok(())
    }
}
