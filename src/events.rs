//! Transfer lifecycle events
//!
//! Fan-out over a tokio broadcast channel. Publication is fire-and-forget;
//! with no subscribers the send fails and is ignored. Slow subscribers can
//! lose events (broadcast semantics), which is acceptable for
//! notifications; the ledger is the durable record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferEventKind {
    Initiated,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferEvent {
    pub reference: String,
    pub kind: TransferEventKind,
    pub amount: Decimal,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
    /// Set only for FAILED events
    pub reason: Option<String>,
}

#[derive(Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<TransferEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransferEvent> {
        self.sender.subscribe()
    }

    pub fn publish(
        &self,
        reference: &str,
        kind: TransferEventKind,
        amount: Decimal,
        currency: &str,
        reason: Option<String>,
    ) {
        let event = TransferEvent {
            reference: reference.to_string(),
            kind,
            amount,
            currency: currency.to_string(),
            occurred_at: Utc::now(),
            reason,
        };
        if self.sender.send(event).is_err() {
            debug!(reference, "No event subscribers");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let publisher = EventPublisher::new(16);
        let mut receiver = publisher.subscribe();

        publisher.publish(
            "TXN-AABBCCDD",
            TransferEventKind::Completed,
            Decimal::from(100),
            "USD",
            None,
        );

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.reference, "TXN-AABBCCDD");
        assert_eq!(event.kind, TransferEventKind::Completed);
        assert!(event.reason.is_none());
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let publisher = EventPublisher::new(16);
        publisher.publish(
            "TXN-00000000",
            TransferEventKind::Failed,
            Decimal::ONE,
            "USD",
            Some("insufficient balance".to_string()),
        );
    }
}
