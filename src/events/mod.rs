use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::quotation::QuotationStatus;

/// Events emitted by the quotation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    QuotationCreated(Uuid),
    QuotationUpdated(Uuid),
    QuotationLineAdded {
        quotation_id: Uuid,
        line_id: Uuid,
    },
    QuotationLineUpdated {
        quotation_id: Uuid,
        line_id: Uuid,
    },
    QuotationLineRemoved {
        quotation_id: Uuid,
        line_id: Uuid,
    },
    QuotationStatusChanged {
        quotation_id: Uuid,
        old_status: QuotationStatus,
        new_status: QuotationStatus,
    },
    QuotationSent {
        quotation_id: Uuid,
        email: Option<String>,
    },
    QuotationConverted {
        quotation_id: Uuid,
        sale_id: Uuid,
    },
    QuotationExpired(Uuid),
    QuotationArchived(Uuid),
    QuotationRestored(Uuid),
    CouponApplied {
        quotation_id: Uuid,
        coupon_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Event delivery is best-effort; the owning transaction has already
    /// committed by the time an event is emitted.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!(error = %e, ?event, "Failed to publish event");
        }
    }
}

/// Consumes events from the channel. Delivery side effects (PDF generation,
/// email, webhooks) hang off this loop; the engine itself only logs.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::QuotationStatusChanged {
                quotation_id,
                old_status,
                new_status,
            } => {
                info!(%quotation_id, %old_status, %new_status, "quotation status changed");
            }
            Event::QuotationConverted {
                quotation_id,
                sale_id,
            } => {
                info!(%quotation_id, %sale_id, "quotation converted to sale");
            }
            other => {
                info!(event = ?other, "event received");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.send(Event::QuotationCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::QuotationCreated(received)) => assert_eq!(received, id),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or return an error
        sender
            .send_or_log(Event::QuotationArchived(Uuid::new_v4()))
            .await;
    }
}
