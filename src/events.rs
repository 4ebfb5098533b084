use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// Domain events emitted after successful writes. Delivery is best-effort
/// and never participates in request outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(i32),
    ProductUpdated(i32),
    ProductDeleted(i32),
    ProductImageDeleted(i32),
    CustomerCreated(i32),
    CustomerUpdated(i32),
    CustomerDeleted(i32),
    OrderCreated(i32),
    OrderUpdated(i32),
    OrderDeleted(i32),
    OrderStatusChanged {
        order_id: i32,
        old_status: String,
        new_status: String,
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
}

/// Consumes events off the channel and logs them. Runs until every sender
/// is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    order_id = order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Order status changed"
                );
            }
            other => info!(event = ?other, "Domain event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::OrderCreated(1))
            .await
            .expect("send with live receiver");

        drop(rx);
        assert!(sender.send(Event::OrderDeleted(1)).await.is_err());
    }
}
