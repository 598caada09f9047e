use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::models::{CashDirection, ReturnType};

/// Events emitted after state changes commit. Consumers (currently the
/// logging processor) must tolerate at-least-once delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Supplier ledger
    SupplierProductCreated { supplier_id: i32, product_id: i32 },
    SupplierProductUpdated(i32),
    SupplierProductDeleted(i32),

    // Customer ledger
    CustomerPurchaseCreated { customer_id: i32, product_id: i32 },
    CustomerPurchaseUpdated(i32),
    CustomerPurchaseDeleted(i32),

    // Inventory
    InventoryUpdated(i32),
    InventoryDeleted(i32),
    StockReduced {
        item_id: i32,
        quantity_sold: i32,
        remaining: i32,
    },

    // Returns
    ReturnCompleted {
        return_id: String,
        return_type: ReturnType,
        refund: Decimal,
    },
    ReturnUpdated(String),
    ReturnDeleted(String),

    // Cash ledger
    CashRecorded {
        transaction_id: i32,
        direction: CashDirection,
        amount: Decimal,
        new_balance: Decimal,
    },

    // Settings
    DataReset,
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, logging (not failing) when the processor is gone.
    /// Events are a post-commit notification channel; the ledger write that
    /// produced them has already succeeded.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            tracing::warn!("event processor unavailable, dropping event: {}", e);
        }
    }
}

/// Drains the event channel and logs each event. Runs for the lifetime of
/// the server task that spawned it.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ReturnCompleted {
                return_id,
                return_type,
                refund,
            } => {
                info!(%return_id, %return_type, %refund, "return completed");
            }
            Event::CashRecorded {
                transaction_id,
                direction,
                amount,
                new_balance,
            } => {
                info!(%transaction_id, %direction, %amount, %new_balance, "cash recorded");
            }
            other => info!(event = ?other, "event processed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn send_does_not_fail_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out.
        sender.send(Event::DataReset).await;
    }

    #[tokio::test]
    async fn events_flow_through_the_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::ReturnCompleted {
                return_id: "RET1".to_string(),
                return_type: ReturnType::Customer,
                refund: dec!(20.00),
            })
            .await;

        match rx.recv().await {
            Some(Event::ReturnCompleted { return_id, .. }) => assert_eq!(return_id, "RET1"),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
