//! Activity/audit events.
//!
//! Every successful mutation emits one event *after* its transaction
//! commits. The channel is the write-only audit collaborator: a send
//! failure is logged and never rolls back the business transaction.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    DeviceRegistered {
        device_id: Uuid,
        store_id: Uuid,
        actor: Uuid,
    },
    DeviceUpdated {
        device_id: Uuid,
        actor: Uuid,
    },
    DeviceMoved {
        device_id: Uuid,
        from_store: String,
        to_store: String,
        actor: Uuid,
    },
    DeviceDeleted {
        device_id: Uuid,
        actor: Uuid,
    },
    SaleCompleted {
        sale_id: Uuid,
        device_id: Uuid,
        store_id: Uuid,
        actor: Uuid,
    },
    StockAdjusted {
        product_id: Uuid,
        store_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
        reason: String,
        actor: Uuid,
    },
    StockReceived {
        product_id: Uuid,
        store_id: Uuid,
        quantity: i32,
        actor: Uuid,
    },
    StockRemoved {
        product_id: Uuid,
        store_id: Uuid,
        quantity: i32,
        reason: String,
        actor: Uuid,
    },
    ProductCreated {
        product_id: Uuid,
        code: String,
        actor: Uuid,
    },
    ProductUpdated {
        product_id: Uuid,
        actor: Uuid,
    },
    ProductDeactivated {
        product_id: Uuid,
        actor: Uuid,
    },
    ProductDeleted {
        product_id: Uuid,
        actor: Uuid,
    },
    StoreCreated {
        store_id: Uuid,
        name: String,
        actor: Uuid,
    },
}

impl Event {
    /// Short action tag for the audit record.
    pub fn action(&self) -> &'static str {
        match self {
            Event::DeviceRegistered { .. } => "device.registered",
            Event::DeviceUpdated { .. } => "device.updated",
            Event::DeviceMoved { .. } => "device.moved",
            Event::DeviceDeleted { .. } => "device.deleted",
            Event::SaleCompleted { .. } => "sale.completed",
            Event::StockAdjusted { .. } => "stock.adjusted",
            Event::StockReceived { .. } => "stock.received",
            Event::StockRemoved { .. } => "stock.removed",
            Event::ProductCreated { .. } => "product.created",
            Event::ProductUpdated { .. } => "product.updated",
            Event::ProductDeactivated { .. } => "product.deactivated",
            Event::ProductDeleted { .. } => "product.deleted",
            Event::StoreCreated { .. } => "store.created",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Builds a sender with a processor task already spawned. Convenient
    /// for tests and for callers that do not manage the task themselves.
    pub fn spawn_default() -> Self {
        let (tx, rx) = mpsc::channel(1024);
        tokio::spawn(process_events(rx));
        Self::new(tx)
    }

    /// Best-effort send. Called after the owning transaction has committed;
    /// a full channel or dropped receiver must never fail the mutation.
    pub async fn emit(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!(error = %e, "failed to enqueue audit event");
        }
    }
}

/// Consumes the audit stream and renders each event as a structured log
/// record. This is the external activity-log sink.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match serde_json::to_string(&event) {
            Ok(detail) => info!(action = event.action(), %detail, "activity"),
            Err(e) => warn!(action = event.action(), error = %e, "unserializable audit event"),
        }
    }
    info!("audit event channel closed");
}
