use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Domain events emitted after a transaction commits. Consumers are
/// best-effort: a failed send never rolls back stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    MovementAppended {
        movement_id: Uuid,
        movement_type: String,
        product_id: Option<Uuid>,
        quantity_cases: i32,
    },
    PickListReleased {
        pick_list_id: Uuid,
        total_items: i32,
    },
    PickItemPicked {
        pick_list_id: Uuid,
        item_id: Uuid,
        picked_cases: i32,
    },
    PickListCompleted(Uuid),
    PickListDeleted(Uuid),
    CycleCountStarted(Uuid),
    CycleCountCompleted {
        cycle_count_id: Uuid,
        discrepancy_items: i32,
    },
    CycleCountReconciled {
        cycle_count_id: Uuid,
        adjustments_applied: i32,
    },
    OwnershipTransferred {
        movement_id: Uuid,
        from_owner_id: Uuid,
        to_owner_id: Uuid,
        quantity_cases: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Builds a connected sender/receiver pair with a sensible buffer.
pub fn channel() -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(1024);
    (EventSender::new(tx), rx)
}

/// Drains the event channel and logs each event. Spawned once at startup;
/// exits when every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        debug!(?event, "processing event");
    }
    info!("Event processor stopped");
}
