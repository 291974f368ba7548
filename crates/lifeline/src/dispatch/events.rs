use serde::Serialize;
use tokio::sync::broadcast;

use super::domain::{IncidentId, IncidentView, TimelineEntry};

const DEFAULT_CAPACITY: usize = 256;

/// Events pushed to every connected client. Delivery is at-most-once and
/// best-effort; offline clients recover through the active-incidents poll.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SosEvent {
    NewSos(IncidentView),
    SosResponse {
        incident_id: IncidentId,
        responder_name: String,
    },
    TimelineUpdate {
        incident_id: IncidentId,
        timeline: Vec<TimelineEntry>,
    },
}

/// Shared fan-out bus over a `tokio::sync::broadcast` channel.
///
/// The broadcaster is injected into the dispatch service rather than held as
/// process-wide ambient state; the WebSocket layer subscribes, the service
/// publishes. Publishing never blocks and a send without subscribers is not
/// an error.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SosEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SosEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers, returning how many
    /// received it. Zero subscribers is a successful no-op.
    pub fn publish(&self, event: SosEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
