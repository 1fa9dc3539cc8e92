//! Graph change notifications.
//!
//! Writers announce which user's view changed. Long-poll waiters subscribe
//! and use an announcement only as a cue to re-check their change token
//! early, so a lost or lagged notification costs latency, never correctness.
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphUpdate {
    pub user_id: Uuid,
}

#[derive(Clone)]
pub struct GraphEvents {
    tx: broadcast::Sender<GraphUpdate>,
}

impl GraphEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn notify_graph_changed(&self, user_id: Uuid) {
        // Err only means nobody is listening right now.
        let receivers = self.tx.send(GraphUpdate { user_id }).unwrap_or(0);
        tracing::trace!("graph_update for {} delivered to {} listener(s)", user_id, receivers);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GraphUpdate> {
        self.tx.subscribe()
    }
}

impl Default for GraphEvents {
    fn default() -> Self {
        Self::new()
    }
}
