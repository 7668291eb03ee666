//! Per-conversation request serialization.

use colloquy_core::ConversationId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// One mutex per conversation id.
///
/// A protocol holds the lane for its conversation while its request is in
/// flight and until the response has been applied or rolled back, so a
/// wholesale replacement from one request never races another request.
/// Lanes nobody holds or waits for are dropped on the next acquire.
#[derive(Debug, Default)]
pub struct RequestLanes {
    lanes: Mutex<HashMap<ConversationId, Arc<Mutex<()>>>>,
}

impl RequestLanes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of the lane for `id`.
    pub async fn acquire(&self, id: ConversationId) -> OwnedMutexGuard<()> {
        let lane = {
            let mut lanes = self.lanes.lock().await;
            lanes.retain(|_, lane| Arc::strong_count(lane) > 1);
            Arc::clone(lanes.entry(id).or_default())
        };

        if let Ok(guard) = Arc::clone(&lane).try_lock_owned() {
            return guard;
        }

        debug!("Conversation {id} has a request in flight, queueing");
        lane.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_same_conversation_is_serialized() {
        let lanes = RequestLanes::new();
        let id = ConversationId::new(1);

        let held = lanes.acquire(id).await;
        let waiting = timeout(Duration::from_millis(50), lanes.acquire(id)).await;
        assert!(waiting.is_err(), "second acquire must wait for the first");

        drop(held);
        let reacquired = timeout(Duration::from_millis(50), lanes.acquire(id)).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_idle_lanes_are_pruned() {
        let lanes = RequestLanes::new();

        for id in 1..=5 {
            drop(lanes.acquire(ConversationId::new(id)).await);
        }
        let held = lanes.acquire(ConversationId::new(6)).await;
        assert_eq!(lanes.lanes.lock().await.len(), 1);

        drop(lanes.acquire(ConversationId::new(7)).await);
        // Lane 6 is still held, so it survives pruning.
        let tracked = lanes.lanes.lock().await;
        assert!(tracked.contains_key(&ConversationId::new(6)));
        assert_eq!(tracked.len(), 2);
        drop(tracked);
        drop(held);
    }

    #[tokio::test]
    async fn test_different_conversations_do_not_block() {
        let lanes = RequestLanes::new();

        let _first = lanes.acquire(ConversationId::new(1)).await;
        let second = timeout(
            Duration::from_millis(50),
            lanes.acquire(ConversationId::new(2)),
        )
        .await;

        assert!(second.is_ok());
    }
}
