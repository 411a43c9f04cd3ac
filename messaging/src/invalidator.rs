//! Realtime invalidation: keep a conversation list live without polling.
//!
//! Subscribes to the storage change feed and runs a refetch callback on
//! message inserts and conversation updates. Deliberately coarse-grained:
//! the callback refetches everything, so a dropped or lagged event costs one
//! extra refetch, never a stale list.

use std::future::Future;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;

use storage::{ChangeEvent, ChangeOp, ChangeTable, MessagingStore};

/// A live subscription tied to a consuming view.
///
/// The subscription is a scoped resource: dropping the guard aborts the
/// listening task and releases the feed receiver, including on error paths.
pub struct RealtimeInvalidator {
    handle: JoinHandle<()>,
}

impl RealtimeInvalidator {
    /// Subscribes to the store's change feed and spawns the listener.
    /// `on_change` is invoked after every relevant event; it is expected to
    /// refetch the consumer's conversation list.
    pub fn spawn<F, Fut>(store: &dyn MessagingStore, on_change: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut feed = store.subscribe_changes();

        let handle = tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(event) if relevant(event) => {
                        debug!(?event, "Change event, refetching");
                        on_change().await;
                    }
                    Ok(_) => {}
                    // Missed events; a single refetch converges anyway.
                    Err(RecvError::Lagged(missed)) => {
                        debug!(missed, "Change feed lagged, refetching");
                        on_change().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self { handle }
    }
}

impl Drop for RealtimeInvalidator {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Message inserts and conversation updates drive the list; participant
/// churn is picked up by the refetch those events trigger.
fn relevant(event: ChangeEvent) -> bool {
    matches!(
        event,
        ChangeEvent {
            table: ChangeTable::PlatformMessages,
            op: ChangeOp::Insert,
        } | ChangeEvent {
            table: ChangeTable::Conversations,
            op: ChangeOp::Update,
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevant_events() {
        assert!(relevant(ChangeEvent::new(
            ChangeTable::PlatformMessages,
            ChangeOp::Insert
        )));
        assert!(relevant(ChangeEvent::new(
            ChangeTable::Conversations,
            ChangeOp::Update
        )));
        assert!(!relevant(ChangeEvent::new(
            ChangeTable::Conversations,
            ChangeOp::Insert
        )));
        assert!(!relevant(ChangeEvent::new(
            ChangeTable::ConversationParticipants,
            ChangeOp::Insert
        )));
        assert!(!relevant(ChangeEvent::new(
            ChangeTable::PlatformMessages,
            ChangeOp::Update
        )));
    }
}
