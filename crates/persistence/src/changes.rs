//! In-process change feed backing live sync.
//!
//! Every successful write publishes a coarse-grained event naming the record
//! that changed, never its contents. Subscribers re-read the affected rows
//! through the ordinary read paths, so any events dropped under load cost an
//! extra refresh rather than lost data.

use tokio::sync::broadcast;
use uuid::Uuid;

/// Something changed in the store. Payloads carry identity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A profile row was written.
    Profile { user_id: Uuid },
    /// A hub row was written, or deleted entirely.
    Hub { hub_id: Uuid, deleted: bool },
    /// The medication board of a hub changed in any way.
    Medications { hub_id: Uuid },
}

const FEED_CAPACITY: usize = 256;

/// Broadcast fan-out of [`ChangeEvent`]s to every live session.
///
/// Cloning is cheap; all clones publish into the same channel. Publishing
/// with no subscribers is a no-op.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Publishes one event to all current subscribers.
    pub fn publish(&self, event: ChangeEvent) {
        // Err here only means nobody is listening.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let feed = ChangeFeed::new();
        let mut a = feed.subscribe();
        let mut b = feed.subscribe();

        let hub_id = Uuid::new_v4();
        feed.publish(ChangeEvent::Medications { hub_id });

        assert_eq!(a.recv().await.unwrap(), ChangeEvent::Medications { hub_id });
        assert_eq!(b.recv().await.unwrap(), ChangeEvent::Medications { hub_id });
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let feed = ChangeFeed::new();
        feed.publish(ChangeEvent::Profile {
            user_id: Uuid::new_v4(),
        });
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let feed = ChangeFeed::new();
        feed.publish(ChangeEvent::Hub {
            hub_id: Uuid::new_v4(),
            deleted: true,
        });

        let mut rx = feed.subscribe();
        let hub_id = Uuid::new_v4();
        feed.publish(ChangeEvent::Hub {
            hub_id,
            deleted: false,
        });
        assert_eq!(
            rx.recv().await.unwrap(),
            ChangeEvent::Hub {
                hub_id,
                deleted: false
            }
        );
    }
}
