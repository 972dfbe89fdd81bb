//! Broadcast change feed distributing `SessionChange` to subscribers.
//!
//! Built on `tokio::sync::broadcast`. Delivery is best-effort: a subscriber
//! that falls more than `capacity` events behind skips the missed events and
//! carries on from the oldest one still buffered. Nothing is replayed.

use haven_types::event::SessionChange;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

/// Multi-consumer feed of session row changes.
///
/// Cloning the feed clones the sender, so every clone publishes into the
/// same channel.
pub struct ChangeFeed {
    sender: broadcast::Sender<SessionChange>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a change to all current subscribers.
    ///
    /// If there are no subscribers, the change is silently dropped.
    pub fn publish(&self, change: SessionChange) {
        let _ = self.sender.send(change);
    }

    /// Subscribe to changes of a single session row.
    pub fn subscribe_session(&self, session_id: Uuid) -> SessionSubscription {
        SessionSubscription::new(self.sender.subscribe(), FeedFilter::Session(session_id))
    }

    /// Subscribe to changes of every session requested by one user.
    pub fn subscribe_user(&self, user_id: Uuid) -> SessionSubscription {
        SessionSubscription::new(self.sender.subscribe(), FeedFilter::User(user_id))
    }

    /// Subscribe to every change on the table.
    pub fn subscribe_all(&self) -> SessionSubscription {
        SessionSubscription::new(self.sender.subscribe(), FeedFilter::All)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for ChangeFeed {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for ChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

/// Which changes a subscription delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFilter {
    Session(Uuid),
    User(Uuid),
    All,
}

impl FeedFilter {
    pub fn matches(&self, change: &SessionChange) -> bool {
        match self {
            FeedFilter::Session(id) => change.session_id() == *id,
            FeedFilter::User(id) => change.user_id() == *id,
            FeedFilter::All => true,
        }
    }
}

/// A filtered receiver on the change feed. Dropping it unsubscribes.
pub struct SessionSubscription {
    receiver: broadcast::Receiver<SessionChange>,
    filter: FeedFilter,
}

impl SessionSubscription {
    fn new(receiver: broadcast::Receiver<SessionChange>, filter: FeedFilter) -> Self {
        Self { receiver, filter }
    }

    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    /// Wait for the next matching change.
    ///
    /// Returns `None` once the feed is closed (every sender dropped).
    pub async fn recv(&mut self) -> Option<SessionChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.filter.matches(&change) => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, filter = ?self.filter, "change feed subscriber lagged, changes missed");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next matching change if one is already buffered.
    pub fn try_recv(&mut self) -> Option<SessionChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) if self.filter.matches(&change) => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, filter = ?self.filter, "change feed subscriber lagged, changes missed");
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}

impl std::fmt::Debug for SessionSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSubscription")
            .field("filter", &self.filter)
            .finish()
    }
}
