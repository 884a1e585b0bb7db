//! Push-on-change subscriptions for live collections.
//!
//! # Responsibility
//! - Replace ambient shared live data with explicit subscription objects.
//! - Deliver the full current snapshot of a collection after each change.
//!
//! # Invariants
//! - Subscribers are notified in subscription order.
//! - Only successful mutations publish; a failed write publishes nothing.
//! - Delivery runs outside the subscriber lock, so a callback may subscribe
//!   or unsubscribe on the feed that is notifying it.
//! - `subscribe_with_snapshot` registers before it reads, so no publish is
//!   lost between the initial snapshot and the first change.

use crate::model::athlete::Athlete;
use crate::model::checkin::CheckInEvent;
use crate::model::coach::Coach;
use crate::model::log_entry::LogEntry;
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Handle returned by `ChangeFeed::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&[T]) + Send + Sync>;

/// Subscriber registry for one collection.
pub struct ChangeFeed<T> {
    name: &'static str,
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
}

impl<T> ChangeFeed<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Registers `listener`; it receives every snapshot published afterwards.
    pub fn subscribe(&self, listener: impl Fn(&[T]) + Send + Sync + 'static) -> SubscriptionId {
        self.register(Arc::new(listener)).0
    }

    /// Registers `listener`, then hands it the snapshot returned by `read`.
    ///
    /// A publish racing with `read` may reach the listener before the
    /// snapshot does; it is never dropped. If `read` fails the subscription
    /// is removed again.
    pub fn subscribe_with_snapshot<E>(
        &self,
        listener: impl Fn(&[T]) + Send + Sync + 'static,
        read: impl FnOnce() -> Result<Vec<T>, E>,
    ) -> Result<SubscriptionId, E> {
        let (id, listener) = self.register(Arc::new(listener));
        match read() {
            Ok(snapshot) => {
                listener(snapshot.as_slice());
                Ok(id)
            }
            Err(err) => {
                self.unsubscribe(id);
                Err(err)
            }
        }
    }

    fn register(&self, listener: Listener<T>) -> (SubscriptionId, Listener<T>) {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::clone(&listener)));
        debug!(
            "event=feed_subscribe module=feed feed={} subscription={}",
            self.name, id.0
        );
        (id, listener)
    }

    /// Removes a subscription. Returns `false` when it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        before != listeners.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Pushes `snapshot` to every current subscriber.
    pub fn publish(&self, snapshot: &[T]) {
        let listeners: Vec<Listener<T>> = self
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        debug!(
            "event=feed_publish module=feed feed={} subscribers={} items={}",
            self.name,
            listeners.len(),
            snapshot.len()
        );
        for listener in listeners {
            listener(snapshot);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Listener<T>)>> {
        // A panicking listener poisons the lock; keep delivering to the rest.
        self.listeners.lock().unwrap_or_else(|poisoned| {
            warn!(
                "event=feed_poisoned module=feed status=recovered feed={}",
                self.name
            );
            poisoned.into_inner()
        })
    }
}

impl<T> std::fmt::Debug for ChangeFeed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// One feed per live collection, shared by every service that mutates or
/// observes it.
#[derive(Debug, Clone)]
pub struct CollectionFeeds {
    pub ledger: Arc<ChangeFeed<CheckInEvent>>,
    pub logs: Arc<ChangeFeed<LogEntry>>,
    pub roster: Arc<ChangeFeed<Athlete>>,
    pub coaches: Arc<ChangeFeed<Coach>>,
}

impl Default for CollectionFeeds {
    fn default() -> Self {
        Self {
            ledger: Arc::new(ChangeFeed::new("ledger")),
            logs: Arc::new(ChangeFeed::new("logs")),
            roster: Arc::new(ChangeFeed::new("roster")),
            coaches: Arc::new(ChangeFeed::new("coaches")),
        }
    }
}

/// Publishes a fresh snapshot after a successful write.
///
/// A failed re-read does not undo the write that already happened, so it is
/// logged and the notification is skipped.
pub(crate) fn publish_snapshot<T, E: std::fmt::Display>(
    feed: &ChangeFeed<T>,
    snapshot: Result<Vec<T>, E>,
) {
    match snapshot {
        Ok(items) => feed.publish(&items),
        Err(err) => warn!(
            "event=feed_publish module=feed status=error feed={} error={err}",
            feed.name
        ),
    }
}
