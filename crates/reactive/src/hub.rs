//! Stream hub implementation.
//!
//! A `StreamHub` is the observable side of a stream: it carries the stream's
//! schema and fans every published row out to its subscribers.

use crate::subscription::{SubscriptionId, SubscriptionManager};
use parking_lot::RwLock;
use sluice_core::schema::StreamSchema;
use sluice_core::Row;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// The fan-out point of one stream.
///
/// Publishing is synchronous: subscribers run on the publishing thread, in
/// subscription order, before `publish` returns. The subscriber list is not
/// locked while callbacks run, so a callback may publish into other hubs and
/// other threads may subscribe concurrently.
pub struct StreamHub {
    /// Stream name
    name: String,
    /// Stream schema
    schema: Arc<StreamSchema>,
    /// Subscribers
    subscriptions: RwLock<SubscriptionManager>,
    /// Rows published so far
    published: AtomicU64,
    /// Whether the hub stopped accepting rows
    closed: AtomicBool,
}

impl StreamHub {
    /// Creates a hub for the named stream.
    pub fn new(name: impl Into<String>, schema: Arc<StreamSchema>) -> Self {
        Self {
            name: name.into(),
            schema,
            subscriptions: RwLock::new(SubscriptionManager::new()),
            published: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the stream name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stream schema.
    #[inline]
    pub fn schema(&self) -> &Arc<StreamSchema> {
        &self.schema
    }

    /// Subscribes to every row published from now on.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Row) + Send + Sync + 'static,
    {
        self.subscriptions.write().subscribe(callback)
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscriptions.write().unsubscribe(id)
    }

    /// Returns the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Publishes a row to every subscriber.
    ///
    /// Returns the number of subscribers notified. A closed hub drops the row
    /// and returns 0.
    pub fn publish(&self, row: &Row) -> usize {
        if self.is_closed() {
            return 0;
        }
        let callbacks = self.subscriptions.read().callbacks();
        self.published.fetch_add(1, Ordering::Relaxed);
        for callback in &callbacks {
            callback(row);
        }
        callbacks.len()
    }

    /// Returns the number of rows published.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Stops the hub: later rows are dropped and all subscribers released.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscriptions.write().clear();
    }

    /// Returns whether the hub is closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for StreamHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHub")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .field("published", &self.published_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
