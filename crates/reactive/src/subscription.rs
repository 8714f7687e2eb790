//! Subscriber bookkeeping for stream hubs.

use sluice_core::Row;
use std::sync::Arc;

/// Unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback type for row notifications.
pub type RowCallback = Arc<dyn Fn(&Row) + Send + Sync>;

/// The subscribers of one stream, kept in subscription order.
pub struct SubscriptionManager {
    subscribers: Vec<(SubscriptionId, RowCallback)>,
    /// Next subscription ID to assign
    next_id: SubscriptionId,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 1,
        }
    }

    /// Subscribes to rows with the given callback.
    ///
    /// Returns the subscription ID that can be used to unsubscribe.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&Row) + Send + Sync + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Arc::new(callback)));
        id
    }

    /// Unsubscribes by ID.
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.subscribers.iter().position(|(sub, _)| *sub == id) {
            Some(index) => {
                self.subscribers.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns the callbacks in subscription order.
    ///
    /// Callers notify through the snapshot without holding a lock on the
    /// manager.
    pub fn callbacks(&self) -> Vec<RowCallback> {
        self.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Drops every subscriber. IDs are not reused.
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}
