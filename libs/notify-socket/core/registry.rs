//! Dynamic subscriber registry
//!
//! Subscribers are keyed by the exact envelope `type` string and invoked in
//! registration order with the envelope's `data` field only.

use crate::traits::Result;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Callback invoked with the `data` field of a matching envelope
pub type SubscriberFn = Arc<dyn Fn(&Value) -> Result<()> + Send + Sync>;

/// Ordered subscribers per message kind
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: u64,
    by_kind: HashMap<String, Vec<(u64, SubscriberFn)>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscriber, returning its registration id
    pub fn insert(&mut self, kind: &str, subscriber: SubscriberFn) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.by_kind
            .entry(kind.to_string())
            .or_default()
            .push((id, subscriber));
        id
    }

    /// Remove one registration, keeping the order of the rest
    pub fn remove(&mut self, kind: &str, id: u64) -> bool {
        let Some(list) = self.by_kind.get_mut(kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sub_id, _)| *sub_id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.by_kind.remove(kind);
        }
        removed
    }

    /// Subscribers for `kind`, cloned so callers can invoke them unlocked
    pub fn snapshot(&self, kind: &str) -> Vec<SubscriberFn> {
        self.by_kind
            .get(kind)
            .map(|list| list.iter().map(|(_, f)| Arc::clone(f)).collect())
            .unwrap_or_default()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.by_kind.get(kind).map_or(0, Vec::len)
    }
}

/// Handle returned by `subscribe`
///
/// Dropping the handle keeps the subscription alive; only
/// [`Subscription::unsubscribe`] removes it.
pub struct Subscription {
    registry: Weak<Mutex<SubscriberRegistry>>,
    kind: String,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(registry: &Arc<Mutex<SubscriberRegistry>>, kind: &str, id: u64) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            kind: kind.to_string(),
            id,
        }
    }

    /// Message kind this subscription listens to
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Remove this subscriber. Further calls are no-ops.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.lock().remove(&self.kind, self.id) {
                debug!("Unsubscribed #{} from '{}'", self.id, self.kind);
            }
        }
    }
}
