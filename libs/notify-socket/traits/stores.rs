//! State collaborators fed by the message router
//!
//! The router never owns application state. It pushes decoded events into
//! these stores, which the host application reads from.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entry appended to the notification store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub id: String,
    pub title: String,
    pub message: String,
    /// Severity: error, warning, success or info
    #[serde(rename = "type")]
    pub kind: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Sink for user notifications
pub trait NotificationStore: Send + Sync {
    fn add_notification(&self, entry: NotificationEntry);
}

/// Collections held by the risk-detection store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskCollection {
    Alerts,
    RiskProfiles,
    InterventionPlans,
}

/// Risk-domain store: lists of JSON records keyed by their `id` field
pub trait RiskStore: Send + Sync {
    /// Insert a record at the front of a collection
    fn prepend(&self, collection: RiskCollection, record: Value);

    /// Replace the record whose `id` matches, returning whether one was found
    fn replace(&self, collection: RiskCollection, record: Value) -> bool;
}

/// Notification store kept in memory, newest last
#[derive(Default)]
pub struct InMemoryNotificationStore {
    entries: RwLock<Vec<NotificationEntry>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<NotificationEntry> {
        self.entries.read().clone()
    }

    pub fn unread_count(&self) -> usize {
        self.entries.read().iter().filter(|e| !e.read).count()
    }
}

impl NotificationStore for InMemoryNotificationStore {
    fn add_notification(&self, entry: NotificationEntry) {
        self.entries.write().push(entry);
    }
}

/// Risk store kept in memory
#[derive(Default)]
pub struct InMemoryRiskStore {
    alerts: RwLock<Vec<Value>>,
    risk_profiles: RwLock<Vec<Value>>,
    intervention_plans: RwLock<Vec<Value>>,
}

impl InMemoryRiskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection, e.g. from an initial REST fetch
    pub fn with_records(self, collection: RiskCollection, records: Vec<Value>) -> Self {
        *self.collection(collection).write() = records;
        self
    }

    pub fn records(&self, collection: RiskCollection) -> Vec<Value> {
        self.collection(collection).read().clone()
    }

    fn collection(&self, collection: RiskCollection) -> &RwLock<Vec<Value>> {
        match collection {
            RiskCollection::Alerts => &self.alerts,
            RiskCollection::RiskProfiles => &self.risk_profiles,
            RiskCollection::InterventionPlans => &self.intervention_plans,
        }
    }
}

impl RiskStore for InMemoryRiskStore {
    fn prepend(&self, collection: RiskCollection, record: Value) {
        self.collection(collection).write().insert(0, record);
    }

    fn replace(&self, collection: RiskCollection, record: Value) -> bool {
        let id = match record.get("id") {
            Some(id) if !id.is_null() => id.clone(),
            _ => return false,
        };

        let mut records = self.collection(collection).write();
        match records.iter_mut().find(|r| r.get("id") == Some(&id)) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prepend_puts_newest_first() {
        let store = InMemoryRiskStore::new();
        store.prepend(RiskCollection::Alerts, json!({"id": "1"}));
        store.prepend(RiskCollection::Alerts, json!({"id": "2"}));

        let alerts = store.records(RiskCollection::Alerts);
        assert_eq!(alerts[0]["id"], "2");
        assert_eq!(alerts[1]["id"], "1");
    }

    #[test]
    fn test_replace_by_id_keeps_position() {
        let store = InMemoryRiskStore::new().with_records(
            RiskCollection::RiskProfiles,
            vec![json!({"id": 1, "score": 10}), json!({"id": 2, "score": 20})],
        );

        assert!(store.replace(RiskCollection::RiskProfiles, json!({"id": 2, "score": 90})));

        let profiles = store.records(RiskCollection::RiskProfiles);
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[1]["score"], 90);
        assert_eq!(profiles[0]["score"], 10);
    }

    #[test]
    fn test_replace_unknown_or_missing_id() {
        let store = InMemoryRiskStore::new()
            .with_records(RiskCollection::InterventionPlans, vec![json!({"id": "a"})]);

        assert!(!store.replace(RiskCollection::InterventionPlans, json!({"id": "b"})));
        assert!(!store.replace(RiskCollection::InterventionPlans, json!({"name": "no id"})));
        assert_eq!(store.records(RiskCollection::InterventionPlans).len(), 1);
    }

    #[test]
    fn test_unread_count() {
        let store = InMemoryNotificationStore::new();
        store.add_notification(NotificationEntry {
            id: "n1".into(),
            title: "Note".into(),
            message: "Nouvelle note".into(),
            kind: "info".into(),
            read: false,
            created_at: Utc::now(),
            link: None,
        });
        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.entries()[0].title, "Note");
    }
}
