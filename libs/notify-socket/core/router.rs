//! Message Routing
//!
//! Every inbound frame goes through two tiers:
//!
//! ```text
//! WebSocket → decode → BuiltinKind? → fixed handler (stores / toasts / heartbeat reply)
//!                           ↓
//!                   SubscriberRegistry[type] → subscribers in registration order
//! ```
//!
//! The built-in tier is a closed enum matched exhaustively. The subscriber tier
//! is open: any `type` string can be subscribed to, including built-in kinds.

use crate::core::envelope::{now_timestamp, Envelope};
use crate::core::registry::SubscriberRegistry;
use crate::traits::*;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Title of the toast raised for urgent and high-priority alerts
pub const URGENT_ALERT_TITLE: &str = "Nouvelle alerte urgente";

const URGENT_ALERT_DURATION: Duration = Duration::from_millis(10_000);
const ANNOUNCEMENT_DURATION: Duration = Duration::from_millis(8_000);

/// Message kinds with a fixed handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    Notification,
    AlertCreated,
    AlertUpdated,
    RiskProfileUpdated,
    InterventionPlanUpdated,
    SystemAnnouncement,
    Heartbeat,
}

impl BuiltinKind {
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "notification" => Some(Self::Notification),
            "alert_created" => Some(Self::AlertCreated),
            "alert_updated" => Some(Self::AlertUpdated),
            "risk_profile_updated" => Some(Self::RiskProfileUpdated),
            "intervention_plan_updated" => Some(Self::InterventionPlanUpdated),
            "system_announcement" => Some(Self::SystemAnnouncement),
            "heartbeat" => Some(Self::Heartbeat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::AlertCreated => "alert_created",
            Self::AlertUpdated => "alert_updated",
            Self::RiskProfileUpdated => "risk_profile_updated",
            Self::InterventionPlanUpdated => "intervention_plan_updated",
            Self::SystemAnnouncement => "system_announcement",
            Self::Heartbeat => "heartbeat",
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================
//
// Payload fields are read one by one: a null or malformed field falls back to
// its default instead of discarding the whole event.

/// String field of a payload, `None` when absent, null or not a string
fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

/// Parse a timestamp as RFC 3339, or as a naive ISO 8601 time read as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// "First Last" of the student attached to a risk profile, possibly empty
fn student_name(profile: &Value) -> String {
    let Some(student) = profile.get("student").filter(|s| s.is_object()) else {
        return String::new();
    };
    let first = str_field(student, "first_name").unwrap_or_default();
    let last = str_field(student, "last_name").unwrap_or_default();
    format!("{} {}", first, last).trim().to_string()
}

/// Record carried under `key` (or its alias) in an event payload
fn record<'a>(data: &'a Value, key: &str, alias: &str) -> Option<&'a Value> {
    data.get(key)
        .or_else(|| data.get(alias))
        .filter(|v| v.is_object())
}

fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Router
// =============================================================================

/// Decodes inbound frames and dispatches them to collaborators and subscribers
pub struct Router {
    notifications: Arc<dyn NotificationStore>,
    risk: Arc<dyn RiskStore>,
    toaster: Arc<dyn Toaster>,
    registry: Arc<Mutex<SubscriberRegistry>>,
}

impl Router {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        risk: Arc<dyn RiskStore>,
        toaster: Arc<dyn Toaster>,
        registry: Arc<Mutex<SubscriberRegistry>>,
    ) -> Self {
        Self {
            notifications,
            risk,
            toaster,
            registry,
        }
    }

    pub fn toaster(&self) -> &Arc<dyn Toaster> {
        &self.toaster
    }

    /// Decode a raw frame into an envelope
    pub fn decode(&self, frame: &WsMessage) -> Result<Envelope> {
        Envelope::from_frame(frame)
    }

    /// Run the fixed handler for a built-in kind
    ///
    /// Returns a reply to transmit immediately, if the kind calls for one.
    pub fn dispatch_builtin(&self, envelope: &Envelope) -> Option<Envelope> {
        let Some(kind) = BuiltinKind::from_type(&envelope.kind) else {
            warn!("Unhandled message type: {}", envelope.kind);
            return None;
        };

        let data = &envelope.data;
        match kind {
            BuiltinKind::Notification => self.on_notification(envelope),
            BuiltinKind::AlertCreated => self.on_alert_created(data),
            BuiltinKind::AlertUpdated => {
                self.replace(RiskCollection::Alerts, record(data, "alert", "alert"), kind)
            }
            BuiltinKind::RiskProfileUpdated => self.on_risk_profile_updated(data),
            BuiltinKind::InterventionPlanUpdated => self.replace(
                RiskCollection::InterventionPlans,
                record(data, "intervention_plan", "plan"),
                kind,
            ),
            BuiltinKind::SystemAnnouncement => self.on_announcement(data),
            BuiltinKind::Heartbeat => {
                debug!("Server heartbeat received, replying");
                return Some(Envelope::heartbeat_response());
            }
        }
        None
    }

    /// Invoke every subscriber registered for the envelope's exact type
    ///
    /// Each subscriber is isolated: an error or panic is logged and the
    /// remaining subscribers still run. Returns how many were invoked.
    pub fn notify_subscribers(&self, envelope: &Envelope) -> usize {
        // Lock released before invoking so subscribers may (un)subscribe.
        let subscribers = self.registry.lock().snapshot(&envelope.kind);

        for subscriber in &subscribers {
            match catch_unwind(AssertUnwindSafe(|| subscriber(&envelope.data))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Subscriber for '{}' failed: {}", envelope.kind, e);
                }
                Err(_) => {
                    error!("Subscriber for '{}' panicked", envelope.kind);
                }
            }
        }

        subscribers.len()
    }

    fn on_notification(&self, envelope: &Envelope) {
        let data = &envelope.data;
        if !data.is_object() {
            warn!("Invalid notification payload: {}", data);
            return;
        }

        let id = data
            .get("id")
            .and_then(id_to_string)
            .or_else(|| envelope.id.clone())
            .unwrap_or_else(|| format!("ws-{}", now_timestamp()));
        let title = str_field(data, "title").unwrap_or_default().to_string();
        let message = str_field(data, "message").unwrap_or_default().to_string();
        let severity = str_field(data, "type")
            .or_else(|| str_field(data, "severity"))
            .unwrap_or("info")
            .to_string();
        let created_at = str_field(data, "created_at")
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);

        let level = ToastLevel::from_severity(&severity);
        self.toaster.toast(
            level,
            &title,
            ToastOptions::new().description(message.clone()),
        );

        self.notifications.add_notification(NotificationEntry {
            id,
            title,
            message,
            kind: severity,
            read: false,
            created_at,
            link: str_field(data, "link").map(str::to_string),
        });
    }

    fn on_alert_created(&self, data: &Value) {
        let Some(alert) = record(data, "alert", "alert") else {
            warn!("alert_created without an alert record");
            return;
        };

        self.risk.prepend(RiskCollection::Alerts, alert.clone());

        let priority = str_field(alert, "priority").unwrap_or_default();
        if matches!(priority, "urgent" | "high") {
            let title = str_field(alert, "title").unwrap_or_default();
            let student = alert
                .get("risk_profile")
                .map(student_name)
                .unwrap_or_default();
            let description = match (title.is_empty(), student.is_empty()) {
                (_, true) => title.to_string(),
                (true, false) => student,
                (false, false) => format!("{} - {}", title, student),
            };

            self.toaster.toast(
                ToastLevel::Error,
                URGENT_ALERT_TITLE,
                ToastOptions::new()
                    .description(description)
                    .duration(URGENT_ALERT_DURATION),
            );
        }
    }

    fn on_risk_profile_updated(&self, data: &Value) {
        let profile = record(data, "risk_profile", "profile");
        self.replace(RiskCollection::RiskProfiles, profile, BuiltinKind::RiskProfileUpdated);

        let significant = data
            .get("significant_change")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if significant {
            let student = profile.map(student_name).unwrap_or_default();

            self.toaster.toast(
                ToastLevel::Warning,
                "Changement significatif du profil de risque",
                ToastOptions::new().description(student),
            );
        }
    }

    fn on_announcement(&self, data: &Value) {
        if !data.is_object() {
            warn!("Invalid system_announcement payload: {}", data);
            return;
        }
        let title = str_field(data, "title").unwrap_or_default();
        let message = str_field(data, "message").unwrap_or_default();
        self.toaster.toast(
            ToastLevel::Info,
            title,
            ToastOptions::new()
                .description(message.to_string())
                .duration(ANNOUNCEMENT_DURATION),
        );
    }

    fn replace(&self, collection: RiskCollection, record: Option<&Value>, kind: BuiltinKind) {
        let Some(record) = record else {
            warn!("{} without a record", kind.as_str());
            return;
        };
        if !self.risk.replace(collection, record.clone()) {
            debug!("{}: no {:?} record with id {}", kind.as_str(), collection, record["id"]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Toasts(Mutex<Vec<(ToastLevel, String, ToastOptions)>>);

    impl Toaster for Toasts {
        fn toast(&self, level: ToastLevel, title: &str, options: ToastOptions) {
            self.0.lock().push((level, title.to_string(), options));
        }
    }

    struct Fixture {
        router: Router,
        notifications: Arc<InMemoryNotificationStore>,
        risk: Arc<InMemoryRiskStore>,
        toasts: Arc<Toasts>,
        registry: Arc<Mutex<SubscriberRegistry>>,
    }

    fn fixture() -> Fixture {
        let notifications = Arc::new(InMemoryNotificationStore::new());
        let risk = Arc::new(InMemoryRiskStore::new());
        let toasts = Arc::new(Toasts::default());
        let registry = Arc::new(Mutex::new(SubscriberRegistry::new()));
        let router = Router::new(
            notifications.clone(),
            risk.clone(),
            toasts.clone(),
            registry.clone(),
        );
        Fixture {
            router,
            notifications,
            risk,
            toasts,
            registry,
        }
    }

    #[test]
    fn test_builtin_kind_roundtrips_names() {
        for kind in [
            BuiltinKind::Notification,
            BuiltinKind::AlertCreated,
            BuiltinKind::AlertUpdated,
            BuiltinKind::RiskProfileUpdated,
            BuiltinKind::InterventionPlanUpdated,
            BuiltinKind::SystemAnnouncement,
            BuiltinKind::Heartbeat,
        ] {
            assert_eq!(BuiltinKind::from_type(kind.as_str()), Some(kind));
        }
        assert_eq!(BuiltinKind::from_type("Notification"), None);
    }

    #[test]
    fn test_notification_stored_with_matching_toast() {
        let f = fixture();
        let env = Envelope::new(
            "notification",
            json!({"id": 42, "title": "Absence", "message": "Absence non justifiée", "type": "warning", "link": "/attendance"}),
        );

        assert!(f.router.dispatch_builtin(&env).is_none());

        let entries = f.notifications.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "42");
        assert_eq!(entries[0].kind, "warning");
        assert!(!entries[0].read);
        assert_eq!(entries[0].link.as_deref(), Some("/attendance"));

        let toasts = f.toasts.0.lock();
        assert_eq!(toasts[0].0, ToastLevel::Warning);
        assert_eq!(toasts[0].1, "Absence");
    }

    #[test]
    fn test_notification_with_loose_fields_is_kept() {
        let f = fixture();
        let cases = [
            json!({"id": 1, "title": "A", "message": "m", "created_at": "2024-01-15T10:30:00"}),
            json!({"id": 2, "title": "B", "message": null}),
            json!({"id": 3, "title": null, "message": "m", "type": "error", "severity": "warning"}),
            json!({"id": 4, "title": "D", "message": "m", "link": null, "created_at": "hier"}),
        ];
        for data in cases {
            f.router.dispatch_builtin(&Envelope::new("notification", data));
        }

        let entries = f.notifications.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(f.toasts.0.lock().len(), 4);

        let by_id = |id: &str| entries.iter().find(|e| e.id == id).cloned().unwrap();
        assert_eq!(
            by_id("1").created_at,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
        assert_eq!(by_id("2").message, "");
        assert_eq!(by_id("3").title, "");
        assert_eq!(by_id("3").kind, "error");
        assert!(by_id("4").link.is_none());
    }

    #[test]
    fn test_timestamp_parsing() {
        assert_eq!(
            parse_timestamp("2024-01-15T10:30:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-01-15T10:30:00.250"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap() + chrono::Duration::milliseconds(250))
        );
        assert_eq!(parse_timestamp("15/01/2024"), None);
    }

    #[test]
    fn test_urgent_alert_with_null_fields_still_toasts() {
        let f = fixture();
        f.router.dispatch_builtin(&Envelope::new(
            "alert_created",
            json!({"alert": {"id": "1", "priority": "urgent", "title": null,
                   "risk_profile": {"student": {"first_name": "Awa", "last_name": null}}}}),
        ));

        assert_eq!(f.risk.records(RiskCollection::Alerts).len(), 1);
        let toasts = f.toasts.0.lock();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].1, URGENT_ALERT_TITLE);
        assert_eq!(toasts[0].2.description.as_deref(), Some("Awa"));
    }

    #[test]
    fn test_low_priority_alert_has_no_toast() {
        let f = fixture();
        let env = Envelope::new("alert_created", json!({"alert": {"id": "7", "priority": "low", "title": "T"}}));
        f.router.dispatch_builtin(&env);

        assert_eq!(f.risk.records(RiskCollection::Alerts).len(), 1);
        assert!(f.toasts.0.lock().is_empty());
    }

    #[test]
    fn test_high_priority_alert_toast() {
        let f = fixture();
        let env = Envelope::new(
            "alert_created",
            json!({"alert": {"id": "1", "priority": "high", "title": "Décrochage",
                   "risk_profile": {"student": {"first_name": "Awa", "last_name": "Diop"}}}}),
        );
        f.router.dispatch_builtin(&env);

        let toasts = f.toasts.0.lock();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].0, ToastLevel::Error);
        assert_eq!(toasts[0].1, URGENT_ALERT_TITLE);
        assert_eq!(toasts[0].2.description.as_deref(), Some("Décrochage - Awa Diop"));
        assert_eq!(toasts[0].2.duration, Some(URGENT_ALERT_DURATION));
    }

    #[test]
    fn test_updates_replace_by_id() {
        let f = fixture();
        f.risk.prepend(RiskCollection::Alerts, json!({"id": "1", "status": "open"}));
        f.risk.prepend(RiskCollection::RiskProfiles, json!({"id": 3, "level": "low"}));
        f.risk.prepend(RiskCollection::InterventionPlans, json!({"id": "p", "step": 1}));

        f.router.dispatch_builtin(&Envelope::new("alert_updated", json!({"alert": {"id": "1", "status": "closed"}})));
        f.router.dispatch_builtin(&Envelope::new(
            "risk_profile_updated",
            json!({"risk_profile": {"id": 3, "level": "high"}, "significant_change": false}),
        ));
        f.router.dispatch_builtin(&Envelope::new("intervention_plan_updated", json!({"plan": {"id": "p", "step": 2}})));

        assert_eq!(f.risk.records(RiskCollection::Alerts)[0]["status"], "closed");
        assert_eq!(f.risk.records(RiskCollection::RiskProfiles)[0]["level"], "high");
        assert_eq!(f.risk.records(RiskCollection::InterventionPlans)[0]["step"], 2);
        assert!(f.toasts.0.lock().is_empty());
    }

    #[test]
    fn test_significant_profile_change_warns() {
        let f = fixture();
        f.router.dispatch_builtin(&Envelope::new(
            "risk_profile_updated",
            json!({"risk_profile": {"id": 9, "student": {"first_name": "Léo", "last_name": "Martin"}},
                   "significant_change": true}),
        ));

        let toasts = f.toasts.0.lock();
        assert_eq!(toasts[0].0, ToastLevel::Warning);
        assert_eq!(toasts[0].2.description.as_deref(), Some("Léo Martin"));
    }

    #[test]
    fn test_announcement_and_heartbeat() {
        let f = fixture();
        f.router.dispatch_builtin(&Envelope::new(
            "system_announcement",
            json!({"title": "Maintenance", "message": "Ce soir à 22h"}),
        ));
        {
            let toasts = f.toasts.0.lock();
            assert_eq!(toasts[0].0, ToastLevel::Info);
            assert_eq!(toasts[0].2.duration, Some(ANNOUNCEMENT_DURATION));
        }

        let reply = f.router.dispatch_builtin(&Envelope::new("heartbeat", json!({}))).unwrap();
        assert_eq!(reply.kind, "heartbeat_response");
        assert_eq!(reply.data, json!({}));
    }

    #[test]
    fn test_unknown_type_reaches_subscribers() {
        let f = fixture();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        f.registry.lock().insert(
            "grade_published",
            Arc::new(move |data: &Value| -> Result<()> {
                sink.lock().push(data.clone());
                Ok(())
            }),
        );

        let env = Envelope::new("grade_published", json!({"grade": 15}));
        assert!(f.router.dispatch_builtin(&env).is_none());
        assert_eq!(f.router.notify_subscribers(&env), 1);
        assert_eq!(seen.lock()[0], json!({"grade": 15}));
    }

    #[test]
    fn test_failing_subscribers_are_isolated() {
        let f = fixture();
        let hits = Arc::new(Mutex::new(0));
        f.registry.lock().insert(
            "x",
            Arc::new(|_: &Value| -> Result<()> { Err(NotifyError::Other("boom".into())) }),
        );
        f.registry.lock().insert("x", Arc::new(|_: &Value| -> Result<()> { panic!("subscriber panic") }));
        let counter = hits.clone();
        f.registry.lock().insert(
            "x",
            Arc::new(move |_: &Value| -> Result<()> {
                *counter.lock() += 1;
                Ok(())
            }),
        );

        assert_eq!(f.router.notify_subscribers(&Envelope::new("x", json!(null))), 3);
        assert_eq!(*hits.lock(), 1);
    }
}
