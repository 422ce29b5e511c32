use crate::traits::{NotifyError, Result};

/// Path of the notification socket on the backend
pub const NOTIFICATIONS_PATH: &str = "/ws/notifications/";

/// Notification socket endpoint
///
/// Produces `wss://{host}/ws/notifications/?token={credential}`, or `ws://`
/// when the hosting page is not served securely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    secure: bool,
}

impl Endpoint {
    /// Create an endpoint for `host` (optionally with `:port`)
    pub fn new(host: impl Into<String>, secure: bool) -> Result<Self> {
        let host = host.into().trim().trim_end_matches('/').to_string();

        if host.is_empty() {
            return Err(NotifyError::Configuration("host must not be empty".into()));
        }
        if host.contains("://") || host.contains('/') || host.chars().any(char::is_whitespace) {
            return Err(NotifyError::Configuration(format!(
                "host must be a bare host[:port], got '{}'",
                host
            )));
        }

        Ok(Self { host, secure })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "wss"
        } else {
            "ws"
        }
    }

    /// Full socket URL carrying `credential`
    pub fn url(&self, credential: &str) -> String {
        format!(
            "{}://{}{}?token={}",
            self.scheme(),
            self.host,
            NOTIFICATIONS_PATH,
            credential
        )
    }

    /// Socket URL with the credential masked, for logs
    pub fn redacted_url(&self) -> String {
        format!("{}://{}{}?token=***", self.scheme(), self.host, NOTIFICATIONS_PATH)
    }
}
