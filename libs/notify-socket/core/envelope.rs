//! Wire envelope shared by inbound and outbound frames
//!
//! ```text
//! { "type": string, "data": <any JSON>, "timestamp": ISO-8601, "id"?: string }
//! ```

use crate::traits::{Result, WsMessage};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message kind sent by the client on every heartbeat tick
pub const HEARTBEAT: &str = "heartbeat";

/// Message kind sent in reply to a server heartbeat
pub const HEARTBEAT_RESPONSE: &str = "heartbeat_response";

/// A `{type, data, timestamp, id?}` frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Outbound messages use the same envelope as inbound ones
pub type OutboundMessage = Envelope;

impl Envelope {
    /// Create an envelope stamped with the current time
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            timestamp: now_timestamp(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// `{type: "heartbeat", data: {}}`
    pub fn heartbeat() -> Self {
        Self::new(HEARTBEAT, Value::Object(Default::default()))
    }

    /// `{type: "heartbeat_response", data: {}}`
    pub fn heartbeat_response() -> Self {
        Self::new(HEARTBEAT_RESPONSE, Value::Object(Default::default()))
    }

    /// Decode a raw frame
    pub fn from_frame(frame: &WsMessage) -> Result<Self> {
        let text = frame.to_text().ok_or_else(|| {
            crate::traits::NotifyError::ParseError("frame is not valid UTF-8".into())
        })?;
        Ok(serde_json::from_str(text)?)
    }

    /// Encode as a text frame
    pub fn to_frame(&self) -> Result<WsMessage> {
        Ok(WsMessage::Text(serde_json::to_string(self)?))
    }
}

/// Current time as an ISO-8601 UTC string with millisecond precision
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
