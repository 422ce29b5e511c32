use thiserror::Error;

/// Main error type for the notification socket
#[derive(Error, Debug)]
pub enum NotifyError {
    /// No credential was supplied and the auth collaborator had none
    #[error("No credential available for the notification socket")]
    MissingCredential,

    /// Inbound frame could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The driver task is gone
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Builder or configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("Error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for NotifyError {
    fn from(e: serde_json::Error) -> Self {
        NotifyError::ParseError(e.to_string())
    }
}

/// Result type for notification socket operations
pub type Result<T> = std::result::Result<T, NotifyError>;
