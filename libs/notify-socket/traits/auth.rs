use async_trait::async_trait;

/// Trait for supplying the socket credential
///
/// The token is read once per connection attempt and is never refreshed
/// while a connection is open.
///
/// Lookups run on the client's driver task, so every other driver event
/// waits until they return. Implementations should answer from cached session
/// state and never perform network I/O. The provider is not consulted at all
/// when `connect` carries an explicit credential.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Whether the user currently holds a valid session
    async fn is_authenticated(&self) -> bool;

    /// Current bearer token, if any
    async fn token(&self) -> Option<String>;
}

/// Auth provider with no session
///
/// Every `connect` must then carry an explicit credential.
pub struct NoAuth;

#[async_trait]
impl AuthProvider for NoAuth {
    async fn is_authenticated(&self) -> bool {
        false
    }

    async fn token(&self) -> Option<String> {
        None
    }
}

/// Auth provider backed by a fixed token
pub struct StaticAuth {
    token: String,
}

impl StaticAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    async fn token(&self) -> Option<String> {
        if self.token.is_empty() {
            None
        } else {
            Some(self.token.clone())
        }
    }
}
