//! Error types for DockGate

/// Result type alias using DockGate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type shared by the engine client and the policy crates.
///
/// This is deliberately not the HTTP-facing error type — `dockgate-proxy`
/// maps these (and `dockgate-policy::PolicyError`) onto the status codes in
/// the taxonomy it maps onto. This type only needs to distinguish the handful of things
/// downstream mapping actually cares about: access was denied somewhere
/// upstream of us, the resource wasn't there, or something else went wrong.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The engine (or a brokered dependency, like a registry) refused the
    /// request outright. Carries the message to surface to the client.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The engine returned 404 for a resource we expected to find.
    #[error("not found: {0}")]
    NotFound(String),

    /// Transport-level failure talking to the engine (connection refused,
    /// socket gone, malformed HTTP).
    #[error("engine transport error: {0}")]
    Transport(String),

    /// The engine's response body didn't parse the way we expected.
    #[error("engine response error: {0}")]
    EngineResponse(String),

    /// Local I/O failure (reading the registry-auth file, etc).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Catch-all for conditions that shouldn't be reachable in practice.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build an `AccessDenied` error naming the offending entity, matching
    /// the rule that a rejection message names the offending entity.
    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn engine_response(msg: impl Into<String>) -> Self {
        Self::EngineResponse(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
