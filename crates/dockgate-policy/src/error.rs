//! The policy-facing error type: every rejection already carries the exact
//! HTTP status it should surface, so `dockgate-proxy` can turn it into a
//! response without re-deriving the taxonomy.

use http::StatusCode;

pub type PolicyResult<T> = std::result::Result<T, PolicyError>;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// A validation/ownership rejection with a pre-decided status code and
    /// a message naming the offending entity.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Something failed below the policy layer (engine transport, bad
    /// JSON) that should surface as a 500.
    #[error(transparent)]
    Engine(#[from] dockgate_core::Error),
}

impl PolicyError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Rejected {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Rejected {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// The status code this error should surface to the client, if it
    /// carries one (an `Engine` error has none — the proxy maps that to
    /// 500 itself).
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Engine(_) => None,
        }
    }
}
