//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use devops_console_api::{ApiError, ErrorKind};

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Control-plane API error (converted from the api library)
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Validation error (caller input rejected before any request was sent)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Config error: {0}")]
    ConfigError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CoreError {
    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added. **
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ValidationError(_) => true,
            Self::Api(e) => e.is_expected(),
            Self::ConfigError(_) | Self::SerializationError(_) => false,
        }
    }

    /// Error class the caller branches on. Local failures count as server-side
    /// problems: nothing was wrong with the network.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api(e) => e.kind(),
            _ => ErrorKind::ServerError,
        }
    }

    /// HTTP status of a failed API call, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => e.status(),
            _ => None,
        }
    }

    /// The scoping resource is gone or hidden; callers navigate away.
    #[must_use]
    pub fn is_not_found_or_forbidden(&self) -> bool {
        self.kind() == ErrorKind::NotFoundOrForbidden
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
