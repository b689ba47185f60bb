use serde::{Deserialize, Serialize};

/// Coarse error classes the console reacts to.
///
/// Only [`NotFoundOrForbidden`](Self::NotFoundOrForbidden) gets dedicated
/// handling (navigating away from a page whose scoping resource is gone);
/// everything else is surfaced as a generic notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The request never reached the server or the response never arrived.
    NetworkFailure,
    /// The server answered with a non-2xx status or an unusable payload.
    ServerError,
    /// The scoping resource no longer exists or access is denied.
    NotFoundOrForbidden,
}

/// Unified error type for all control-plane API calls.
///
/// Serializable so it can be forwarded to a UI layer as structured data.
/// Nothing in this crate retries on any variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ApiError {
    /// A network-level error occurred (connection refused, DNS failure, reset).
    NetworkFailure {
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    Timeout {
        /// Error details.
        detail: String,
    },

    /// The server answered with a non-2xx status.
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Machine-readable reason (`reason` field of the status payload), if any.
        reason: Option<String>,
        /// Human-readable message.
        message: String,
    },

    /// The requested resource, or the project/workspace scoping it, is gone or
    /// not visible to the current user.
    NotFoundOrForbidden {
        /// HTTP status code.
        status: u16,
        /// Machine-readable reason (`Not Found`, `NotFound`, `Forbidden`).
        reason: String,
        /// Original message from the server, if available.
        raw_message: Option<String>,
    },

    /// Failed to parse a response against its expected schema.
    ParseError {
        /// Details about the parse failure.
        detail: String,
    },

    /// The request could not be built (bad base URL, invalid client options).
    InvalidRequest {
        /// Details about what's wrong.
        detail: String,
    },
}

impl ApiError {
    /// Map the variant onto the three classes callers branch on.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkFailure { .. } | Self::Timeout { .. } => ErrorKind::NetworkFailure,
            Self::NotFoundOrForbidden { .. } => ErrorKind::NotFoundOrForbidden,
            Self::ServerError { .. }
            | Self::ParseError { .. }
            | Self::InvalidRequest { .. } => ErrorKind::ServerError,
        }
    }

    /// 是否为预期行为（资源不存在、无权限、请求被服务端拒绝），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::NotFoundOrForbidden { .. } => true,
            Self::ServerError { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } | Self::NotFoundOrForbidden { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkFailure { detail } => write!(f, "Network error: {detail}"),
            Self::Timeout { detail } => write!(f, "Request timeout: {detail}"),
            Self::ServerError {
                status,
                reason,
                message,
            } => {
                if let Some(reason) = reason {
                    write!(f, "Server error (HTTP {status}, {reason}): {message}")
                } else {
                    write!(f, "Server error (HTTP {status}): {message}")
                }
            }
            Self::NotFoundOrForbidden {
                status,
                reason,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "{reason} (HTTP {status}): {msg}")
                } else {
                    write!(f, "{reason} (HTTP {status})")
                }
            }
            Self::ParseError { detail } => write!(f, "Parse error: {detail}"),
            Self::InvalidRequest { detail } => write!(f, "Invalid request: {detail}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Convenience type alias for `Result<T, ApiError>`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_network_failure() {
        let e = ApiError::NetworkFailure {
            detail: "connection refused".to_string(),
        };
        assert_eq!(e.to_string(), "Network error: connection refused");
    }

    #[test]
    fn display_server_error_with_reason() {
        let e = ApiError::ServerError {
            status: 409,
            reason: Some("AlreadyExists".to_string()),
            message: "devopsproject exists".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Server error (HTTP 409, AlreadyExists): devopsproject exists"
        );
    }

    #[test]
    fn display_server_error_without_reason() {
        let e = ApiError::ServerError {
            status: 500,
            reason: None,
            message: "boom".to_string(),
        };
        assert_eq!(e.to_string(), "Server error (HTTP 500): boom");
    }

    #[test]
    fn display_not_found_or_forbidden() {
        let e = ApiError::NotFoundOrForbidden {
            status: 403,
            reason: "Forbidden".to_string(),
            raw_message: None,
        };
        assert_eq!(e.to_string(), "Forbidden (HTTP 403)");
    }

    #[test]
    fn kind_groups_timeouts_with_network_failures() {
        let e = ApiError::Timeout {
            detail: "30s".to_string(),
        };
        assert_eq!(e.kind(), ErrorKind::NetworkFailure);
    }

    #[test]
    fn kind_parse_error_is_server_error() {
        let e = ApiError::ParseError {
            detail: "missing field".to_string(),
        };
        assert_eq!(e.kind(), ErrorKind::ServerError);
    }

    #[test]
    fn expected_errors() {
        assert!(
            ApiError::NotFoundOrForbidden {
                status: 404,
                reason: "Not Found".into(),
                raw_message: None,
            }
            .is_expected()
        );
        assert!(
            ApiError::ServerError {
                status: 422,
                reason: None,
                message: "invalid".into(),
            }
            .is_expected()
        );
        assert!(
            !ApiError::ServerError {
                status: 502,
                reason: None,
                message: "bad gateway".into(),
            }
            .is_expected()
        );
        assert!(!ApiError::NetworkFailure { detail: "x".into() }.is_expected());
    }

    #[test]
    fn serialize_carries_variant_code() {
        let e = ApiError::NotFoundOrForbidden {
            status: 404,
            reason: "Not Found".to_string(),
            raw_message: Some("devopsprojects \"demo\" not found".to_string()),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"code\":\"NotFoundOrForbidden\""));
        assert!(json.contains("\"status\":404"));
    }

    #[test]
    fn status_only_for_answered_requests() {
        assert_eq!(
            ApiError::ServerError {
                status: 500,
                reason: None,
                message: String::new(),
            }
            .status(),
            Some(500)
        );
        assert_eq!(ApiError::Timeout { detail: "t".into() }.status(), None);
    }
}
