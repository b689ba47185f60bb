//! Generic HTTP client tools
//!
//! Shared request/response handling for [`ReqwestApiClient`](crate::ReqwestApiClient):
//! sending a prepared `RequestBuilder`, logging, turning non-2xx answers into
//! structured [`ApiError`]s, and parsing JSON bodies.
//!
//! Nothing here retries. A failed request is reported to the caller once.

use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::utils::log_sanitizer::truncate_for_log;

/// Reason strings the control plane uses for "scoping resource is gone or hidden".
const NOT_FOUND_OR_FORBIDDEN_REASONS: &[&str] = &["Not Found", "NotFound", "Forbidden"];

/// Kubernetes-style status payload returned with error responses.
#[derive(Debug, Default, Deserialize)]
struct StatusPayload {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP tool function set
pub struct HttpUtils;

impl HttpUtils {
    /// Performs an HTTP request and returns the status code and response text
    ///
    /// # Arguments
    /// * `request_builder` - configured request constructor (URL, headers, body)
    /// * `method_name` - request method name (such as "GET", used for logs)
    /// * `url` - request URL (for logging)
    pub async fn execute_request(
        request_builder: RequestBuilder,
        method_name: &str,
        url: &str,
    ) -> Result<(u16, String), ApiError> {
        log::debug!("{method_name} {url}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    detail: e.to_string(),
                }
            } else {
                ApiError::NetworkFailure {
                    detail: e.to_string(),
                }
            }
        })?;

        let status_code = response.status().as_u16();
        log::debug!("Response Status: {status_code}");

        let response_text = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkFailure {
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!("Response Body: {}", truncate_for_log(&response_text));

        Ok((status_code, response_text))
    }

    /// Turn a status code and body into JSON, or into the matching error.
    ///
    /// An empty 2xx body (typical for DELETE) reads as `null`.
    pub fn into_json(status_code: u16, response_text: &str) -> Result<Value, ApiError> {
        if !(200..300).contains(&status_code) {
            return Err(Self::status_error(status_code, response_text));
        }
        if response_text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Self::parse_json(response_text)
    }

    /// Classify a non-2xx response.
    ///
    /// `404`/`403` and the `Not Found`/`Forbidden` reasons map to
    /// [`ApiError::NotFoundOrForbidden`]; everything else is a
    /// [`ApiError::ServerError`].
    pub fn status_error(status_code: u16, response_text: &str) -> ApiError {
        let payload: StatusPayload = serde_json::from_str(response_text).unwrap_or_default();
        let reason = payload.reason.filter(|r| !r.is_empty());
        let message = payload
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| truncate_for_log(response_text.trim()));

        let reason_hidden = reason
            .as_deref()
            .is_some_and(|r| NOT_FOUND_OR_FORBIDDEN_REASONS.contains(&r));

        if reason_hidden || matches!(status_code, 403 | 404) {
            let reason = reason.unwrap_or_else(|| {
                if status_code == 403 {
                    "Forbidden".to_string()
                } else {
                    "Not Found".to_string()
                }
            });
            log::warn!("Resource unavailable (HTTP {status_code}, {reason})");
            return ApiError::NotFoundOrForbidden {
                status: status_code,
                reason,
                raw_message: (!message.is_empty()).then_some(message),
            };
        }

        log::error!("Server error (HTTP {status_code}): {message}");
        ApiError::ServerError {
            status: status_code,
            reason,
            message,
        }
    }

    /// Parse JSON response
    ///
    /// # Type Parameters
    /// * `T` - target type
    ///
    /// # Returns
    /// * `Ok(T)` - successfully parsed
    /// * `Err(ApiError::ParseError)` - parsing failed
    pub fn parse_json<T>(response_text: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("JSON parse failed: {e}");
            log::error!("Raw response: {}", truncate_for_log(response_text));
            ApiError::ParseError {
                detail: e.to_string(),
            }
        })
    }

    /// Convert an already-parsed JSON value into a typed schema.
    pub fn from_value<T>(value: Value) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(value).map_err(|e| {
            log::error!("Response does not match expected schema: {e}");
            ApiError::ParseError {
                detail: e.to_string(),
            }
        })
    }
}
