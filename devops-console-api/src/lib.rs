//! # devops-console-api
//!
//! Client-side building blocks for talking to the DevOps platform control
//! plane: the [`ApiClient`] seam, list query construction, resource scoping
//! paths and a structured error taxonomy.
//!
//! ## Feature Flags
//!
//! - **`native-tls`** *(default)*: Use the platform's native TLS implementation.
//! - **`rustls`**: Use rustls. Recommended for static and cross-compiled builds.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use devops_console_api::{
//!     ApiClient, ApiGroup, HttpClientConfig, Limit, ListQuery, ReqwestApiClient, ResourceScope,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ReqwestApiClient::new(&HttpClientConfig::new("https://console.example.com"))?;
//!
//!     let scope = ResourceScope::new().cluster("host");
//!     let url = ApiGroup::Devops.collection_url(&scope, "devopsprojects");
//!     let query = ListQuery {
//!         limit: Limit::Paged(20),
//!         keyword: Some("ci".to_string()),
//!         ..Default::default()
//!     };
//!
//!     let body = client.get(&url, &query.to_params()).await?;
//!     println!("{body}");
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every call returns [`Result<T, ApiError>`](ApiError). Callers usually
//! branch on [`ApiError::kind`]:
//!
//! - [`ErrorKind::NetworkFailure`]: the request or response never made it
//! - [`ErrorKind::ServerError`]: non-2xx answer or unusable payload
//! - [`ErrorKind::NotFoundOrForbidden`]: the scoping resource is gone or hidden
//!
//! Requests are never retried automatically.

mod client;
mod error;
mod http_client;
mod query;
mod scope;
mod types;
mod utils;

pub use client::{
    ApiClient, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, HttpClientConfig,
    ReqwestApiClient,
};
pub use error::{ApiError, ErrorKind, Result};
pub use http_client::HttpUtils;
pub use query::{Condition, DEFAULT_LIMIT, FilterExpression, Limit, ListQuery, MatchMode, encode_query};
pub use scope::{ApiGroup, ResourceScope};
pub use types::{BatchDeleteFailure, BatchDeleteResult, ListResponse, ObjectMeta};
pub use utils::log_sanitizer;
