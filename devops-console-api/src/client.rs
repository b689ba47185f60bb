use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::http_client::HttpUtils;
use crate::query::encode_query;

/// 默认连接超时（秒）
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// 默认请求超时（秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Control-plane HTTP client.
///
/// Paths are relative to the API root (e.g. `kapis/devops.kubesphere.io/v1alpha3/devopsprojects`).
/// Every method resolves to the decoded JSON body, or `null` for an empty body.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// GET with query parameters.
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value>;

    /// POST a JSON body.
    async fn post(&self, path: &str, body: &Value) -> Result<Value>;

    /// PUT a JSON body.
    async fn put(&self, path: &str, body: &Value) -> Result<Value>;

    /// DELETE.
    async fn delete(&self, path: &str) -> Result<Value>;
}

/// Connection settings for [`ReqwestApiClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpClientConfig {
    /// API root, e.g. `https://console.example.com`.
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

const fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

const fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// [`ApiClient`] backed by `reqwest`.
pub struct ReqwestApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ReqwestApiClient {
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidRequest {
                detail: format!("base URL must be http(s): {}", config.base_url),
            });
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::InvalidRequest {
                detail: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Absolute URL for an API-relative path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, method: &str, url: &str) -> Result<Value> {
        let (status, text) =
            HttpUtils::execute_request(self.authorize(builder), method, url).await?;
        HttpUtils::into_json(status, &text)
    }
}

#[async_trait]
impl ApiClient for ReqwestApiClient {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let mut url = self.url(path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&encode_query(query));
        }
        self.send(self.client.get(&url), "GET", &url).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        self.send(self.client.post(&url).json(body), "POST", &url)
            .await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        self.send(self.client.put(&url).json(body), "PUT", &url)
            .await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        self.send(self.client.delete(&url), "DELETE", &url).await
    }
}
