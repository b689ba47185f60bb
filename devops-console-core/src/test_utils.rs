//! 测试辅助模块
//!
//! 提供 mock `ApiClient` 和便捷的测试工厂方法。

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use devops_console_api::{ApiClient, ApiError, Result};
use serde_json::{json, Value};
use tokio::sync::{oneshot, Mutex};

use crate::config::ConsoleConfig;
use crate::session::{SessionContext, SessionUser};

/// 一次被记录下来的请求
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

struct Hold {
    arrived: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

// ===== MockApiClient =====

/// 按 (method, path) 排队返回预设响应。
///
/// 队列中最后一个响应会被重复使用；未配置的路由返回 404。
pub struct MockApiClient {
    routes: Mutex<HashMap<(&'static str, String), VecDeque<Result<Value>>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    holds: Mutex<VecDeque<Hold>>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            holds: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn respond(&self, method: &'static str, path: &str, response: Result<Value>) {
        self.routes
            .lock()
            .await
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    pub async fn respond_ok(&self, method: &'static str, path: &str, body: Value) {
        self.respond(method, path, Ok(body)).await;
    }

    /// 下一个请求在返回前挂起，直到测试释放它。
    ///
    /// 返回 (请求已到达, 释放)。响应在挂起前就已出队，
    /// 所以之后为同一路由排队的响应属于后续请求。
    pub async fn hold_next_request(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (arrived_tx, arrived_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.holds.lock().await.push_back(Hold {
            arrived: arrived_tx,
            release: release_rx,
        });
        (arrived_rx, release_tx)
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().await.last().cloned()
    }

    async fn dispatch(
        &self,
        method: &'static str,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        self.requests.lock().await.push(RecordedRequest {
            method,
            path: path.to_string(),
            query: query.to_vec(),
            body: body.cloned(),
        });

        let response = {
            let mut routes = self.routes.lock().await;
            match routes.get_mut(&(method, path.to_string())) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        let hold = self.holds.lock().await.pop_front();
        if let Some(hold) = hold {
            let _ = hold.arrived.send(());
            let _ = hold.release.await;
        }

        response.unwrap_or_else(|| {
            Err(ApiError::NotFoundOrForbidden {
                status: 404,
                reason: "Not Found".to_string(),
                raw_message: Some(format!("no mock route for {method} {path}")),
            })
        })
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        self.dispatch("GET", path, query, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.dispatch("POST", path, &[], Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.dispatch("PUT", path, &[], Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.dispatch("DELETE", path, &[], None).await
    }
}

// ===== 工厂方法 =====

pub fn mock_client() -> Arc<MockApiClient> {
    Arc::new(MockApiClient::new())
}

/// `{ items, total_count }` 列表响应体
pub fn list_body(items: Vec<Value>, total_count: Option<u64>) -> Value {
    match total_count {
        Some(total) => json!({ "items": items, "total_count": total }),
        None => json!({ "items": items }),
    }
}

/// 只有 metadata 的最小 Kubernetes 对象
pub fn object(name: &str) -> Value {
    json!({ "metadata": { "name": name } })
}

pub fn server_error(status: u16) -> ApiError {
    ApiError::ServerError {
        status,
        reason: Some("InternalError".to_string()),
        message: "boom".to_string(),
    }
}

pub fn forbidden() -> ApiError {
    ApiError::NotFoundOrForbidden {
        status: 403,
        reason: "Forbidden".to_string(),
        raw_message: None,
    }
}

pub fn test_user(username: &str) -> SessionUser {
    SessionUser {
        username: username.to_string(),
        ..SessionUser::default()
    }
}

pub fn test_session(user: SessionUser) -> Arc<SessionContext> {
    Arc::new(SessionContext::new(user, ConsoleConfig::default()))
}
