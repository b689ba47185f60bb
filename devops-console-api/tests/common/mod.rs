//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::env;

use devops_console_api::{HttpClientConfig, ReqwestApiClient, ResourceScope};

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_server {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("跳过测试: 缺少环境变量 {}", $var);
                return;
            }
        )+
    };
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 测试上下文 - 封装客户端和测试集群
pub struct TestContext {
    pub client: ReqwestApiClient,
    pub cluster: Option<String>,
}

impl TestContext {
    /// 从环境变量创建测试上下文
    ///
    /// - `DEVOPS_CONSOLE_API_URL`（必需）
    /// - `DEVOPS_CONSOLE_TOKEN`（可选）
    /// - `TEST_CLUSTER`（可选，多集群环境）
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("DEVOPS_CONSOLE_API_URL").ok()?;
        let mut config = HttpClientConfig::new(base_url);
        config.token = env::var("DEVOPS_CONSOLE_TOKEN").ok();

        let client = ReqwestApiClient::new(&config).ok()?;

        Some(Self {
            client,
            cluster: env::var("TEST_CLUSTER").ok(),
        })
    }

    pub fn scope(&self) -> ResourceScope {
        ResourceScope::new().maybe_cluster(self.cluster.as_deref())
    }
}
