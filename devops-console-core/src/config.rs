//! Static console configuration

use std::collections::BTreeMap;

use devops_console_api::{HttpClientConfig, Limit, DEFAULT_LIMIT};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::session::RuleSet;

/// Console configuration shared by every screen.
///
/// Serialized as camelCase JSON; every field except `api.baseUrl` has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    /// Control-plane connection settings.
    pub api: HttpClientConfig,
    /// Cluster used when a command does not name one (multi-cluster setups).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_cluster: Option<String>,
    /// Page size for list screens.
    pub default_limit: u32,
    /// Workspace whose projects get fixed authorization rules.
    pub system_workspace: String,
    /// Module -> actions granted inside the system workspace's projects.
    pub system_workspace_project_rules: RuleSet,
    /// Built-in roles that cannot be edited or deleted.
    pub preset_roles: Vec<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api: HttpClientConfig::new("http://127.0.0.1:9090"),
            default_cluster: None,
            default_limit: DEFAULT_LIMIT,
            system_workspace: "system-workspace".to_string(),
            system_workspace_project_rules: BTreeMap::new(),
            preset_roles: vec![
                "admin".to_string(),
                "operator".to_string(),
                "viewer".to_string(),
            ],
        }
    }
}

impl ConsoleConfig {
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CoreError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::SerializationError(e.to_string()))
    }

    /// Reject values no request could succeed with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(CoreError::ConfigError("api.baseUrl is empty".to_string()));
        }
        if self.default_limit == 0 {
            return Err(CoreError::ConfigError(
                "defaultLimit must be at least 1".to_string(),
            ));
        }
        if self.api.request_timeout_secs == 0 || self.api.connect_timeout_secs == 0 {
            return Err(CoreError::ConfigError("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Page size for list screens as a [`Limit`].
    pub fn list_limit(&self) -> Limit {
        Limit::Paged(self.default_limit)
    }
}
