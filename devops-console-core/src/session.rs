//! Session context
//!
//! The current user, their authorization rules and the static console
//! configuration, built once at login and passed to every store and screen
//! explicitly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ConsoleConfig;

/// Module name -> actions allowed on that module.
pub type RuleSet = BTreeMap<String, Vec<String>>;

/// Every action a rule can grant.
pub const ALL_ACTIONS: &[&str] = &["view", "create", "edit", "delete", "manage", "trigger"];

/// Authenticated user and the rules the control plane granted them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub username: String,
    /// Rules that apply outside of any DevOps project.
    #[serde(default)]
    pub global_rules: RuleSet,
    /// Per-project rules, keyed by project id.
    #[serde(default)]
    pub project_rules: BTreeMap<String, RuleSet>,
    /// Cluster administrators may perform every action everywhere.
    #[serde(default)]
    pub cluster_admin: bool,
}

/// Immutable per-login context. Share it through `Arc`.
#[derive(Debug, Clone)]
pub struct SessionContext {
    user: SessionUser,
    config: ConsoleConfig,
}

impl SessionContext {
    pub fn new(user: SessionUser, config: ConsoleConfig) -> Self {
        Self { user, config }
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// New context with `rules` recorded for `project`. The receiver is left untouched.
    #[must_use]
    pub fn with_project_rules(&self, project: impl Into<String>, rules: RuleSet) -> Self {
        let mut user = self.user.clone();
        user.project_rules.insert(project.into(), rules);
        Self {
            user,
            config: self.config.clone(),
        }
    }

    /// Actions the user may perform on `module`, inside `project` if given.
    ///
    /// Project rules win once they have been fetched for that project;
    /// otherwise the global rules apply.
    pub fn enabled_actions(&self, module: &str, project: Option<&str>) -> Vec<String> {
        if self.user.cluster_admin {
            return ALL_ACTIONS.iter().map(|a| (*a).to_string()).collect();
        }

        let rules = project
            .and_then(|p| self.user.project_rules.get(p))
            .unwrap_or(&self.user.global_rules);

        rules.get(module).cloned().unwrap_or_default()
    }

    pub fn can(&self, module: &str, project: Option<&str>, action: &str) -> bool {
        self.enabled_actions(module, project)
            .iter()
            .any(|a| a == action)
    }

    /// Built-in roles are read-only.
    pub fn is_preset_role(&self, name: &str) -> bool {
        self.config.preset_roles.iter().any(|r| r == name)
    }
}
