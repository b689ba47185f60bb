//! Resource scoping paths and API group bases.

use serde::{Deserialize, Serialize};

/// Path segments identifying where a collection request is evaluated.
///
/// Scoping always goes into the request path, never into the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceScope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// DevOps project the collection belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devops: Option<String>,
}

impl ResourceScope {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Like [`cluster`](Self::cluster) but accepts an optional value.
    #[must_use]
    pub fn maybe_cluster(mut self, cluster: Option<&str>) -> Self {
        self.cluster = cluster.map(str::to_string);
        self
    }

    #[must_use]
    pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn devops(mut self, devops: impl Into<String>) -> Self {
        self.devops = Some(devops.into());
        self
    }

    /// Render the scope as `/klusters/{c}/workspaces/{w}/namespaces/{n}/devops/{d}`.
    ///
    /// Unset or empty segments are skipped; an empty scope renders as `""`.
    pub fn path(&self) -> String {
        let mut path = String::new();
        let segments = [
            ("klusters", &self.cluster),
            ("workspaces", &self.workspace),
            ("namespaces", &self.namespace),
            ("devops", &self.devops),
        ];
        for (kind, value) in segments {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                path.push('/');
                path.push_str(kind);
                path.push('/');
                path.push_str(value);
            }
        }
        path
    }
}

/// API groups served by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiGroup {
    /// `kapis/devops.kubesphere.io/v1alpha3`: DevOps projects and pipelines.
    Devops,
    /// `kapis/devops.kubesphere.io/v1alpha2`: legacy pipeline operations (scan, config).
    DevopsLegacy,
    /// `kapis/iam.kubesphere.io/v1alpha2`: roles and role templates.
    Iam,
    /// `kapis/tenant.kubesphere.io/v1alpha2`: per-project authorization rules.
    Tenant,
}

impl ApiGroup {
    pub fn base(self) -> &'static str {
        match self {
            Self::Devops => "kapis/devops.kubesphere.io/v1alpha3",
            Self::DevopsLegacy => "kapis/devops.kubesphere.io/v1alpha2",
            Self::Iam => "kapis/iam.kubesphere.io/v1alpha2",
            Self::Tenant => "kapis/tenant.kubesphere.io/v1alpha2",
        }
    }

    /// Collection URL for `resource` under `scope`, e.g.
    /// `kapis/devops.kubesphere.io/v1alpha3/klusters/host/devopsprojects`.
    pub fn collection_url(self, scope: &ResourceScope, resource: &str) -> String {
        format!("{}{}/{resource}", self.base(), scope.path())
    }

    /// URL of the single item `name` inside a collection.
    pub fn item_url(self, scope: &ResourceScope, resource: &str, name: &str) -> String {
        format!("{}/{name}", self.collection_url(scope, resource))
    }
}
