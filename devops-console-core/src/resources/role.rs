//! DevOps 项目角色

use std::sync::Arc;

use chrono::{DateTime, Utc};
use devops_console_api::{ApiClient, ApiGroup, Limit, ListQuery, ObjectMeta, ResourceScope};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::resources::devops::{CREATOR_ANNOTATION, DESCRIPTION_ANNOTATION};
use crate::session::SessionContext;
use crate::store::{FetchOutcome, ListOptions, ListResourceStore, ListState, Normalizer};

pub const AGGREGATION_ROLES_ANNOTATION: &str = "iam.kubesphere.io/aggregation-roles";
pub const ROLE_TEMPLATE_LABEL: &str = "iam.kubesphere.io/role-template";

const RESOURCE: &str = "roles";
const MODULE: &str = "roles";

#[derive(Debug, Clone, Deserialize)]
pub struct RawRole {
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: String,
    pub description: Option<String>,
    pub creator: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    /// 聚合的角色模板名
    pub aggregation_roles: Vec<String>,
}

pub struct RoleNormalizer;

impl Normalizer for RoleNormalizer {
    type Raw = RawRole;
    type Record = Role;

    fn normalize(&self, raw: RawRole) -> Role {
        let meta = raw.metadata;
        // 注解里是 JSON 数组字符串，解析失败按空处理
        let aggregation_roles = meta
            .annotation(AGGREGATION_ROLES_ANNOTATION)
            .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
            .unwrap_or_default();
        Role {
            description: meta.annotation(DESCRIPTION_ANNOTATION).map(str::to_string),
            creator: meta.annotation(CREATOR_ANNOTATION).map(str::to_string),
            create_time: meta.creation_timestamp,
            aggregation_roles,
            name: meta.name,
        }
    }
}

/// 角色列表行上可用的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleAction {
    Edit,
    EditRole,
    Delete,
}

impl RoleAction {
    /// 权限规则中对应的动作
    pub fn required_action(self) -> &'static str {
        match self {
            Self::Edit | Self::EditRole => "edit",
            Self::Delete => "delete",
        }
    }
}

/// 项目角色与角色模板
pub struct RoleStore {
    client: Arc<dyn ApiClient>,
    session: Arc<SessionContext>,
    list: ListResourceStore<RoleNormalizer>,
    templates: ListResourceStore<RoleNormalizer>,
}

impl RoleStore {
    #[must_use]
    pub fn new(client: Arc<dyn ApiClient>, session: Arc<SessionContext>) -> Self {
        Self {
            list: ListResourceStore::new(client.clone(), ApiGroup::Iam, RESOURCE, RoleNormalizer),
            templates: ListResourceStore::new(
                client.clone(),
                ApiGroup::Iam,
                RESOURCE,
                RoleNormalizer,
            ),
            client,
            session,
        }
    }

    pub fn list(&self) -> &ListResourceStore<RoleNormalizer> {
        &self.list
    }

    pub fn state(&self) -> ListState<Role> {
        self.list.state()
    }

    pub fn templates(&self) -> ListState<Role> {
        self.templates.state()
    }

    /// 获取项目下的角色列表
    pub async fn fetch_list(
        &self,
        cluster: Option<&str>,
        devops: &str,
        query: ListQuery,
    ) -> CoreResult<FetchOutcome> {
        self.list
            .fetch_list(ListOptions {
                scope: scope(cluster, devops),
                query,
            })
            .await
    }

    /// 获取全部角色模板（不分页）
    pub async fn fetch_role_templates(
        &self,
        cluster: Option<&str>,
        devops: &str,
    ) -> CoreResult<FetchOutcome> {
        let options = ListOptions::new(scope(cluster, devops))
            .limit(Limit::Unlimited)
            .label_selector(format!("{ROLE_TEMPLATE_LABEL}=true"));
        self.templates.fetch_list(options).await
    }

    /// 删除角色。内置角色不可删除，直接拒绝。
    pub async fn delete(&self, cluster: Option<&str>, devops: &str, name: &str) -> CoreResult<()> {
        if self.is_preset_role(name) {
            return Err(CoreError::ValidationError(format!(
                "role '{name}' is built in and cannot be deleted"
            )));
        }
        let url = ApiGroup::Iam.item_url(&scope(cluster, devops), RESOURCE, name);
        self.client.delete(&url).await?;
        log::info!("Deleted role {name} in {devops}");
        Ok(())
    }

    pub fn is_preset_role(&self, name: &str) -> bool {
        self.session.is_preset_role(name)
    }

    /// 某一行可用的操作：按项目权限过滤，内置角色只能编辑基本信息。
    pub fn item_actions(&self, role: &Role, devops: &str) -> Vec<RoleAction> {
        let enabled = self.session.enabled_actions(MODULE, Some(devops));
        let preset = self.is_preset_role(&role.name);
        [RoleAction::Edit, RoleAction::EditRole, RoleAction::Delete]
            .into_iter()
            .filter(|a| !preset || *a == RoleAction::Edit)
            .filter(|a| enabled.iter().any(|e| e == a.required_action()))
            .collect()
    }
}

fn scope(cluster: Option<&str>, devops: &str) -> ResourceScope {
    ResourceScope::new().maybe_cluster(cluster).devops(devops)
}
