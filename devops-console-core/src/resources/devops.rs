//! DevOps 项目

use std::sync::Arc;

use chrono::{DateTime, Utc};
use devops_console_api::{
    ApiClient, ApiError, ApiGroup, BatchDeleteFailure, BatchDeleteResult, HttpUtils, ListQuery,
    ObjectMeta, ResourceScope,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{CoreError, CoreResult};
use crate::session::{RuleSet, SessionContext};
use crate::store::{FetchOutcome, ListOptions, ListResourceStore, ListState, Normalizer};

/// 项目所属企业空间的标签
pub const WORKSPACE_LABEL: &str = "kubesphere.io/workspace";
pub const DESCRIPTION_ANNOTATION: &str = "kubesphere.io/description";
pub const CREATOR_ANNOTATION: &str = "kubesphere.io/creator";

const RESOURCE: &str = "devopsprojects";
/// 服务端为项目 id 生成的随机后缀长度
const GENERATED_SUFFIX_LEN: usize = 5;

// ===== 数据类型 =====

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDevOpsProjectStatus {
    #[serde(default)]
    pub admin_namespace: Option<String>,
}

/// 服务端返回的 DevOps 项目对象
#[derive(Debug, Clone, Deserialize)]
pub struct RawDevOpsProject {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: RawDevOpsProjectStatus,
}

/// 列表与详情页使用的 DevOps 项目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevOpsProject {
    pub name: String,
    /// 项目 id（即项目的管理命名空间）
    pub project_id: String,
    pub workspace: Option<String>,
    pub description: Option<String>,
    pub creator: Option<String>,
    pub uid: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
}

pub struct DevOpsNormalizer;

impl Normalizer for DevOpsNormalizer {
    type Raw = RawDevOpsProject;
    type Record = DevOpsProject;

    fn normalize(&self, raw: RawDevOpsProject) -> DevOpsProject {
        let meta = raw.metadata;
        DevOpsProject {
            project_id: raw
                .status
                .admin_namespace
                .unwrap_or_else(|| meta.name.clone()),
            workspace: meta.label(WORKSPACE_LABEL).map(str::to_string),
            description: meta.annotation(DESCRIPTION_ANNOTATION).map(str::to_string),
            creator: meta.annotation(CREATOR_ANNOTATION).map(str::to_string),
            uid: meta.uid,
            create_time: meta.creation_timestamp,
            name: meta.name,
        }
    }
}

/// 创建 DevOps 项目请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDevOpsProjectRequest {
    /// 名称前缀，服务端会追加随机后缀生成项目 id
    pub name: String,
    pub description: Option<String>,
    pub creator: Option<String>,
}

/// 项目内置角色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultRole {
    pub name: String,
    /// 界面文案的翻译 key（`pipeline_<name>`）
    #[serde(default)]
    pub description_key: String,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    name: String,
    #[serde(default)]
    actions: Vec<String>,
}

// ===== DevOpsStore =====

/// DevOps 项目列表、详情与增删改
pub struct DevOpsStore {
    client: Arc<dyn ApiClient>,
    session: Arc<SessionContext>,
    list: ListResourceStore<DevOpsNormalizer>,
}

impl DevOpsStore {
    #[must_use]
    pub fn new(client: Arc<dyn ApiClient>, session: Arc<SessionContext>) -> Self {
        let list = ListResourceStore::new(client.clone(), ApiGroup::Devops, RESOURCE, DevOpsNormalizer);
        Self {
            client,
            session,
            list,
        }
    }

    pub fn list(&self) -> &ListResourceStore<DevOpsNormalizer> {
        &self.list
    }

    pub fn state(&self) -> ListState<DevOpsProject> {
        self.list.state()
    }

    /// 获取项目列表。企业空间通过标签过滤，而不是路径。
    pub async fn fetch_list(
        &self,
        cluster: Option<&str>,
        workspace: Option<&str>,
        mut query: ListQuery,
    ) -> CoreResult<FetchOutcome> {
        if let Some(ws) = workspace.filter(|w| !w.is_empty()) {
            query.label_selector = Some(format!("{WORKSPACE_LABEL}={ws}"));
        }
        self.list
            .fetch_list(ListOptions {
                scope: ResourceScope::new().maybe_cluster(cluster),
                query,
            })
            .await
    }

    /// 按项目 id 获取详情
    ///
    /// 项目名是项目 id 去掉生成的 5 位后缀。项目不存在或无权访问时返回
    /// `NotFoundOrForbidden`，调用方据此跳转。
    pub async fn fetch_detail(
        &self,
        cluster: Option<&str>,
        project_id: &str,
    ) -> CoreResult<DevOpsProject> {
        let name = project_name(project_id)?;
        let url = self.item_url(cluster, name);

        let body = self.client.get(&url, &[]).await.inspect_err(|e| {
            if e.kind() == devops_console_api::ErrorKind::NotFoundOrForbidden {
                log::warn!("DevOps project {project_id} is gone or hidden: {e}");
            }
        })?;
        let raw: RawDevOpsProject = HttpUtils::from_value(body)?;
        Ok(DevOpsNormalizer.normalize(raw))
    }

    /// 创建项目
    pub async fn create(
        &self,
        request: CreateDevOpsProjectRequest,
        cluster: Option<&str>,
        workspace: &str,
    ) -> CoreResult<DevOpsProject> {
        if request.name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "project name must not be empty".to_string(),
            ));
        }

        let mut annotations = serde_json::Map::new();
        if let Some(description) = request.description.filter(|d| !d.is_empty()) {
            annotations.insert(DESCRIPTION_ANNOTATION.to_string(), Value::String(description));
        }
        let creator = request
            .creator
            .unwrap_or_else(|| self.session.user().username.clone());
        if !creator.is_empty() {
            annotations.insert(CREATOR_ANNOTATION.to_string(), Value::String(creator));
        }

        let body = json!({
            "apiVersion": "devops.kubesphere.io/v1alpha3",
            "kind": "DevOpsProject",
            "metadata": {
                "generateName": request.name,
                "labels": { WORKSPACE_LABEL: workspace },
                "annotations": annotations,
            },
        });

        let url = self.list.collection_url(&ResourceScope::new().maybe_cluster(cluster));
        let created = self.client.post(&url, &body).await?;
        let raw: RawDevOpsProject = HttpUtils::from_value(created)?;
        log::info!("Created DevOps project {} in {workspace}", raw.metadata.name);
        Ok(DevOpsNormalizer.normalize(raw))
    }

    /// 修改项目描述
    ///
    /// 先取最新对象再整体 PUT，未知字段原样保留。
    pub async fn update_description(
        &self,
        cluster: Option<&str>,
        name: &str,
        description: &str,
    ) -> CoreResult<DevOpsProject> {
        let url = self.item_url(cluster, name);
        let mut object = self.client.get(&url, &[]).await?;

        let metadata = object
            .get_mut("metadata")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| {
                CoreError::Api(ApiError::ParseError {
                    detail: format!("DevOps project {name} has no metadata"),
                })
            })?;
        let annotations = metadata
            .entry("annotations")
            .or_insert_with(|| json!({}));
        if !annotations.is_object() {
            *annotations = json!({});
        }
        annotations[DESCRIPTION_ANNOTATION] = Value::String(description.to_string());

        let updated = self.client.put(&url, &object).await?;
        let raw: RawDevOpsProject = HttpUtils::from_value(updated)?;
        Ok(DevOpsNormalizer.normalize(raw))
    }

    /// 删除项目
    pub async fn delete(&self, cluster: Option<&str>, name: &str) -> CoreResult<()> {
        self.client.delete(&self.item_url(cluster, name)).await?;
        log::info!("Deleted DevOps project {name}");
        Ok(())
    }

    /// 批量删除项目，单个失败不影响其余
    pub async fn batch_delete(
        &self,
        cluster: Option<&str>,
        names: &[String],
    ) -> CoreResult<BatchDeleteResult> {
        let delete_futures: Vec<_> = names
            .iter()
            .map(|name| async move {
                match self.delete(cluster, name).await {
                    Ok(()) => Ok(name.clone()),
                    Err(e) => Err((name.clone(), e)),
                }
            })
            .collect();

        let results = futures::future::join_all(delete_futures).await;

        let mut success_count = 0;
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(_) => success_count += 1,
                Err((name, e)) => {
                    log::warn!("Failed to delete DevOps project {name}: {e}");
                    failures.push(BatchDeleteFailure {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(BatchDeleteResult {
            success_count,
            failed_count: failures.len(),
            failures,
        })
    }

    /// 获取当前用户在项目内的权限规则
    ///
    /// 请求失败时按无权限处理，返回空规则。系统企业空间的项目使用配置中的
    /// 固定规则，未配置的模块给 `view` 和 `edit`。
    pub async fn fetch_rules(&self, cluster: Option<&str>, project_id: &str) -> RuleSet {
        let scope = ResourceScope::new().maybe_cluster(cluster).devops(project_id);
        let url = ApiGroup::Tenant.collection_url(&scope, "rules");

        let rules = match self.client.get(&url, &[]).await {
            Ok(body) => HttpUtils::from_value::<Option<Vec<RawRule>>>(body),
            Err(e) => Err(e),
        };
        let rules = match rules {
            Ok(rules) => rules.unwrap_or_default(),
            Err(e) => {
                log::warn!("Failed to fetch rules for {project_id}: {e}");
                return RuleSet::new();
            }
        };

        let config = self.session.config();
        let is_system = project_id == config.system_workspace;
        rules
            .into_iter()
            .map(|rule| {
                let actions = if is_system {
                    config
                        .system_workspace_project_rules
                        .get(&rule.name)
                        .cloned()
                        .unwrap_or_else(|| vec!["view".to_string(), "edit".to_string()])
                } else {
                    rule.actions
                };
                (rule.name, actions)
            })
            .collect()
    }

    /// 获取项目的内置角色
    pub async fn fetch_default_roles(
        &self,
        cluster: Option<&str>,
        project_id: &str,
    ) -> CoreResult<Vec<DefaultRole>> {
        let url = format!("{}/defaultroles", self.item_url(cluster, project_id));
        let body = self.client.get(&url, &[]).await?;
        if !body.is_array() {
            log::debug!("Default roles of {project_id} are not a list, treating as none");
            return Ok(Vec::new());
        }
        let mut roles: Vec<DefaultRole> = HttpUtils::from_value(body)?;
        for role in &mut roles {
            role.description_key = format!("pipeline_{}", role.name);
        }
        Ok(roles)
    }

    fn item_url(&self, cluster: Option<&str>, name: &str) -> String {
        ApiGroup::Devops.item_url(&ResourceScope::new().maybe_cluster(cluster), RESOURCE, name)
    }
}

/// 项目 id 去掉生成后缀得到项目名
fn project_name(project_id: &str) -> CoreResult<&str> {
    let chars = project_id.chars().count();
    if chars <= GENERATED_SUFFIX_LEN {
        return Err(CoreError::ValidationError(format!(
            "project id '{project_id}' is too short to carry a generated suffix"
        )));
    }
    let cut = project_id
        .char_indices()
        .nth(chars - GENERATED_SUFFIX_LEN)
        .map_or(project_id.len(), |(i, _)| i);
    Ok(&project_id[..cut])
}
