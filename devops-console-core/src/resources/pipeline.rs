//! 流水线

use std::sync::Arc;

use chrono::{DateTime, Utc};
use devops_console_api::{ApiClient, ApiError, ApiGroup, HttpUtils, ListQuery, ObjectMeta, ResourceScope};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{CoreError, CoreResult};
use crate::resources::devops::{CREATOR_ANNOTATION, DESCRIPTION_ANNOTATION};
use crate::session::SessionContext;
use crate::store::{FetchOutcome, ListOptions, ListResourceStore, ListState, Normalizer};

pub const SYNC_STATUS_ANNOTATION: &str = "pipeline.devops.kubesphere.io/syncstatus";

const RESOURCE: &str = "pipelines";
const MODULE: &str = "pipelines";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineKind {
    #[default]
    #[serde(rename = "pipeline")]
    Pipeline,
    #[serde(rename = "multi-branch-pipeline")]
    MultiBranch,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMultiBranchSpec {
    #[serde(default)]
    pub source_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPipelineSpec {
    #[serde(rename = "type", default)]
    pub kind: PipelineKind,
    #[serde(default)]
    pub multi_branch_pipeline: Option<RawMultiBranchSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPipeline {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: RawPipelineSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub name: String,
    pub kind: PipelineKind,
    pub description: Option<String>,
    pub creator: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    /// 多分支流水线的代码仓库类型（git、github 等）
    pub scm_source: Option<String>,
    pub sync_status: Option<String>,
}

impl Pipeline {
    pub fn is_multi_branch(&self) -> bool {
        self.kind == PipelineKind::MultiBranch
    }
}

pub struct PipelineNormalizer;

impl Normalizer for PipelineNormalizer {
    type Raw = RawPipeline;
    type Record = Pipeline;

    fn normalize(&self, raw: RawPipeline) -> Pipeline {
        let meta = raw.metadata;
        Pipeline {
            kind: raw.spec.kind,
            scm_source: raw
                .spec
                .multi_branch_pipeline
                .and_then(|mb| mb.source_type)
                .filter(|s| !s.is_empty()),
            description: meta.annotation(DESCRIPTION_ANNOTATION).map(str::to_string),
            creator: meta.annotation(CREATOR_ANNOTATION).map(str::to_string),
            sync_status: meta.annotation(SYNC_STATUS_ANNOTATION).map(str::to_string),
            create_time: meta.creation_timestamp,
            name: meta.name,
        }
    }
}

/// 流水线详情侧栏中的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PipelineOperation {
    Edit,
    EditConfig,
    Scan,
    ScanLogs,
    Delete,
}

impl PipelineOperation {
    pub fn key(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::EditConfig => "editConfig",
            Self::Scan => "scan",
            Self::ScanLogs => "scanLogs",
            Self::Delete => "delete",
        }
    }

    /// 权限规则中对应的动作
    pub fn required_action(self) -> &'static str {
        match self {
            Self::Edit | Self::EditConfig => "edit",
            Self::Scan | Self::ScanLogs => "trigger",
            Self::Delete => "delete",
        }
    }
}

pub struct PipelineStore {
    client: Arc<dyn ApiClient>,
    session: Arc<SessionContext>,
    list: ListResourceStore<PipelineNormalizer>,
}

impl PipelineStore {
    #[must_use]
    pub fn new(client: Arc<dyn ApiClient>, session: Arc<SessionContext>) -> Self {
        let list = ListResourceStore::new(client.clone(), ApiGroup::Devops, RESOURCE, PipelineNormalizer);
        Self {
            client,
            session,
            list,
        }
    }

    pub fn list(&self) -> &ListResourceStore<PipelineNormalizer> {
        &self.list
    }

    pub fn state(&self) -> ListState<Pipeline> {
        self.list.state()
    }

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

    /// 获取流水线详情，不存在时返回 `NotFoundOrForbidden`
    pub async fn fetch_detail(
        &self,
        cluster: Option<&str>,
        devops: &str,
        name: &str,
    ) -> CoreResult<Pipeline> {
        let body = self.fetch_config(cluster, devops, name).await?;
        let raw: RawPipeline = HttpUtils::from_value(body)?;
        Ok(PipelineNormalizer.normalize(raw))
    }

    /// 获取完整的流水线对象，用于编辑配置
    pub async fn fetch_config(
        &self,
        cluster: Option<&str>,
        devops: &str,
        name: &str,
    ) -> CoreResult<Value> {
        let url = item_url(cluster, devops, name);
        Ok(self.client.get(&url, &[]).await?)
    }

    /// 以 `metadata.name` 定位并整体更新流水线
    pub async fn update(
        &self,
        cluster: Option<&str>,
        devops: &str,
        config: &Value,
    ) -> CoreResult<Pipeline> {
        let name = config
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                CoreError::ValidationError("pipeline config has no metadata.name".to_string())
            })?;

        let url = item_url(cluster, devops, name);
        let updated = self.client.put(&url, config).await?;
        let raw: RawPipeline = HttpUtils::from_value(updated)?;
        log::info!("Updated pipeline {name} in {devops}");
        Ok(PipelineNormalizer.normalize(raw))
    }

    pub async fn delete(&self, cluster: Option<&str>, devops: &str, name: &str) -> CoreResult<()> {
        self.client.delete(&item_url(cluster, devops, name)).await?;
        log::info!("Deleted pipeline {name} in {devops}");
        Ok(())
    }

    /// 触发多分支流水线扫描仓库
    pub async fn scan_repository(
        &self,
        cluster: Option<&str>,
        devops: &str,
        pipeline: &Pipeline,
    ) -> CoreResult<()> {
        if !pipeline.is_multi_branch() {
            return Err(CoreError::ValidationError(format!(
                "pipeline '{}' is not a multi-branch pipeline",
                pipeline.name
            )));
        }
        let url = format!(
            "{}/scan",
            ApiGroup::DevopsLegacy.item_url(&scope(cluster, devops), RESOURCE, &pipeline.name)
        );
        self.client.post(&url, &json!({})).await.map_err(|e| {
            if let ApiError::NotFoundOrForbidden { .. } = e {
                log::warn!("Scan of {} rejected: {e}", pipeline.name);
            }
            CoreError::from(e)
        })?;
        Ok(())
    }

    /// 详情侧栏的操作列表，按当前用户在项目内的权限过滤
    pub fn operations(&self, detail: &Pipeline, devops: &str) -> Vec<PipelineOperation> {
        let enabled = self.session.enabled_actions(MODULE, Some(devops));

        let mut list = vec![PipelineOperation::Edit, PipelineOperation::EditConfig];
        if detail.scm_source.is_some() {
            list.push(PipelineOperation::Scan);
            list.push(PipelineOperation::ScanLogs);
        }
        list.push(PipelineOperation::Delete);

        list.retain(|op| enabled.iter().any(|a| a == op.required_action()));
        list
    }
}

fn scope(cluster: Option<&str>, devops: &str) -> ResourceScope {
    ResourceScope::new().maybe_cluster(cluster).devops(devops)
}

fn item_url(cluster: Option<&str>, devops: &str, name: &str) -> String {
    ApiGroup::Devops.item_url(&scope(cluster, devops), RESOURCE, name)
}
