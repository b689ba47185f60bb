//! Command execution over the core stores

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use devops_console_api::{ApiClient, Limit, ReqwestApiClient};
use devops_console_core::resources::{
    CreateDevOpsProjectRequest, DevOpsStore, PipelineStore, RoleStore,
};
use devops_console_core::{ConsoleConfig, FetchOutcome, ListState, SessionContext, SessionUser};
use serde::Serialize;

use crate::cli::{ConfigAction, PipelineAction, ProjectAction, RoleCommand};
use crate::config;

/// Everything a command needs: the API client, the session and output options.
pub struct App {
    client: Arc<dyn ApiClient>,
    session: Arc<SessionContext>,
    cluster: Option<String>,
    json: bool,
}

impl App {
    pub fn new(
        config: ConsoleConfig,
        user: Option<String>,
        cluster: Option<String>,
        json: bool,
    ) -> Result<Self> {
        let client = ReqwestApiClient::new(&config.api).context("cannot create API client")?;
        let cluster = cluster.or_else(|| config.default_cluster.clone());
        let user = SessionUser {
            username: user.unwrap_or_default(),
            ..SessionUser::default()
        };
        Ok(Self {
            client: Arc::new(client),
            session: Arc::new(SessionContext::new(user, config)),
            cluster,
            json,
        })
    }

    fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    fn default_limit(&self) -> Limit {
        self.session.config().list_limit()
    }

    fn print_json<T: Serialize>(value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub async fn projects(&self, action: ProjectAction) -> Result<()> {
        let store = DevOpsStore::new(self.client.clone(), self.session.clone());

        match action {
            ProjectAction::List { workspace, list } => {
                let outcome = store
                    .fetch_list(
                        self.cluster(),
                        workspace.as_deref(),
                        list.to_query(self.default_limit()),
                    )
                    .await?;
                log_outcome(outcome);
                let state = store.state();
                if self.json {
                    return Self::print_json(&state);
                }
                println!("{:<32} {:<24} {:<20} {:<20}", "NAME", "PROJECT ID", "WORKSPACE", "CREATED");
                for p in &state.items {
                    println!(
                        "{:<32} {:<24} {:<20} {:<20}",
                        p.name,
                        p.project_id,
                        p.workspace.as_deref().unwrap_or("-"),
                        format_time(p.create_time)
                    );
                }
                print_footer(&state);
            }
            ProjectAction::Show { project_id } => {
                let project = store.fetch_detail(self.cluster(), &project_id).await?;
                if self.json {
                    return Self::print_json(&project);
                }
                println!("Name:        {}", project.name);
                println!("Project ID:  {}", project.project_id);
                println!("Workspace:   {}", project.workspace.as_deref().unwrap_or("-"));
                println!("Creator:     {}", project.creator.as_deref().unwrap_or("-"));
                println!("Created:     {}", format_time(project.create_time));
                println!("Description: {}", project.description.as_deref().unwrap_or("-"));
            }
            ProjectAction::Create {
                name,
                workspace,
                description,
            } => {
                let request = CreateDevOpsProjectRequest {
                    name,
                    description,
                    creator: None,
                };
                let project = store.create(request, self.cluster(), &workspace).await?;
                if self.json {
                    return Self::print_json(&project);
                }
                println!("Created {} ({})", project.name, project.project_id);
            }
            ProjectAction::Describe { name, description } => {
                let project = store
                    .update_description(self.cluster(), &name, &description)
                    .await?;
                if self.json {
                    return Self::print_json(&project);
                }
                println!("Updated description of {}", project.name);
            }
            ProjectAction::Delete { names } => {
                let result = store.batch_delete(self.cluster(), &names).await?;
                if self.json {
                    return Self::print_json(&result);
                }
                println!(
                    "Deleted {} project(s), {} failed",
                    result.success_count, result.failed_count
                );
                for failure in &result.failures {
                    println!("  {}: {}", failure.name, failure.reason);
                }
            }
            ProjectAction::Rules { project_id } => {
                let rules = store.fetch_rules(self.cluster(), &project_id).await;
                if self.json {
                    return Self::print_json(&rules);
                }
                for (module, actions) in &rules {
                    println!("{module:<24} {}", actions.join(", "));
                }
            }
            ProjectAction::DefaultRoles { project_id } => {
                let roles = store.fetch_default_roles(self.cluster(), &project_id).await?;
                if self.json {
                    return Self::print_json(&roles);
                }
                for role in &roles {
                    println!("{}", role.name);
                }
            }
        }
        Ok(())
    }

    pub async fn roles(&self, action: RoleCommand) -> Result<()> {
        let store = RoleStore::new(self.client.clone(), self.session.clone());

        match action {
            RoleCommand::List { devops, list } => {
                let outcome = store
                    .fetch_list(self.cluster(), &devops, list.to_query(self.default_limit()))
                    .await?;
                log_outcome(outcome);
                let state = store.state();
                if self.json {
                    return Self::print_json(&state);
                }
                println!("{:<32} {:<8} {:<20} DESCRIPTION", "NAME", "PRESET", "CREATED");
                for role in &state.items {
                    println!(
                        "{:<32} {:<8} {:<20} {}",
                        role.name,
                        if store.is_preset_role(&role.name) { "yes" } else { "no" },
                        format_time(role.create_time),
                        role.description.as_deref().unwrap_or("")
                    );
                }
                print_footer(&state);
            }
            RoleCommand::Templates { devops } => {
                store.fetch_role_templates(self.cluster(), &devops).await?;
                let templates = store.templates();
                if self.json {
                    return Self::print_json(&templates);
                }
                for template in &templates.items {
                    println!("{}", template.name);
                }
            }
            RoleCommand::Delete { devops, name } => {
                store.delete(self.cluster(), &devops, &name).await?;
                println!("Deleted role {name}");
            }
        }
        Ok(())
    }

    pub async fn pipelines(&self, action: PipelineAction) -> Result<()> {
        match action {
            PipelineAction::List { devops, list } => {
                let store = self.pipeline_store(None);
                let outcome = store
                    .fetch_list(self.cluster(), &devops, list.to_query(self.default_limit()))
                    .await?;
                log_outcome(outcome);
                let state = store.state();
                if self.json {
                    return Self::print_json(&state);
                }
                println!("{:<32} {:<14} {:<12} {:<20}", "NAME", "TYPE", "SYNC", "CREATED");
                for p in &state.items {
                    println!(
                        "{:<32} {:<14} {:<12} {:<20}",
                        p.name,
                        if p.is_multi_branch() { "multi-branch" } else { "pipeline" },
                        p.sync_status.as_deref().unwrap_or("-"),
                        format_time(p.create_time)
                    );
                }
                print_footer(&state);
            }
            PipelineAction::Show { devops, name } => {
                // Operations depend on the caller's rules inside this project.
                let rules = DevOpsStore::new(self.client.clone(), self.session.clone())
                    .fetch_rules(self.cluster(), &devops)
                    .await;
                let session = self.session.with_project_rules(devops.clone(), rules);
                let store = self.pipeline_store(Some(Arc::new(session)));

                let pipeline = store.fetch_detail(self.cluster(), &devops, &name).await?;
                let operations = store.operations(&pipeline, &devops);
                if self.json {
                    return Self::print_json(&serde_json::json!({
                        "pipeline": pipeline,
                        "operations": operations,
                    }));
                }
                println!("Name:        {}", pipeline.name);
                println!(
                    "Type:        {}",
                    if pipeline.is_multi_branch() { "multi-branch" } else { "pipeline" }
                );
                println!("SCM source:  {}", pipeline.scm_source.as_deref().unwrap_or("-"));
                println!("Sync status: {}", pipeline.sync_status.as_deref().unwrap_or("-"));
                println!("Created:     {}", format_time(pipeline.create_time));
                let keys: Vec<_> = operations.iter().map(|op| op.key()).collect();
                println!("Operations:  {}", if keys.is_empty() { "-".to_string() } else { keys.join(", ") });
            }
            PipelineAction::Config { devops, name } => {
                let config = self
                    .pipeline_store(None)
                    .fetch_config(self.cluster(), &devops, &name)
                    .await?;
                Self::print_json(&config)?;
            }
            PipelineAction::Update { devops, file } => {
                let content = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("cannot read {}", file.display()))?;
                let config: serde_json::Value = serde_json::from_str(&content)
                    .with_context(|| format!("{} is not valid JSON", file.display()))?;
                let pipeline = self
                    .pipeline_store(None)
                    .update(self.cluster(), &devops, &config)
                    .await?;
                println!("Updated pipeline {}", pipeline.name);
            }
            PipelineAction::Delete { devops, name } => {
                self.pipeline_store(None)
                    .delete(self.cluster(), &devops, &name)
                    .await?;
                println!("Deleted pipeline {name}");
            }
            PipelineAction::Scan { devops, name } => {
                let store = self.pipeline_store(None);
                let pipeline = store.fetch_detail(self.cluster(), &devops, &name).await?;
                store.scan_repository(self.cluster(), &devops, &pipeline).await?;
                println!("Scan of {name} started");
            }
        }
        Ok(())
    }

    fn pipeline_store(&self, session: Option<Arc<SessionContext>>) -> PipelineStore {
        PipelineStore::new(
            self.client.clone(),
            session.unwrap_or_else(|| self.session.clone()),
        )
    }
}

/// `config` commands run without touching the network.
pub fn show_config(action: &ConfigAction, config: &ConsoleConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let mut shown = config.clone();
            if shown.api.token.is_some() {
                shown.api.token = Some("***".to_string());
            }
            println!("{}", shown.to_json()?);
        }
        ConfigAction::Path => match config::default_config_path() {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("this platform has no config directory"),
        },
    }
    Ok(())
}

fn log_outcome(outcome: FetchOutcome) {
    if outcome == FetchOutcome::Superseded {
        tracing::debug!("List response superseded by a newer request");
    }
}

fn print_footer<R>(state: &ListState<R>) {
    println!();
    println!("{}", footer(state));
}

fn footer<R>(state: &ListState<R>) -> String {
    if state.limit.is_unlimited() {
        format!("{} total", state.total)
    } else {
        format!(
            "page {}/{}, {} total",
            state.page,
            state.page_count(),
            state.total
        )
    }
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || "-".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}
