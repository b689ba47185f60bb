//! Command line definition

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use devops_console_api::{Limit, ListQuery};

#[derive(Debug, Parser)]
#[command(name = "devops-console")]
#[command(version, about = "Inspect and manage DevOps projects, roles and pipelines")]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Target cluster in multi-cluster setups
    #[arg(long, global = true)]
    pub cluster: Option<String>,

    /// User recorded as creator of new resources
    #[arg(long, global = true, env = "DEVOPS_CONSOLE_USER")]
    pub user: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "DevOps projects")]
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },
    #[command(about = "Roles inside a DevOps project")]
    Roles {
        #[command(subcommand)]
        action: RoleCommand,
    },
    #[command(about = "Pipelines inside a DevOps project")]
    Pipelines {
        #[command(subcommand)]
        action: PipelineAction,
    },
    #[command(about = "Show the effective configuration")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Paging, sorting and filtering shared by every `list` command.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Page size (defaults to `defaultLimit` from the config)
    #[arg(long, conflicts_with = "all")]
    pub limit: Option<u32>,

    /// Fetch everything in one request
    #[arg(long)]
    pub all: bool,

    /// Filter by name
    #[arg(long, short)]
    pub keyword: Option<String>,

    /// Sort field, e.g. `createTime`
    #[arg(long)]
    pub order: Option<String>,

    /// Reverse the sort order
    #[arg(long)]
    pub reverse: bool,
}

impl ListArgs {
    pub fn to_query(&self, default_limit: Limit) -> ListQuery {
        let limit = if self.all {
            Limit::Unlimited
        } else {
            self.limit.map_or(default_limit, Limit::Paged)
        };
        ListQuery {
            limit,
            page: self.page,
            order: self.order.clone(),
            reverse: self.reverse,
            keyword: self.keyword.clone(),
            label_selector: None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    #[command(about = "List DevOps projects")]
    List {
        /// Only projects of this workspace
        #[arg(long, short)]
        workspace: Option<String>,
        #[command(flatten)]
        list: ListArgs,
    },
    #[command(about = "Show one project by its project id")]
    Show { project_id: String },
    #[command(about = "Create a project")]
    Create {
        /// Name prefix; the server appends a generated suffix
        name: String,
        #[arg(long, short)]
        workspace: String,
        #[arg(long, short)]
        description: Option<String>,
    },
    #[command(about = "Change a project's description")]
    Describe { name: String, description: String },
    #[command(about = "Delete one or more projects")]
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
    },
    #[command(about = "Show your rules inside a project")]
    Rules { project_id: String },
    #[command(about = "List a project's built-in roles")]
    DefaultRoles { project_id: String },
}

#[derive(Debug, Subcommand)]
pub enum RoleCommand {
    #[command(about = "List roles")]
    List {
        devops: String,
        #[command(flatten)]
        list: ListArgs,
    },
    #[command(about = "List role templates")]
    Templates { devops: String },
    #[command(about = "Delete a role")]
    Delete { devops: String, name: String },
}

#[derive(Debug, Subcommand)]
pub enum PipelineAction {
    #[command(about = "List pipelines")]
    List {
        devops: String,
        #[command(flatten)]
        list: ListArgs,
    },
    #[command(about = "Show a pipeline and the operations available to you")]
    Show { devops: String, name: String },
    #[command(about = "Print the full pipeline object")]
    Config { devops: String, name: String },
    #[command(about = "Replace a pipeline from a JSON file")]
    Update {
        devops: String,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    #[command(about = "Delete a pipeline")]
    Delete { devops: String, name: String },
    #[command(about = "Scan the repository of a multi-branch pipeline")]
    Scan { devops: String, name: String },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    #[command(about = "Print the effective configuration (token hidden)")]
    Show,
    #[command(about = "Print the default config file location")]
    Path,
}
