//! DevOps console operator CLI
//!
//! Lists, inspects and deletes DevOps projects, roles and pipelines through
//! the same stores the console screens use. Results go to stdout, logs to
//! stderr (`RUST_LOG` or `-v` to raise the level).

mod cli;
mod commands;
mod config;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Commands};
use commands::App;
use devops_console_core::CoreError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit code when the project or resource is gone or hidden from the caller.
const EXIT_NOT_FOUND_OR_FORBIDDEN: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let core = e.downcast_ref::<CoreError>();
            tracing::debug!(status = ?core.and_then(CoreError::status), "{e:?}");
            if core.is_some_and(CoreError::is_not_found_or_forbidden) {
                eprintln!("error: resource not found or access denied: {e:#}");
                ExitCode::from(EXIT_NOT_FOUND_OR_FORBIDDEN)
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::load(cli.config.as_deref()).await?;
    tracing::debug!("Using control plane at {}", config.api.base_url);

    if let Commands::Config { action } = &cli.command {
        return commands::show_config(action, &config);
    }

    let app = App::new(config, cli.user, cli.cluster, cli.json)?;
    match cli.command {
        Commands::Projects { action } => app.projects(action).await,
        Commands::Roles { action } => app.roles(action).await,
        Commands::Pipelines { action } => app.pipelines(action).await,
        Commands::Config { .. } => Ok(()),
    }
}
