//! DevOps Console Core Library
//!
//! Data layer behind the console's resource screens:
//! - Generic remote-list store (`ListResourceStore`) with request fencing
//! - DevOps project, role and pipeline stores
//! - Explicit session context (current user, rules, static config)
//!
//! The HTTP layer is abstracted through `devops_console_api::ApiClient`, so
//! the same stores run against the real control plane or a test double.

pub mod config;
pub mod error;
pub mod resources;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::ConsoleConfig;
pub use error::{CoreError, CoreResult};
pub use resources::{DevOpsStore, PipelineStore, RoleStore};
pub use session::{RuleSet, SessionContext, SessionUser};
pub use store::{FetchOutcome, FetchStatus, ListOptions, ListResourceStore, ListState, Normalizer};

// Re-export the api library for downstream crates
pub use devops_console_api;
