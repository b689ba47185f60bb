//! Resource-specific stores built on [`ListResourceStore`](crate::store::ListResourceStore)

pub mod devops;
pub mod pipeline;
pub mod role;

pub use devops::{
    CreateDevOpsProjectRequest, DefaultRole, DevOpsNormalizer, DevOpsProject, DevOpsStore,
};
pub use pipeline::{Pipeline, PipelineKind, PipelineNormalizer, PipelineOperation, PipelineStore};
pub use role::{Role, RoleAction, RoleNormalizer, RoleStore};
