// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ARN confusion and closed enums for provider states.

mod id;
mod provider_state;
mod resource_name;
mod slot;
mod task_definition;

pub use id::{Arn, ListenerArn, TargetGroupArn};
pub use provider_state::{
    DeploymentRole, RolloutState, ServiceStatus, TargetHealthState, UnmappedState,
};
pub use resource_name::{ResourceName, ResourceNameError};
pub use slot::Slot;
pub use task_definition::{ParseTaskDefinitionError, TaskDefinition};
