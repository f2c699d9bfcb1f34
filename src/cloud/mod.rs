// ABOUTME: Cloud control plane access for ECS services and ELBv2 load balancers.
// ABOUTME: Composable capability traits plus the AWS SDK implementation.

mod aws;
mod error;
mod traits;
mod types;

pub use aws::AwsCloud;
pub use error::{CloudError, CloudErrorKind, UnmappedSnafu};
pub use traits::{CloudOps, LoadBalancerOps, ServiceOps};
pub use types::{
    DeploymentSummary, LoadBalancerBinding, ServiceDescription, ServiceUpdate, TargetHealthReport,
};
