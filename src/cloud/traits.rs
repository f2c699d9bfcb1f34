// ABOUTME: Capability traits for the cloud control planes the orchestrator drives.
// ABOUTME: ServiceOps covers ECS services; LoadBalancerOps covers listeners and target groups.

use async_trait::async_trait;

use super::error::CloudError;
use super::types::{ServiceDescription, ServiceUpdate, TargetHealthReport};
use crate::types::{ListenerArn, ResourceName, TargetGroupArn};

/// Container-orchestration control plane operations.
#[async_trait]
pub trait ServiceOps: Send + Sync {
    /// Describe a service and its deployments.
    async fn describe_service(
        &self,
        cluster: &ResourceName,
        service: &ResourceName,
    ) -> Result<ServiceDescription, CloudError>;

    /// Trigger a rolling update. Returns once the control plane has accepted it.
    async fn update_service(&self, update: &ServiceUpdate) -> Result<(), CloudError>;
}

/// Load balancer control plane operations.
#[async_trait]
pub trait LoadBalancerOps: Send + Sync {
    /// Target group the listener's default forward action currently points at.
    ///
    /// Returns `None` when the listener has no forward action.
    async fn listener_forward_target(
        &self,
        listener: &ListenerArn,
    ) -> Result<Option<TargetGroupArn>, CloudError>;

    /// Health of every target registered in the group.
    async fn target_health(
        &self,
        target_group: &TargetGroupArn,
    ) -> Result<TargetHealthReport, CloudError>;

    /// Replace the listener's default actions with a single forward to `target_group`.
    async fn forward_all(
        &self,
        listener: &ListenerArn,
        target_group: &TargetGroupArn,
    ) -> Result<(), CloudError>;

    /// Resolve a target group by name.
    async fn find_target_group(&self, name: &str) -> Result<Option<TargetGroupArn>, CloudError>;
}

/// Both control planes. Automatically implemented for any type that has them.
pub trait CloudOps: ServiceOps + LoadBalancerOps {}

impl<T: ServiceOps + LoadBalancerOps> CloudOps for T {}
