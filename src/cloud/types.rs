// ABOUTME: Provider-neutral snapshots of ECS services and target group health.
// ABOUTME: Shared by the AWS implementation, the orchestrator, and the health gate.

use crate::types::{
    DeploymentRole, ResourceName, RolloutState, ServiceStatus, TargetGroupArn, TargetHealthState,
    TaskDefinition,
};

/// One deployment within an ECS service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSummary {
    pub id: String,
    pub role: DeploymentRole,
    /// Absent for services that do not use the rolling-update controller.
    pub rollout_state: Option<RolloutState>,
    pub rollout_state_reason: Option<String>,
    pub desired_count: i32,
    pub running_count: i32,
}

/// Point-in-time description of an ECS service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescription {
    pub status: ServiceStatus,
    pub desired_count: i32,
    pub running_count: i32,
    pub deployments: Vec<DeploymentSummary>,
}

impl ServiceDescription {
    pub fn primary(&self) -> Option<&DeploymentSummary> {
        self.deployments
            .iter()
            .find(|d| d.role == DeploymentRole::Primary)
    }

    /// First deployment whose rollout has failed, if any.
    pub fn failed_deployment(&self) -> Option<&DeploymentSummary> {
        self.deployments
            .iter()
            .find(|d| d.rollout_state == Some(RolloutState::Failed))
    }

    /// Deployments that still own running tasks (primary or active).
    pub fn serving_deployments(&self) -> impl Iterator<Item = &DeploymentSummary> {
        self.deployments.iter().filter(|d| d.role.is_serving())
    }

    /// Short human-readable summary of the primary deployment's progress.
    pub fn progress(&self) -> String {
        match self.primary() {
            Some(primary) => format!(
                "primary {} {}/{} running, {} deployment(s)",
                primary
                    .rollout_state
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "UNKNOWN".to_string()),
                primary.running_count,
                primary.desired_count,
                self.deployments.len()
            ),
            None => format!("no primary deployment, {} total", self.deployments.len()),
        }
    }
}

/// Health of every registered target in a target group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetHealthReport {
    pub targets: Vec<TargetHealthState>,
}

impl TargetHealthReport {
    pub fn new(targets: Vec<TargetHealthState>) -> Self {
        Self { targets }
    }

    pub fn healthy_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_healthy()).count()
    }

    pub fn total(&self) -> usize {
        self.targets.len()
    }

    pub fn summary(&self) -> String {
        let states: Vec<String> = self.targets.iter().map(|t| t.to_string()).collect();
        format!(
            "{}/{} healthy [{}]",
            self.healthy_count(),
            self.total(),
            states.join(", ")
        )
    }
}

/// Binds an ECS service's container to a load balancer target group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerBinding {
    pub target_group: TargetGroupArn,
    pub container_name: String,
    pub container_port: u16,
}

/// A request to roll an ECS service onto a new task definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUpdate {
    pub cluster: ResourceName,
    pub service: ResourceName,
    pub task_definition: TaskDefinition,
    /// Present only for blue/green: the inactive slot's target group.
    pub load_balancer: Option<LoadBalancerBinding>,
}
