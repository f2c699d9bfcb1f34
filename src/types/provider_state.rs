// ABOUTME: Closed enumerations for provider-reported state strings.
// ABOUTME: Unknown values fail loudly with UnmappedState instead of being treated as pending.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A provider returned a state string this crate has no mapping for.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unmapped {kind} state: {value:?}")]
pub struct UnmappedState {
    pub kind: &'static str,
    pub value: String,
}

impl UnmappedState {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Convergence status of an ECS deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutState {
    InProgress,
    Completed,
    Failed,
}

impl FromStr for RolloutState {
    type Err = UnmappedState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(RolloutState::InProgress),
            "COMPLETED" => Ok(RolloutState::Completed),
            "FAILED" => Ok(RolloutState::Failed),
            other => Err(UnmappedState::new("rollout", other)),
        }
    }
}

impl fmt::Display for RolloutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RolloutState::InProgress => "IN_PROGRESS",
            RolloutState::Completed => "COMPLETED",
            RolloutState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Role of a deployment within its service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentRole {
    /// The most recent deployment; the one being rolled out.
    Primary,
    /// A previous deployment still running tasks.
    Active,
    /// Fully drained.
    Inactive,
}

impl DeploymentRole {
    /// Primary and active deployments both still own running tasks.
    pub fn is_serving(self) -> bool {
        matches!(self, DeploymentRole::Primary | DeploymentRole::Active)
    }
}

impl FromStr for DeploymentRole {
    type Err = UnmappedState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIMARY" => Ok(DeploymentRole::Primary),
            "ACTIVE" => Ok(DeploymentRole::Active),
            "INACTIVE" => Ok(DeploymentRole::Inactive),
            other => Err(UnmappedState::new("deployment", other)),
        }
    }
}

impl fmt::Display for DeploymentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeploymentRole::Primary => "PRIMARY",
            DeploymentRole::Active => "ACTIVE",
            DeploymentRole::Inactive => "INACTIVE",
        };
        f.write_str(s)
    }
}

/// Lifecycle status of an ECS service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Active,
    Draining,
    Inactive,
}

impl FromStr for ServiceStatus {
    type Err = UnmappedState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ServiceStatus::Active),
            "DRAINING" => Ok(ServiceStatus::Draining),
            "INACTIVE" => Ok(ServiceStatus::Inactive),
            other => Err(UnmappedState::new("service", other)),
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceStatus::Active => "ACTIVE",
            ServiceStatus::Draining => "DRAINING",
            ServiceStatus::Inactive => "INACTIVE",
        };
        f.write_str(s)
    }
}

/// Health of a single load balancer target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetHealthState {
    Initial,
    Healthy,
    Unhealthy,
    Unused,
    Draining,
    Unavailable,
    UnhealthyDraining,
}

impl TargetHealthState {
    pub fn is_healthy(self) -> bool {
        self == TargetHealthState::Healthy
    }
}

impl FromStr for TargetHealthState {
    type Err = UnmappedState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(TargetHealthState::Initial),
            "healthy" => Ok(TargetHealthState::Healthy),
            "unhealthy" => Ok(TargetHealthState::Unhealthy),
            "unused" => Ok(TargetHealthState::Unused),
            "draining" => Ok(TargetHealthState::Draining),
            "unavailable" => Ok(TargetHealthState::Unavailable),
            "unhealthy.draining" => Ok(TargetHealthState::UnhealthyDraining),
            other => Err(UnmappedState::new("target health", other)),
        }
    }
}

impl fmt::Display for TargetHealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetHealthState::Initial => "initial",
            TargetHealthState::Healthy => "healthy",
            TargetHealthState::Unhealthy => "unhealthy",
            TargetHealthState::Unused => "unused",
            TargetHealthState::Draining => "draining",
            TargetHealthState::Unavailable => "unavailable",
            TargetHealthState::UnhealthyDraining => "unhealthy.draining",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollout_states_parse() {
        assert_eq!("COMPLETED".parse(), Ok(RolloutState::Completed));
        assert_eq!("IN_PROGRESS".parse(), Ok(RolloutState::InProgress));
        assert_eq!("FAILED".parse(), Ok(RolloutState::Failed));
    }

    #[test]
    fn unknown_rollout_state_is_unmapped() {
        let err = "ROLLING_BACK".parse::<RolloutState>().unwrap_err();
        assert_eq!(err.kind, "rollout");
        assert_eq!(err.value, "ROLLING_BACK");
        assert!(err.to_string().contains("ROLLING_BACK"));
    }

    #[test]
    fn target_health_is_case_sensitive() {
        assert!("HEALTHY".parse::<TargetHealthState>().is_err());
        assert!("healthy".parse::<TargetHealthState>().unwrap().is_healthy());
    }

    #[test]
    fn draining_targets_are_not_healthy() {
        let state: TargetHealthState = "unhealthy.draining".parse().unwrap();
        assert_eq!(state, TargetHealthState::UnhealthyDraining);
        assert!(!state.is_healthy());
    }

    #[test]
    fn primary_and_active_deployments_are_serving() {
        assert!(DeploymentRole::Primary.is_serving());
        assert!(DeploymentRole::Active.is_serving());
        assert!(!DeploymentRole::Inactive.is_serving());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for state in [
            ServiceStatus::Active,
            ServiceStatus::Draining,
            ServiceStatus::Inactive,
        ] {
            assert_eq!(state.to_string().parse(), Ok(state));
        }
    }
}
