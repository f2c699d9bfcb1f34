// ABOUTME: Error types for deployment operations.
// ABOUTME: Covers service update, rollout convergence, target health, traffic switch, and lock failures.

use chrono::{DateTime, Utc};

use crate::cloud::CloudError;
use crate::types::Slot;

/// Errors that can occur during deployment state transitions.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The transition does not apply to this deployment's strategy.
    #[error("configuration error: {0}")]
    Config(String),

    /// The control plane rejected the service update.
    #[error("failed to update service: {0}")]
    UpdateFailed(#[source] CloudError),

    /// A deployment reported an explicit failure.
    #[error("rollout failed: {0}")]
    RolloutFailed(String),

    /// The rollout did not converge in time.
    #[error("rollout did not complete within {elapsed_secs}s (last seen: {last_seen})")]
    RolloutTimedOut { elapsed_secs: u64, last_seen: String },

    /// No target became healthy in time.
    #[error(
        "no healthy targets in {target_group} after {elapsed_secs}s (last seen: {last_seen})"
    )]
    HealthCheckTimeout {
        target_group: String,
        elapsed_secs: u64,
        last_seen: String,
    },

    /// Target health could not be evaluated.
    #[error("health check failed for {target_group}: {reason}")]
    HealthCheckFailed { target_group: String, reason: String },

    /// The listener was not repointed. Traffic stays where it was.
    #[error("failed to switch traffic to {target_group}: {source}")]
    SwitchFailed {
        target_group: String,
        source: CloudError,
    },

    /// Traffic moved to a slot that then failed verification.
    #[error("{slot} slot unhealthy after traffic switch: {reason}")]
    UnhealthyAfterSwitch { slot: Slot, reason: String },

    /// Switching traffic back failed. Production may be on a bad slot.
    #[error("rollback to {slot} failed: {reason}; manual intervention required")]
    RollbackFailed { slot: Slot, reason: String },

    /// A manual rollback was refused before touching the listener.
    #[error("refusing to roll back to {slot}: {reason}")]
    RollbackRefused { slot: Slot, reason: String },

    /// Another deployment holds the lock.
    #[error("deploy lock held by {holder} (pid {pid}) since {started_at}")]
    LockHeld {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    /// Lock file could not be created, read or removed.
    #[error("deploy lock error: {0}")]
    Lock(String),
}

/// Error taxonomy for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// Detected before any cloud call.
    Configuration,
    /// A collaborator failed or was unreachable.
    Infrastructure,
    /// Something never stabilized or never became healthy.
    Convergence,
    /// Blocked on purpose, e.g. another deployment is running.
    Policy,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Config(_) => DeployErrorKind::Configuration,
            DeployError::UpdateFailed(_)
            | DeployError::SwitchFailed { .. }
            | DeployError::RollbackFailed { .. }
            | DeployError::Lock(_) => DeployErrorKind::Infrastructure,
            DeployError::RolloutFailed(_)
            | DeployError::RolloutTimedOut { .. }
            | DeployError::HealthCheckTimeout { .. }
            | DeployError::HealthCheckFailed { .. }
            | DeployError::UnhealthyAfterSwitch { .. } => DeployErrorKind::Convergence,
            DeployError::LockHeld { .. } | DeployError::RollbackRefused { .. } => {
                DeployErrorKind::Policy
            }
        }
    }

    pub(crate) fn lock_error(message: impl Into<String>) -> Self {
        DeployError::Lock(message.into())
    }

    pub(crate) fn lock_held(holder: String, pid: u32, started_at: DateTime<Utc>) -> Self {
        DeployError::LockHeld {
            holder,
            pid,
            started_at,
        }
    }
}
