// ABOUTME: The six individual pre-flight checks.
// ABOUTME: Each returns a classified result; lock and window tooling failures fail open.

use super::backup::{BackupReadiness, BackupStatus};
use super::report::{CheckKind, HealthCheckResult};
use super::window::WindowPolicy;
use crate::clock::Clock;
use crate::cloud::{CloudErrorKind, LoadBalancerOps, ServiceOps};
use crate::control_plane::{ControlPlane, LockQuery, RequestError};
use crate::types::{ResourceName, RolloutState, ServiceStatus};

/// Listed lock identifiers are capped for readability.
const MAX_LISTED_LOCKS: usize = 3;

pub(crate) async fn control_plane(control_plane: &dyn ControlPlane) -> HealthCheckResult {
    let check = CheckKind::ControlPlane;
    match control_plane.healthz().await {
        Ok(200) => HealthCheckResult::ok(check, "Atlantis API responding normally"),
        Ok(status) => {
            HealthCheckResult::infrastructure(check, format!("API returned status {status}"))
        }
        Err(RequestError::Timeout(after)) => {
            HealthCheckResult::infrastructure(check, format!("API timeout after {after:?}"))
        }
        Err(RequestError::Connect(reason)) => {
            HealthCheckResult::infrastructure(check, format!("Connection failed: {reason}"))
        }
        Err(RequestError::Other(reason)) => {
            HealthCheckResult::infrastructure(check, format!("API check failed: {reason}"))
        }
    }
}

pub(crate) async fn locks(control_plane: &dyn ControlPlane) -> HealthCheckResult {
    let check = CheckKind::Locks;
    match control_plane.locks().await {
        LockQuery::Locks(locks) if locks.is_empty() => {
            HealthCheckResult::ok(check, "No active locks")
        }
        LockQuery::Locks(locks) => {
            tracing::warn!(count = locks.len(), "active locks found");
            let listed: Vec<String> = locks
                .iter()
                .take(MAX_LISTED_LOCKS)
                .enumerate()
                .map(|(i, lock)| format!("Lock {}: {}", i + 1, lock.label()))
                .collect();
            HealthCheckResult::policy(
                check,
                format!("Active locks detected: {}", listed.join(", ")),
            )
        }
        LockQuery::Unavailable(reason) => {
            tracing::warn!(%reason, "cannot check locks endpoint, assuming safe");
            HealthCheckResult::fail_open(check, format!("Locks endpoint unavailable: {reason}"))
        }
    }
}

pub(crate) async fn service_stability(
    services: &dyn ServiceOps,
    cluster: &ResourceName,
    service: &ResourceName,
) -> HealthCheckResult {
    let check = CheckKind::ServiceStability;
    let description = match services.describe_service(cluster, service).await {
        Ok(description) => description,
        Err(e) if e.kind() == CloudErrorKind::NotFound => {
            return HealthCheckResult::infrastructure(check, "ECS service not found");
        }
        Err(e) => return HealthCheckResult::infrastructure(check, format!("ECS check failed: {e}")),
    };

    if description.status != ServiceStatus::Active {
        return HealthCheckResult::infrastructure(
            check,
            format!("Service status: {}", description.status),
        );
    }

    let serving: Vec<_> = description.serving_deployments().collect();
    let [deployment] = serving.as_slice() else {
        return HealthCheckResult::infrastructure(
            check,
            format!("Expected one active deployment, found {}", serving.len()),
        );
    };

    if deployment.rollout_state != Some(RolloutState::Completed) {
        let state = deployment
            .rollout_state
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        return HealthCheckResult::infrastructure(check, format!("Deployment state: {state}"));
    }

    if description.desired_count != description.running_count {
        return HealthCheckResult::infrastructure(
            check,
            format!(
                "Count mismatch: desired={}, running={}",
                description.desired_count, description.running_count
            ),
        );
    }

    HealthCheckResult::ok(check, "ECS service stable")
}

pub(crate) async fn target_groups(
    load_balancers: &dyn LoadBalancerOps,
    target_group: &str,
) -> HealthCheckResult {
    let check = CheckKind::TargetGroups;
    let arn = match load_balancers.find_target_group(target_group).await {
        Ok(Some(arn)) => arn,
        Ok(None) => return HealthCheckResult::infrastructure(check, "Target group not found"),
        Err(e) => {
            return HealthCheckResult::infrastructure(
                check,
                format!("Target group check failed: {e}"),
            );
        }
    };

    let report = match load_balancers.target_health(&arn).await {
        Ok(report) => report,
        Err(e) => {
            return HealthCheckResult::infrastructure(
                check,
                format!("Target group check failed: {e}"),
            );
        }
    };

    let healthy = report.healthy_count();
    if healthy == 0 {
        return HealthCheckResult::infrastructure(check, "No healthy targets");
    }
    if healthy < report.total() {
        tracing::warn!(
            unhealthy = report.total() - healthy,
            target_group,
            "some targets are not healthy"
        );
    }
    HealthCheckResult::ok(check, format!("{healthy} healthy targets"))
}

pub(crate) async fn backup(backup: &dyn BackupStatus) -> HealthCheckResult {
    let check = CheckKind::Backup;
    match backup.readiness().await {
        BackupReadiness::Ready => HealthCheckResult::ok(check, "Backup system available"),
        BackupReadiness::Unavailable(reason) => {
            HealthCheckResult::infrastructure(check, format!("No backup system: {reason}"))
        }
    }
}

pub(crate) fn deployment_window(
    clock: &dyn Clock,
    policy: &WindowPolicy,
    production: bool,
) -> HealthCheckResult {
    let check = CheckKind::DeploymentWindow;
    if !production {
        return HealthCheckResult::ok(check, "No deployment window outside production");
    }

    let now = match clock.now() {
        Ok(now) => now,
        Err(e) => {
            tracing::error!(error = %e, "deployment window check failed");
            return HealthCheckResult::fail_open(
                check,
                format!("Window check failed but proceeding: {e}"),
            );
        }
    };

    match policy.evaluate(now) {
        Ok(None) => HealthCheckResult::ok(check, "Safe deployment window"),
        Ok(Some(violation)) => {
            tracing::warn!(window = %policy.describe(), "{}", violation.message());
            HealthCheckResult::policy(check, violation.message())
        }
        Err(e) => {
            tracing::error!(error = %e, "deployment window check failed");
            HealthCheckResult::fail_open(check, format!("Window check failed but proceeding: {e}"))
        }
    }
}
