// ABOUTME: Pre-flight health gate: six isolated checks aggregated into a go/no-go report.
// ABOUTME: A panicking check is recorded as a failure; the battery always completes.

mod backup;
mod checks;
mod report;
mod window;

pub use backup::{BackupReadiness, BackupStatus, PlaceholderBackup};
pub use report::{CheckClass, CheckKind, HealthCheckResult, HealthReport};
pub use window::{WindowError, WindowPolicy, WindowViolation};

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;

use crate::clock::{Clock, SystemClock};
use crate::cloud::{LoadBalancerOps, ServiceOps};
use crate::config::GateTarget;
use crate::control_plane::ControlPlane;

static PLACEHOLDER_BACKUP: PlaceholderBackup = PlaceholderBackup;
static SYSTEM_CLOCK: SystemClock = SystemClock;

/// Runs the pre-flight checks for one environment.
pub struct HealthGate<'a> {
    target: &'a GateTarget,
    control_plane: &'a dyn ControlPlane,
    services: &'a dyn ServiceOps,
    load_balancers: &'a dyn LoadBalancerOps,
    backup: &'a dyn BackupStatus,
    clock: &'a dyn Clock,
    window: WindowPolicy,
}

impl<'a> HealthGate<'a> {
    pub fn new<C>(target: &'a GateTarget, control_plane: &'a dyn ControlPlane, cloud: &'a C) -> Self
    where
        C: ServiceOps + LoadBalancerOps,
    {
        Self {
            target,
            control_plane,
            services: cloud,
            load_balancers: cloud,
            backup: &PLACEHOLDER_BACKUP,
            clock: &SYSTEM_CLOCK,
            window: WindowPolicy::default(),
        }
    }

    pub fn with_backup(mut self, backup: &'a dyn BackupStatus) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_window(mut self, window: WindowPolicy) -> Self {
        self.window = window;
        self
    }

    /// Run all six checks once, in order.
    pub async fn run_once(&self) -> HealthReport {
        let target = self.target;
        tracing::info!(environment = %target.environment, "starting pre-flight health check");

        let mut report = HealthReport::default();

        report.results.push(
            isolated(
                CheckKind::ControlPlane,
                checks::control_plane(self.control_plane),
            )
            .await,
        );
        report
            .results
            .push(isolated(CheckKind::Locks, checks::locks(self.control_plane)).await);
        report.results.push(
            isolated(
                CheckKind::ServiceStability,
                checks::service_stability(self.services, &target.cluster, &target.service),
            )
            .await,
        );
        report.results.push(
            isolated(
                CheckKind::TargetGroups,
                checks::target_groups(self.load_balancers, &target.target_group),
            )
            .await,
        );
        report
            .results
            .push(isolated(CheckKind::Backup, checks::backup(self.backup)).await);
        report.results.push(
            isolated(CheckKind::DeploymentWindow, async {
                checks::deployment_window(self.clock, &self.window, target.production)
            })
            .await,
        );

        for result in &report.results {
            if result.passed {
                tracing::info!(check = %result.check, class = ?result.class, "{}", result.message);
            } else {
                tracing::error!(check = %result.check, class = ?result.class, "{}", result.message);
            }
        }
        tracing::info!(
            "health check summary: {}/{} checks passed",
            report.passed_count(),
            report.total()
        );

        report
    }

    /// Rerun the battery until it passes or `attempts` runs are used up.
    ///
    /// Returns the last report. At least one attempt is always made.
    pub async fn run_with_retries(&self, attempts: u32, delay: Duration) -> HealthReport {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            let report = self.run_once().await;
            if report.passed() {
                tracing::info!("all health checks passed, safe to deploy");
                return report;
            }
            if attempt >= attempts {
                tracing::error!(attempts, "health checks failed after all retry attempts");
                return report;
            }
            attempt += 1;
            tokio::time::sleep(delay).await;
            tracing::info!("retry attempt {}/{}", attempt, attempts);
        }
    }
}

async fn isolated<F>(check: CheckKind, future: F) -> HealthCheckResult
where
    F: Future<Output = HealthCheckResult>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            tracing::error!(%check, %reason, "check panicked");
            HealthCheckResult::infrastructure(check, format!("Exception: {reason}"))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "check panicked".to_string()
    }
}
