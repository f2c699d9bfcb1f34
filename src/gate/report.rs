// ABOUTME: Per-check results and the aggregated health report.
// ABOUTME: Each result is classified so policy blocks can be told apart from broken infrastructure.

use serde::Serialize;
use std::fmt;

/// The six pre-flight checks, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    ControlPlane,
    Locks,
    ServiceStability,
    TargetGroups,
    Backup,
    DeploymentWindow,
}

impl CheckKind {
    pub const ALL: [CheckKind; 6] = [
        CheckKind::ControlPlane,
        CheckKind::Locks,
        CheckKind::ServiceStability,
        CheckKind::TargetGroups,
        CheckKind::Backup,
        CheckKind::DeploymentWindow,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CheckKind::ControlPlane => "Atlantis API",
            CheckKind::Locks => "Terraform Locks",
            CheckKind::ServiceStability => "ECS Service",
            CheckKind::TargetGroups => "Target Groups",
            CheckKind::Backup => "Backup Status",
            CheckKind::DeploymentWindow => "Deployment Window",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a check result came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckClass {
    /// The condition holds.
    Ok,
    /// Blocked by policy ("can't deploy now"): window or active locks.
    Policy,
    /// Something is broken or unreachable ("deployment broke").
    Infrastructure,
    /// The check's own tooling failed and the check passed anyway.
    FailOpen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckResult {
    pub check: CheckKind,
    pub passed: bool,
    pub message: String,
    pub class: CheckClass,
}

impl HealthCheckResult {
    pub fn ok(check: CheckKind, message: impl Into<String>) -> Self {
        Self::new(check, true, message, CheckClass::Ok)
    }

    pub fn policy(check: CheckKind, message: impl Into<String>) -> Self {
        Self::new(check, false, message, CheckClass::Policy)
    }

    pub fn infrastructure(check: CheckKind, message: impl Into<String>) -> Self {
        Self::new(check, false, message, CheckClass::Infrastructure)
    }

    pub fn fail_open(check: CheckKind, message: impl Into<String>) -> Self {
        Self::new(check, true, message, CheckClass::FailOpen)
    }

    fn new(check: CheckKind, passed: bool, message: impl Into<String>, class: CheckClass) -> Self {
        Self {
            check,
            passed,
            message: message.into(),
            class,
        }
    }
}

/// Ordered results of one run of the check battery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub results: Vec<HealthCheckResult>,
}

impl HealthReport {
    /// Overall verdict: every check passed.
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &HealthCheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn get(&self, check: CheckKind) -> Option<&HealthCheckResult> {
        self.results.iter().find(|r| r.check == check)
    }

    /// True when every failure is a policy block rather than a fault.
    pub fn blocked_by_policy_only(&self) -> bool {
        let mut failures = self.failures().peekable();
        failures.peek().is_some() && failures.all(|r| r.class == CheckClass::Policy)
    }
}
