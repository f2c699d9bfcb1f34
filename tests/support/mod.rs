// ABOUTME: Test support utilities.
// ABOUTME: In-memory fakes for the cloud, the Atlantis control plane, notifications and backups.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Once;

use async_trait::async_trait;
use parking_lot::Mutex;

use atlantis_deploy::cloud::{
    CloudError, DeploymentSummary, LoadBalancerOps, ServiceDescription, ServiceOps, ServiceUpdate,
    TargetHealthReport,
};
use atlantis_deploy::config::{BlueGreenTargets, DeploymentConfig, DeploymentInput, Settings};
use atlantis_deploy::control_plane::{ControlPlane, LockEntry, LockQuery, RequestError};
use atlantis_deploy::deploy::DeploymentStrategy;
use atlantis_deploy::gate::{BackupReadiness, BackupStatus};
use atlantis_deploy::notify::{Notification, Notifier, NotifyError};
use atlantis_deploy::types::{
    DeploymentRole, ListenerArn, ResourceName, RolloutState, ServiceStatus, TargetGroupArn,
    TargetHealthState,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::from_default_env().add_directive("atlantis_deploy=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const BLUE_TG: &str =
    "arn:aws:elasticloadbalancing:ap-northeast-2:123456789012:targetgroup/atlantis-blue/1111";
pub const GREEN_TG: &str =
    "arn:aws:elasticloadbalancing:ap-northeast-2:123456789012:targetgroup/atlantis-green/2222";
pub const LISTENER: &str =
    "arn:aws:elasticloadbalancing:ap-northeast-2:123456789012:listener/app/atlantis/abc/def";

pub fn targets() -> BlueGreenTargets {
    BlueGreenTargets {
        blue: TargetGroupArn::new(BLUE_TG),
        green: TargetGroupArn::new(GREEN_TG),
        listener: ListenerArn::new(LISTENER),
    }
}

/// A validated config for the given strategy with default budgets.
pub fn config(strategy: DeploymentStrategy, environment: &str) -> DeploymentConfig {
    let input = DeploymentInput {
        cluster: Some(format!("{environment}-cluster")),
        service: Some("atlantis".to_string()),
        task_definition: Some("atlantis:42".to_string()),
        strategy: Some(strategy),
        environment: Some(environment.to_string()),
        blue_target_group: Some(BLUE_TG.to_string()),
        green_target_group: Some(GREEN_TG.to_string()),
        listener: Some(LISTENER.to_string()),
        ..Default::default()
    };
    input.build(&Settings::default()).unwrap()
}

// =============================================================================
// Service descriptions and target health
// =============================================================================

pub fn deployment(role: DeploymentRole, state: RolloutState) -> DeploymentSummary {
    DeploymentSummary {
        id: format!("ecs-svc/{role:?}").to_lowercase(),
        role,
        rollout_state: Some(state),
        rollout_state_reason: match state {
            RolloutState::Failed => Some("tasks failed to start".to_string()),
            _ => None,
        },
        desired_count: 2,
        running_count: if state == RolloutState::Completed { 2 } else { 1 },
    }
}

/// A service with one primary deployment in the given rollout state.
pub fn service(state: RolloutState) -> ServiceDescription {
    let primary = deployment(DeploymentRole::Primary, state);
    ServiceDescription {
        status: ServiceStatus::Active,
        desired_count: primary.desired_count,
        running_count: primary.running_count,
        deployments: vec![primary],
    }
}

pub fn stable_service() -> ServiceDescription {
    service(RolloutState::Completed)
}

pub fn health(states: &[TargetHealthState]) -> TargetHealthReport {
    TargetHealthReport::new(states.to_vec())
}

pub fn healthy(count: usize) -> TargetHealthReport {
    TargetHealthReport::new(vec![TargetHealthState::Healthy; count])
}

pub fn unhealthy() -> TargetHealthReport {
    health(&[TargetHealthState::Unhealthy, TargetHealthState::Initial])
}

// =============================================================================
// FakeCloud
// =============================================================================

/// A scripted reply. Non-`Ok` replies become the matching `CloudError`.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Api(String),
    NotFound,
    /// A provider state string with no mapping.
    Unmapped(String),
}

impl<T> Reply<T> {
    fn into_result(self, operation: &'static str) -> Result<T, CloudError> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Api(message) => Err(CloudError::api(operation, message)),
            Reply::NotFound => Err(CloudError::NotFound {
                resource: "resource",
                name: operation.to_string(),
            }),
            Reply::Unmapped(value) => Err(CloudError::Unmapped {
                operation,
                source: value.parse::<RolloutState>().unwrap_err(),
            }),
        }
    }
}

/// A queue of replies; the last one repeats forever.
#[derive(Debug, Clone)]
struct Script<T>(VecDeque<Reply<T>>);

impl<T: Clone> Script<T> {
    fn new(replies: Vec<Reply<T>>) -> Self {
        assert!(!replies.is_empty(), "script needs at least one reply");
        Self(replies.into())
    }

    fn next(&mut self) -> Reply<T> {
        if self.0.len() > 1 {
            self.0.pop_front().unwrap()
        } else {
            self.0.front().cloned().unwrap()
        }
    }
}

#[derive(Debug, Default)]
struct CloudState {
    describe: Option<Script<ServiceDescription>>,
    health: HashMap<String, Script<TargetHealthReport>>,
    listener: Option<Script<Option<TargetGroupArn>>>,
    target_groups: HashMap<String, TargetGroupArn>,
    update_error: Option<String>,
    /// Errors returned by successive `forward_all` calls; empty means success.
    switch_errors: VecDeque<Option<String>>,

    describe_calls: usize,
    health_calls: HashMap<String, usize>,
    updates: Vec<ServiceUpdate>,
    switches: Vec<TargetGroupArn>,
}

/// In-memory ECS + ELB. Traffic switches move the simulated listener.
#[derive(Debug, Default)]
pub struct FakeCloud {
    state: Mutex<CloudState>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener forwarding to `live_tg`; rollouts complete immediately and every group is healthy.
    pub fn happy(live_tg: &str) -> Self {
        let cloud = Self::new();
        cloud.listener_forwards_to(live_tg);
        cloud.describe(vec![Reply::Ok(stable_service())]);
        cloud.health(BLUE_TG, vec![Reply::Ok(healthy(1))]);
        cloud.health(GREEN_TG, vec![Reply::Ok(healthy(1))]);
        cloud
    }

    pub fn describe(&self, replies: Vec<Reply<ServiceDescription>>) {
        self.state.lock().describe = Some(Script::new(replies));
    }

    pub fn health(&self, target_group: &str, replies: Vec<Reply<TargetHealthReport>>) {
        self.state
            .lock()
            .health
            .insert(target_group.to_string(), Script::new(replies));
    }

    pub fn listener_forwards_to(&self, target_group: &str) {
        self.state.lock().listener = Some(Script::new(vec![Reply::Ok(Some(TargetGroupArn::new(
            target_group,
        )))]));
    }

    pub fn listener(&self, replies: Vec<Reply<Option<TargetGroupArn>>>) {
        self.state.lock().listener = Some(Script::new(replies));
    }

    pub fn register_target_group(&self, name: &str, arn: &str) {
        self.state
            .lock()
            .target_groups
            .insert(name.to_string(), TargetGroupArn::new(arn));
    }

    pub fn reject_updates(&self, message: &str) {
        self.state.lock().update_error = Some(message.to_string());
    }

    /// Script the outcome of successive traffic switches (`None` succeeds).
    pub fn switch_results(&self, results: Vec<Option<&str>>) {
        self.state.lock().switch_errors = results
            .into_iter()
            .map(|r| r.map(str::to_string))
            .collect();
    }

    pub fn updates(&self) -> Vec<ServiceUpdate> {
        self.state.lock().updates.clone()
    }

    pub fn switches(&self) -> Vec<TargetGroupArn> {
        self.state.lock().switches.clone()
    }

    pub fn describe_calls(&self) -> usize {
        self.state.lock().describe_calls
    }

    pub fn health_calls(&self, target_group: &str) -> usize {
        self.state
            .lock()
            .health_calls
            .get(target_group)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ServiceOps for FakeCloud {
    async fn describe_service(
        &self,
        _cluster: &ResourceName,
        _service: &ResourceName,
    ) -> Result<ServiceDescription, CloudError> {
        let mut state = self.state.lock();
        state.describe_calls += 1;
        match state.describe.as_mut() {
            Some(script) => script.next().into_result("DescribeServices"),
            None => Reply::NotFound.into_result("DescribeServices"),
        }
    }

    async fn update_service(&self, update: &ServiceUpdate) -> Result<(), CloudError> {
        let mut state = self.state.lock();
        if let Some(message) = &state.update_error {
            return Err(CloudError::api("UpdateService", message.clone()));
        }
        state.updates.push(update.clone());
        Ok(())
    }
}

#[async_trait]
impl LoadBalancerOps for FakeCloud {
    async fn listener_forward_target(
        &self,
        _listener: &ListenerArn,
    ) -> Result<Option<TargetGroupArn>, CloudError> {
        let mut state = self.state.lock();
        match state.listener.as_mut() {
            Some(script) => script.next().into_result("DescribeListeners"),
            None => Ok(None),
        }
    }

    async fn target_health(
        &self,
        target_group: &TargetGroupArn,
    ) -> Result<TargetHealthReport, CloudError> {
        let mut state = self.state.lock();
        *state
            .health_calls
            .entry(target_group.to_string())
            .or_default() += 1;
        match state.health.get_mut(target_group.as_str()) {
            Some(script) => script.next().into_result("DescribeTargetHealth"),
            None => Reply::NotFound.into_result("DescribeTargetHealth"),
        }
    }

    async fn forward_all(
        &self,
        _listener: &ListenerArn,
        target_group: &TargetGroupArn,
    ) -> Result<(), CloudError> {
        let mut state = self.state.lock();
        if let Some(Some(message)) = state.switch_errors.pop_front() {
            return Err(CloudError::api("ModifyListener", message));
        }
        state.switches.push(target_group.clone());
        state.listener = Some(Script::new(vec![Reply::Ok(Some(target_group.clone()))]));
        Ok(())
    }

    async fn find_target_group(&self, name: &str) -> Result<Option<TargetGroupArn>, CloudError> {
        Ok(self.state.lock().target_groups.get(name).cloned())
    }
}

// =============================================================================
// Atlantis control plane
// =============================================================================

#[derive(Debug, Clone)]
pub struct FakeControlPlane {
    pub health: Result<u16, RequestError>,
    pub locks: LockQuery,
}

impl FakeControlPlane {
    pub fn healthy() -> Self {
        Self {
            health: Ok(200),
            locks: LockQuery::Locks(Vec::new()),
        }
    }

    pub fn with_locks(projects: &[&str]) -> Self {
        Self {
            locks: LockQuery::Locks(
                projects
                    .iter()
                    .map(|p| LockEntry {
                        project: Some(p.to_string()),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Self::healthy()
        }
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn healthz(&self) -> Result<u16, RequestError> {
        self.health.clone()
    }

    async fn locks(&self) -> LockQuery {
        self.locks.clone()
    }
}

// =============================================================================
// Notifications and backups
// =============================================================================

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().push(notification.clone());
        if self.fail {
            return Err(NotifyError::Status(503));
        }
        Ok(())
    }
}

/// A backup collaborator that blows up.
pub struct PanickingBackup;

#[async_trait]
impl BackupStatus for PanickingBackup {
    async fn readiness(&self) -> BackupReadiness {
        panic!("backup service exploded")
    }
}
