// ABOUTME: Drives the deployment state machine for either strategy and reports the outcome.
// ABOUTME: Post-switch verification failures roll traffic back to the previous slot.

use tokio::time::Instant;

use crate::cloud::{LoadBalancerOps, ServiceOps};
use crate::config::{DeploymentConfig, PreflightSettings};
use crate::diagnostics::{Diagnostics, Warning};
use crate::gate::{HealthGate, HealthReport};
use crate::notify::{Notification, NotificationKind, Notifier, notify_best_effort};
use crate::types::Slot;

use super::Deployment;
use super::error::DeployError;
use super::outcome::DeploymentOutcome;
use super::slot::SlotDetermination;
use super::state::Phase;
use super::strategy::DeploymentStrategy;

/// Runs one deployment end to end.
///
/// Holds no state between runs: every decision re-reads the live service and listener.
pub struct Orchestrator<'a, C: ?Sized> {
    cloud: &'a C,
    notifier: &'a dyn Notifier,
}

/// What the run has learned so far, kept for the outcome if a step fails.
#[derive(Debug)]
struct RunState {
    phase: Phase,
    determination: Option<SlotDetermination>,
    live: Option<Slot>,
    rolled_back: bool,
}

impl RunState {
    fn enter(&mut self, phase: Phase) {
        tracing::debug!(%phase, "entering phase");
        self.phase = phase;
    }
}

fn failed<S>((_, err): (Deployment<S>, DeployError)) -> DeployError {
    err
}

impl<'a, C> Orchestrator<'a, C>
where
    C: ServiceOps + LoadBalancerOps + ?Sized,
{
    pub fn new(cloud: &'a C, notifier: &'a dyn Notifier) -> Self {
        Self { cloud, notifier }
    }

    /// Run the pre-flight gate, then the deployment if the gate passes.
    ///
    /// `on_report` sees the final gate report before anything is deployed.
    /// A failed gate returns that report and no cloud resource is modified.
    pub async fn run_gated<F>(
        &self,
        config: DeploymentConfig,
        gate: &HealthGate<'_>,
        preflight: &PreflightSettings,
        on_report: F,
    ) -> Result<DeploymentOutcome, HealthReport>
    where
        F: FnOnce(&HealthReport),
    {
        let report = gate
            .run_with_retries(preflight.retry_count, preflight.retry_delay)
            .await;
        on_report(&report);

        if !report.passed() {
            tracing::error!(
                environment = %config.environment,
                policy_only = report.blocked_by_policy_only(),
                "pre-flight gate failed, deployment not started"
            );
            return Err(report);
        }
        Ok(self.run(config).await)
    }

    /// Run the deployment to a terminal state. Never returns an error.
    pub async fn run(&self, config: DeploymentConfig) -> DeploymentOutcome {
        let start = Instant::now();
        let mut diagnostics = Diagnostics::default();
        let environment = config.environment.clone();
        let strategy = config.strategy_kind();
        let service = config.service.to_string();

        tracing::info!(
            %strategy,
            %environment,
            service = %config.service,
            task_definition = %config.task_definition,
            "starting deployment"
        );

        let notification = |kind, detail: String| Notification {
            kind,
            environment: environment.clone(),
            service: service.clone(),
            strategy: strategy.to_string(),
            detail,
        };

        notify_best_effort(
            self.notifier,
            &mut diagnostics,
            &notification(
                NotificationKind::Started,
                format!("Deploying {}", config.task_definition),
            ),
        )
        .await;

        let mut state = RunState {
            phase: Phase::Idle,
            determination: None,
            live: None,
            rolled_back: false,
        };

        let result = match strategy {
            DeploymentStrategy::Direct => self.run_direct(config, &mut state).await,
            DeploymentStrategy::BlueGreen => {
                self.run_blue_green(config, &mut state, &mut diagnostics)
                    .await
            }
        };

        let (kind, detail) = match &result {
            Ok(()) => {
                tracing::info!(%strategy, "deployment completed successfully");
                state.enter(Phase::Succeeded);
                let detail = match state.live {
                    Some(slot) => format!("Traffic now on {slot}"),
                    None => "Service updated in place".to_string(),
                };
                (NotificationKind::Succeeded, detail)
            }
            Err(e) => {
                tracing::error!(phase = %state.phase, error = %e, "deployment failed");
                let kind = if state.rolled_back {
                    NotificationKind::RolledBack
                } else {
                    NotificationKind::Failed
                };
                (kind, format!("Failed during {}: {e}", state.phase))
            }
        };
        notify_best_effort(self.notifier, &mut diagnostics, &notification(kind, detail)).await;

        DeploymentOutcome {
            success: result.is_ok(),
            environment,
            strategy,
            error: result.as_ref().err().map(|e| e.to_string()),
            failed_phase: result.as_ref().err().map(|_| state.phase),
            slot: state.live,
            slot_determination: state.determination,
            rolled_back: state.rolled_back,
            elapsed_secs: start.elapsed().as_secs(),
            warnings: diagnostics.into_warnings(),
        }
    }

    async fn run_direct(
        &self,
        config: DeploymentConfig,
        state: &mut RunState,
    ) -> Result<(), DeployError> {
        state.enter(Phase::Updating);
        let deployment = Deployment::new(config)
            .update_in_place(self.cloud)
            .await
            .map_err(failed)?;

        state.enter(Phase::WaitingForRollout);
        let deployment = deployment
            .wait_for_rollout(self.cloud)
            .await
            .map_err(failed)?;

        deployment.complete_direct().map_err(failed)?;
        Ok(())
    }

    async fn run_blue_green(
        &self,
        config: DeploymentConfig,
        state: &mut RunState,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), DeployError> {
        state.enter(Phase::DeterminingActiveSlot);
        let deployment = Deployment::new(config)
            .determine_slot(self.cloud)
            .await
            .map_err(failed)?;

        let step = &deployment.state().step;
        if let SlotDetermination::FallbackDefault { slot, reason } = &step.determination {
            diagnostics.warn(Warning::slot_fallback(format!(
                "could not determine active slot ({reason}), assuming {slot}"
            )));
        }
        state.determination = Some(step.determination.clone());
        state.live = Some(step.active);

        state.enter(Phase::Updating);
        let deployment = deployment
            .update_service(self.cloud)
            .await
            .map_err(failed)?;

        state.enter(Phase::WaitingForRollout);
        let deployment = deployment
            .wait_for_rollout(self.cloud)
            .await
            .map_err(failed)?;

        state.enter(Phase::VerifyingHealth);
        let deployment = deployment
            .verify_health(self.cloud)
            .await
            .map_err(failed)?;

        state.enter(Phase::SwitchingTraffic);
        let deployment = deployment
            .switch_traffic(self.cloud)
            .await
            .map_err(failed)?;
        state.live = Some(deployment.live_slot());

        state.enter(Phase::PostSwitchVerification);
        let (switched, err) = match deployment.verify_after_switch(self.cloud).await {
            Ok(completed) => {
                state.live = completed.live_slot();
                return Ok(());
            }
            Err(failure) => failure,
        };

        tracing::error!(error = %err, "new slot unhealthy after traffic switch, rolling back");
        match switched.rollback(self.cloud).await {
            Ok(rolled_back) => {
                state.rolled_back = true;
                state.live = Some(rolled_back.restored_slot());
                tracing::warn!(slot = %rolled_back.restored_slot(), "traffic restored");
                Err(err)
            }
            Err(DeployError::RollbackFailed { slot, reason }) => Err(DeployError::RollbackFailed {
                slot,
                reason: format!("{reason} (triggered by: {err})"),
            }),
            Err(other) => Err(other),
        }
    }
}
