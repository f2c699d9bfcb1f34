// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use crate::cloud::{LoadBalancerBinding, LoadBalancerOps, ServiceOps, ServiceUpdate};
use crate::config::{BlueGreenTargets, DeploymentConfig};
use crate::poll::PollOutcome;
use crate::types::Slot;

use super::Deployment;
use super::error::DeployError;
use super::probe::wait_for_healthy_targets;
use super::slot::determine_active_slot;
use super::state::{
    BlueGreenStep, Completed, HealthVerified, Initialized, RolledBack, RolledOut, SlotSelected,
    Switched, Updating,
};
use super::traffic::switch_traffic;
use super::watcher::watch_rollout;

/// Result type for transitions that hand the deployment back on failure.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> Deployment<S> {
    /// Internal helper to transition to a new state.
    fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            config: self.config,
            state,
        }
    }

    fn targets(&self) -> Result<BlueGreenTargets, DeployError> {
        self.config.blue_green().cloned().ok_or_else(|| {
            DeployError::Config("operation requires the blue_green strategy".to_string())
        })
    }

    fn service_update(&self, load_balancer: Option<LoadBalancerBinding>) -> ServiceUpdate {
        ServiceUpdate {
            cluster: self.config.cluster.clone(),
            service: self.config.service.clone(),
            task_definition: self.config.task_definition.clone(),
            load_balancer,
        }
    }

    async fn send_update<C>(&self, services: &C, update: ServiceUpdate) -> Result<(), DeployError>
    where
        C: ServiceOps + ?Sized,
    {
        tracing::info!(
            service = %update.service,
            task_definition = %update.task_definition,
            target_group = update.load_balancer.as_ref().map(|lb| lb.target_group.short()),
            "updating service"
        );
        services
            .update_service(&update)
            .await
            .map_err(DeployError::UpdateFailed)?;
        tracing::info!("service update initiated");
        Ok(())
    }
}

// =============================================================================
// Initialized -> SlotSelected (blue/green) | Updating (direct)
// =============================================================================

impl Deployment<Initialized> {
    /// Read the listener to find the live slot. The inactive slot becomes the target.
    ///
    /// Listener read failures fall back to the default slot rather than aborting.
    ///
    /// # Errors
    ///
    /// Returns `(self, DeployError::Config)` for a direct deployment.
    #[must_use = "deployment state must be used"]
    pub async fn determine_slot<L>(
        self,
        load_balancers: &L,
    ) -> TransitionResult<SlotSelected, Initialized>
    where
        L: LoadBalancerOps + ?Sized,
    {
        let determination = match self.targets() {
            Ok(targets) => determine_active_slot(load_balancers, &targets).await,
            Err(e) => return Err((self, e)),
        };

        let step = BlueGreenStep::new(determination);
        tracing::info!(active = %step.active, target = %step.target, "deploying to inactive slot");
        Ok(self.transition(SlotSelected { step }))
    }

    /// Direct strategy: update the single running service with no load balancer binding.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` if the strategy is blue/green or the update is rejected.
    #[must_use = "deployment state must be used"]
    pub async fn update_in_place<C>(self, services: &C) -> TransitionResult<Updating, Initialized>
    where
        C: ServiceOps + ?Sized,
    {
        if self.config.blue_green().is_some() {
            return Err((
                self,
                DeployError::Config(
                    "blue_green deployments must update the inactive slot".to_string(),
                ),
            ));
        }

        let update = self.service_update(None);
        match self.send_update(services, update).await {
            Ok(()) => Ok(self.transition(Updating { step: None })),
            Err(e) => Err((self, e)),
        }
    }
}

// =============================================================================
// SlotSelected -> Updating
// =============================================================================

impl Deployment<SlotSelected> {
    /// Update the service, binding it to the target slot's target group.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` if the control plane rejects the update.
    #[must_use = "deployment state must be used"]
    pub async fn update_service<C>(self, services: &C) -> TransitionResult<Updating, SlotSelected>
    where
        C: ServiceOps + ?Sized,
    {
        let binding = match self.targets() {
            Ok(targets) => LoadBalancerBinding {
                target_group: targets.target_group(self.state.step.target).clone(),
                container_name: self.config.container.name.clone(),
                container_port: self.config.container.port,
            },
            Err(e) => return Err((self, e)),
        };

        let update = self.service_update(Some(binding));
        match self.send_update(services, update).await {
            Ok(()) => {
                let step = self.state.step.clone();
                Ok(self.transition(Updating { step: Some(step) }))
            }
            Err(e) => Err((self, e)),
        }
    }
}

// =============================================================================
// Updating -> RolledOut
// =============================================================================

impl Deployment<Updating> {
    /// Wait for the rollout to converge.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` on explicit rollout failure or timeout.
    #[must_use = "deployment state must be used"]
    pub async fn wait_for_rollout<C>(self, services: &C) -> TransitionResult<RolledOut, Updating>
    where
        C: ServiceOps + ?Sized,
    {
        let settings = self.config.timeouts.rollout_poll();
        let outcome = watch_rollout(
            services,
            &self.config.cluster,
            &self.config.service,
            settings,
        )
        .await;

        match outcome {
            PollOutcome::Success(progress) => {
                tracing::info!(%progress, "deployment completed successfully");
                let step = self.state.step.clone();
                Ok(self.transition(RolledOut { step }))
            }
            PollOutcome::Failure(reason) => Err((self, DeployError::RolloutFailed(reason))),
            PollOutcome::TimedOut { elapsed, last_seen } => Err((
                self,
                DeployError::RolloutTimedOut {
                    elapsed_secs: elapsed.as_secs(),
                    last_seen: last_seen.unwrap_or_else(|| "nothing".to_string()),
                },
            )),
        }
    }
}

// =============================================================================
// RolledOut -> HealthVerified (blue/green) | Completed (direct)
// =============================================================================

impl Deployment<RolledOut> {
    /// Wait, with the long health budget, for a healthy target in the new slot.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` if no target becomes healthy. The live slot is untouched.
    #[must_use = "deployment state must be used"]
    pub async fn verify_health<L>(
        self,
        load_balancers: &L,
    ) -> TransitionResult<HealthVerified, RolledOut>
    where
        L: LoadBalancerOps + ?Sized,
    {
        let Some(step) = self.state.step.clone() else {
            return Err((
                self,
                DeployError::Config("direct deployments have no slot to verify".to_string()),
            ));
        };
        let target_group = match self.targets() {
            Ok(targets) => targets.target_group(step.target).clone(),
            Err(e) => return Err((self, e)),
        };

        let settings = self.config.timeouts.health_poll();
        match wait_for_healthy_targets(load_balancers, &target_group, settings).await {
            PollOutcome::Success(_) => Ok(self.transition(HealthVerified { step })),
            PollOutcome::Failure(reason) => Err((
                self,
                DeployError::HealthCheckFailed {
                    target_group: target_group.to_string(),
                    reason,
                },
            )),
            PollOutcome::TimedOut { elapsed, last_seen } => Err((
                self,
                DeployError::HealthCheckTimeout {
                    target_group: target_group.to_string(),
                    elapsed_secs: elapsed.as_secs(),
                    last_seen: last_seen.unwrap_or_else(|| "nothing".to_string()),
                },
            )),
        }
    }

    /// Direct strategy ends once the rollout has converged.
    ///
    /// # Errors
    ///
    /// Returns `(self, DeployError::Config)` for a blue/green deployment.
    #[must_use = "deployment state must be used"]
    pub fn complete_direct(self) -> TransitionResult<Completed, RolledOut> {
        if self.state.step.is_some() {
            return Err((
                self,
                DeployError::Config(
                    "blue_green deployments complete only after a traffic switch".to_string(),
                ),
            ));
        }
        Ok(self.transition(Completed { live: None }))
    }
}

// =============================================================================
// HealthVerified -> Switched
// =============================================================================

impl Deployment<HealthVerified> {
    /// Point the listener at the new slot. The only step that moves production traffic.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` if the switch is not confirmed. Traffic stays on the old slot.
    #[must_use = "deployment state must be used"]
    pub async fn switch_traffic<L>(
        self,
        load_balancers: &L,
    ) -> TransitionResult<Switched, HealthVerified>
    where
        L: LoadBalancerOps + ?Sized,
    {
        let result = match self.targets() {
            Ok(targets) => {
                switch_traffic(
                    load_balancers,
                    &targets.listener,
                    targets.target_group(self.state.step.target),
                )
                .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                let step = self.state.step.clone();
                Ok(self.transition(Switched { step }))
            }
            Err(e) => Err((self, e)),
        }
    }
}

// =============================================================================
// Switched -> Completed | RolledBack
// =============================================================================

impl Deployment<Switched> {
    /// Let traffic settle, then re-verify the new slot with the short budget.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` so the caller can roll back.
    #[must_use = "deployment state must be used"]
    pub async fn verify_after_switch<L>(
        self,
        load_balancers: &L,
    ) -> TransitionResult<Completed, Switched>
    where
        L: LoadBalancerOps + ?Sized,
    {
        let settle = self.config.timeouts.settle_period;
        if !settle.is_zero() {
            tracing::info!(settle_secs = settle.as_secs(), "allowing traffic to settle");
            tokio::time::sleep(settle).await;
        }

        let slot = self.state.step.target;
        let target_group = match self.targets() {
            Ok(targets) => targets.target_group(slot).clone(),
            Err(e) => return Err((self, e)),
        };

        let settings = self.config.timeouts.post_switch_poll();
        match wait_for_healthy_targets(load_balancers, &target_group, settings).await {
            PollOutcome::Success(_) => Ok(self.transition(Completed { live: Some(slot) })),
            PollOutcome::Failure(reason) => {
                Err((self, DeployError::UnhealthyAfterSwitch { slot, reason }))
            }
            PollOutcome::TimedOut { elapsed, last_seen } => Err((
                self,
                DeployError::UnhealthyAfterSwitch {
                    slot,
                    reason: format!(
                        "no healthy targets after {}s (last seen: {})",
                        elapsed.as_secs(),
                        last_seen.as_deref().unwrap_or("nothing")
                    ),
                },
            )),
        }
    }

    /// Switch traffic back to the slot that was live before this run.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::RollbackFailed` if the listener could not be restored.
    #[must_use = "deployment state must be used"]
    pub async fn rollback<L>(
        self,
        load_balancers: &L,
    ) -> Result<Deployment<RolledBack>, DeployError>
    where
        L: LoadBalancerOps + ?Sized,
    {
        let previous = self.state.step.active;
        tracing::warn!(slot = %previous, "rolling traffic back");

        let targets = self.targets().map_err(|e| DeployError::RollbackFailed {
            slot: previous,
            reason: e.to_string(),
        })?;

        switch_traffic(
            load_balancers,
            &targets.listener,
            targets.target_group(previous),
        )
        .await
        .map_err(|e| DeployError::RollbackFailed {
            slot: previous,
            reason: e.to_string(),
        })?;

        Ok(self.transition(RolledBack { restored: previous }))
    }
}

// =============================================================================
// Completed - Terminal State
// =============================================================================

impl Deployment<Completed> {
    /// Consume the deployment and return the slot now serving and the config.
    pub fn finish(self) -> (Option<Slot>, DeploymentConfig) {
        (self.state.live, self.config)
    }
}
