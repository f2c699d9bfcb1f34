// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: State types carry the slot decision for compile-time guarantees.

use crate::config::DeploymentConfig;
use crate::types::{ResourceName, Slot, TaskDefinition};

use super::state::{Completed, HealthVerified, Initialized, RolledBack, SlotSelected, Switched};

/// A deployment in progress, parameterized by its current state.
///
/// The state type parameter `S` carries state-specific data (the active and
/// target slots) directly in the state type, so a traffic switch cannot be
/// requested before a target slot exists.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) config: DeploymentConfig,
    pub(crate) state: S,
}

impl Deployment<Initialized> {
    pub fn new(config: DeploymentConfig) -> Self {
        Deployment {
            config,
            state: Initialized,
        }
    }
}

impl<S> Deployment<S> {
    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    pub fn service(&self) -> &ResourceName {
        &self.config.service
    }

    pub fn task_definition(&self) -> &TaskDefinition {
        &self.config.task_definition
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl Deployment<SlotSelected> {
    pub fn active_slot(&self) -> Slot {
        self.state.step.active
    }

    pub fn target_slot(&self) -> Slot {
        self.state.step.target
    }
}

impl Deployment<HealthVerified> {
    pub fn target_slot(&self) -> Slot {
        self.state.step.target
    }
}

impl Deployment<Switched> {
    pub fn previous_slot(&self) -> Slot {
        self.state.step.active
    }

    pub fn live_slot(&self) -> Slot {
        self.state.step.target
    }
}

impl Deployment<RolledBack> {
    pub fn restored_slot(&self) -> Slot {
        self.state.restored
    }
}

impl Deployment<Completed> {
    /// Slot now serving traffic; `None` for direct deployments.
    pub fn live_slot(&self) -> Option<Slot> {
        self.state.live
    }
}
