// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Markers carry the slot decision forward; Phase names states at runtime.

use serde::Serialize;
use std::fmt;

use super::slot::SlotDetermination;
use crate::types::Slot;

/// Slot decision for a blue/green run, fixed once the listener has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueGreenStep {
    pub determination: SlotDetermination,
    /// Slot that served traffic when the run started.
    pub active: Slot,
    /// Inactive slot receiving the new release.
    pub target: Slot,
}

impl BlueGreenStep {
    pub(crate) fn new(determination: SlotDetermination) -> Self {
        let active = determination.active();
        Self {
            determination,
            active,
            target: active.other(),
        }
    }
}

/// Initial state: configuration validated, nothing touched.
/// Available actions: `determine_slot()` (blue/green), `update_in_place()` (direct)
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Active slot known.
/// Available actions: `update_service()`
#[derive(Debug, Clone)]
pub struct SlotSelected {
    pub(crate) step: BlueGreenStep,
}

/// Update accepted by the control plane.
/// Available actions: `wait_for_rollout()`
#[derive(Debug, Clone)]
pub struct Updating {
    pub(crate) step: Option<BlueGreenStep>,
}

/// Rollout converged.
/// Available actions: `verify_health()` (blue/green), `complete_direct()` (direct)
#[derive(Debug, Clone)]
pub struct RolledOut {
    pub(crate) step: Option<BlueGreenStep>,
}

/// New slot has a healthy target.
/// Available actions: `switch_traffic()`
#[derive(Debug, Clone)]
pub struct HealthVerified {
    pub(crate) step: BlueGreenStep,
}

/// Listener now forwards to the new slot.
/// Available actions: `verify_after_switch()`, `rollback()`
#[derive(Debug, Clone)]
pub struct Switched {
    pub(crate) step: BlueGreenStep,
}

/// Traffic returned to the previous slot after a failed verification.
/// Terminal.
#[derive(Debug, Clone)]
pub struct RolledBack {
    pub(crate) restored: Slot,
}

/// Deployment finished.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Completed {
    pub(crate) live: Option<Slot>,
}

/// Runtime name of each state, for logs and outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    DeterminingActiveSlot,
    Updating,
    WaitingForRollout,
    VerifyingHealth,
    SwitchingTraffic,
    PostSwitchVerification,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::DeterminingActiveSlot => "determining_active_slot",
            Phase::Updating => "updating",
            Phase::WaitingForRollout => "waiting_for_rollout",
            Phase::VerifyingHealth => "verifying_health",
            Phase::SwitchingTraffic => "switching_traffic",
            Phase::PostSwitchVerification => "post_switch_verification",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
