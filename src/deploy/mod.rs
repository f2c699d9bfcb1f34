// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the orchestrator, and the pieces it sequences.

mod deployment;
mod error;
mod lock;
mod orchestrator;
mod outcome;
mod probe;
mod rollback;
mod slot;
mod state;
mod strategy;
mod traffic;
mod transitions;
mod watcher;

pub use deployment::Deployment;
pub use error::{DeployError, DeployErrorKind};
pub use lock::{DeployLock, LockInfo, default_state_dir};
pub use orchestrator::Orchestrator;
pub use outcome::DeploymentOutcome;
pub use probe::{healthy_targets_once, wait_for_healthy_targets};
pub use rollback::manual_rollback;
pub use slot::{DEFAULT_ACTIVE_SLOT, SlotDetermination, determine_active_slot};
pub use state::{
    BlueGreenStep, Completed, HealthVerified, Initialized, Phase, RolledBack, RolledOut,
    SlotSelected, Switched, Updating,
};
pub use strategy::{DeploymentStrategy, UnknownStrategy};
pub use traffic::switch_traffic;
pub use transitions::TransitionResult;
pub use watcher::watch_rollout;
