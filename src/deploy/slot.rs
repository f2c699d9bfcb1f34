// ABOUTME: Classifies which blue/green slot is live by reading the listener.
// ABOUTME: Falls back to blue, explicitly and observably, when classification is impossible.

use serde::Serialize;

use crate::cloud::LoadBalancerOps;
use crate::config::BlueGreenTargets;
use crate::types::Slot;

/// Slot assumed live when the listener cannot be classified.
pub const DEFAULT_ACTIVE_SLOT: Slot = Slot::Blue;

/// How the active slot was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SlotDetermination {
    /// Read from the listener's current forward target.
    Determined { slot: Slot },
    /// Guessed. Deploying onto the live slot costs one extra cycle, not correctness.
    FallbackDefault { slot: Slot, reason: String },
}

impl SlotDetermination {
    pub fn active(&self) -> Slot {
        match self {
            SlotDetermination::Determined { slot }
            | SlotDetermination::FallbackDefault { slot, .. } => *slot,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, SlotDetermination::FallbackDefault { .. })
    }

    fn fallback(reason: impl Into<String>) -> Self {
        SlotDetermination::FallbackDefault {
            slot: DEFAULT_ACTIVE_SLOT,
            reason: reason.into(),
        }
    }
}

/// Inspect the listener and classify the live slot.
///
/// Reads live state on every call; the result is never cached.
pub async fn determine_active_slot<L>(
    load_balancers: &L,
    targets: &BlueGreenTargets,
) -> SlotDetermination
where
    L: LoadBalancerOps + ?Sized,
{
    match load_balancers.listener_forward_target(&targets.listener).await {
        Ok(Some(current)) => match targets.classify(&current) {
            Some(slot) => {
                tracing::info!(%slot, target_group = current.short(), "active slot determined");
                SlotDetermination::Determined { slot }
            }
            None => SlotDetermination::fallback(format!(
                "listener forwards to {}, which is neither blue nor green",
                current.short()
            )),
        },
        Ok(None) => SlotDetermination::fallback("listener has no forward action"),
        Err(e) => SlotDetermination::fallback(format!("failed to describe listener: {e}")),
    }
}
