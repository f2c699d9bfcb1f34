// ABOUTME: Manual rollback: point the listener back at the other blue/green slot.
// ABOUTME: Refuses unless the live slot is known and the destination has a healthy target.

use crate::cloud::LoadBalancerOps;
use crate::config::BlueGreenTargets;
use crate::types::Slot;

use super::DeployError;
use super::probe::healthy_targets_once;
use super::slot::{SlotDetermination, determine_active_slot};
use super::traffic::switch_traffic;

/// Swap live traffic to the slot that is not serving now.
///
/// Running it twice returns traffic to where it started. Returns the slot now live.
///
/// # Errors
///
/// Returns `RollbackRefused` if the listener's target cannot be classified or the
/// destination has no healthy target, and `SwitchFailed` if the listener update fails.
pub async fn manual_rollback<L>(
    load_balancers: &L,
    targets: &BlueGreenTargets,
) -> Result<Slot, DeployError>
where
    L: LoadBalancerOps + ?Sized,
{
    let live = match determine_active_slot(load_balancers, targets).await {
        SlotDetermination::Determined { slot } => slot,
        SlotDetermination::FallbackDefault { slot, reason } => {
            return Err(DeployError::RollbackRefused {
                slot: slot.other(),
                reason: format!("live slot unknown ({reason})"),
            });
        }
    };
    let destination = live.other();
    let target_group = targets.target_group(destination);

    let report = healthy_targets_once(load_balancers, target_group)
        .await
        .map_err(|e| DeployError::RollbackRefused {
            slot: destination,
            reason: format!("could not read target health: {e}"),
        })?;
    if report.healthy_count() == 0 {
        return Err(DeployError::RollbackRefused {
            slot: destination,
            reason: format!("no healthy targets ({})", report.summary()),
        });
    }

    tracing::info!(from = %live, to = %destination, "rolling back");
    switch_traffic(load_balancers, &targets.listener, target_group).await?;
    Ok(destination)
}
