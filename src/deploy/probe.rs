// ABOUTME: Target-health probe: waits until at least one target in a group is healthy.
// ABOUTME: Transient API errors are retried; only the deadline or an unmapped state ends the wait.

use crate::cloud::{CloudError, LoadBalancerOps, TargetHealthReport};
use crate::poll::{PollOutcome, PollSettings, Probe, poll_until};
use crate::types::TargetGroupArn;

/// Poll until one target is healthy. Returns as soon as one is seen.
///
/// Success carries the health summary at that moment.
pub async fn wait_for_healthy_targets<L>(
    load_balancers: &L,
    target_group: &TargetGroupArn,
    settings: PollSettings,
) -> PollOutcome<String>
where
    L: LoadBalancerOps + ?Sized,
{
    tracing::info!(
        target_group = target_group.short(),
        timeout_secs = settings.timeout.as_secs(),
        "waiting for healthy targets"
    );

    poll_until("target health", settings, || async move {
        let report = match load_balancers.target_health(target_group).await {
            Ok(report) => report,
            Err(e) if e.is_unmapped_state() => return Ok(Probe::Failed(e.to_string())),
            Err(e) => return Err(e),
        };

        if report.healthy_count() > 0 {
            tracing::info!(healthy = report.healthy_count(), "found healthy targets");
            Ok(Probe::Ready(report.summary()))
        } else {
            Ok(Probe::Pending(report.summary()))
        }
    })
    .await
}

/// One-shot variant: the current report, with no retry.
pub async fn healthy_targets_once<L>(
    load_balancers: &L,
    target_group: &TargetGroupArn,
) -> Result<TargetHealthReport, CloudError>
where
    L: LoadBalancerOps + ?Sized,
{
    load_balancers.target_health(target_group).await
}
