// ABOUTME: Deployment watcher: polls an ECS service until its rollout completes or fails.
// ABOUTME: An explicit FAILED rollout or an unmapped state ends the wait immediately.

use crate::cloud::ServiceOps;
use crate::poll::{PollOutcome, PollSettings, Probe, poll_until};
use crate::types::{ResourceName, RolloutState};

/// Wait for the primary deployment of `service` to reach `COMPLETED`.
///
/// Success and failure both carry a human-readable description of what was seen.
pub async fn watch_rollout<S>(
    services: &S,
    cluster: &ResourceName,
    service: &ResourceName,
    settings: PollSettings,
) -> PollOutcome<String>
where
    S: ServiceOps + ?Sized,
{
    tracing::info!(
        %cluster,
        %service,
        timeout_secs = settings.timeout.as_secs(),
        "waiting for rollout"
    );

    poll_until("service rollout", settings, || async move {
        let description = match services.describe_service(cluster, service).await {
            Ok(description) => description,
            Err(e) if e.is_unmapped_state() => return Ok(Probe::Failed(e.to_string())),
            Err(e) => return Err(e),
        };

        if let Some(failed) = description.failed_deployment() {
            return Ok(Probe::Failed(format!(
                "deployment {} failed: {}",
                failed.id,
                failed
                    .rollout_state_reason
                    .as_deref()
                    .unwrap_or("no reason reported")
            )));
        }

        let completed = description
            .primary()
            .is_some_and(|primary| primary.rollout_state == Some(RolloutState::Completed));

        if completed {
            Ok(Probe::Ready(description.progress()))
        } else {
            Ok(Probe::Pending(description.progress()))
        }
    })
    .await
}
