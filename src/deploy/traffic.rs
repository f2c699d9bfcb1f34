// ABOUTME: Traffic switch: repoint a listener's default action at one target group.
// ABOUTME: One call, never retried; an unconfirmed switch is reported as a failure.

use crate::cloud::LoadBalancerOps;
use crate::types::{ListenerArn, TargetGroupArn};

use super::DeployError;

pub async fn switch_traffic<L>(
    load_balancers: &L,
    listener: &ListenerArn,
    destination: &TargetGroupArn,
) -> Result<(), DeployError>
where
    L: LoadBalancerOps + ?Sized,
{
    tracing::info!(
        listener = listener.short(),
        target_group = destination.short(),
        "switching traffic"
    );

    load_balancers
        .forward_all(listener, destination)
        .await
        .map_err(|source| DeployError::SwitchFailed {
            target_group: destination.to_string(),
            source,
        })?;

    tracing::info!("traffic switched");
    Ok(())
}
