// ABOUTME: AWS implementation of ServiceOps and LoadBalancerOps.
// ABOUTME: Wraps the ECS and ELBv2 SDK clients and maps responses onto closed enums.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_elasticloadbalancingv2::types::{Action, ActionTypeEnum};
use snafu::ResultExt;

use super::error::{CloudError, UnmappedSnafu};
use super::traits::{LoadBalancerOps, ServiceOps};
use super::types::{DeploymentSummary, ServiceDescription, ServiceUpdate, TargetHealthReport};
use crate::types::{
    DeploymentRole, ListenerArn, ResourceName, RolloutState, ServiceStatus, TargetGroupArn,
    TargetHealthState,
};

/// ECS and ELBv2 clients sharing one credential/region configuration.
#[derive(Debug, Clone)]
pub struct AwsCloud {
    ecs: aws_sdk_ecs::Client,
    elb: aws_sdk_elasticloadbalancingv2::Client,
}

impl AwsCloud {
    /// Build clients from the default provider chain (env, profile, IMDS, Lambda role).
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(&config)
    }

    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            ecs: aws_sdk_ecs::Client::new(config),
            elb: aws_sdk_elasticloadbalancingv2::Client::new(config),
        }
    }
}

fn api_error<E: std::error::Error>(operation: &'static str, err: E) -> CloudError {
    CloudError::api(operation, DisplayErrorContext(err).to_string())
}

fn summarize_deployment(
    deployment: &aws_sdk_ecs::types::Deployment,
) -> Result<DeploymentSummary, CloudError> {
    let role = deployment
        .status()
        .unwrap_or_default()
        .parse::<DeploymentRole>()
        .context(UnmappedSnafu {
            operation: "DescribeServices",
        })?;

    let rollout_state = deployment
        .rollout_state()
        .map(|s| s.as_str().parse::<RolloutState>())
        .transpose()
        .context(UnmappedSnafu {
            operation: "DescribeServices",
        })?;

    Ok(DeploymentSummary {
        id: deployment.id().unwrap_or_default().to_string(),
        role,
        rollout_state,
        rollout_state_reason: deployment.rollout_state_reason().map(str::to_string),
        desired_count: deployment.desired_count(),
        running_count: deployment.running_count(),
    })
}

/// Default action sending all listener traffic to one target group.
fn forward_action(target_group: &TargetGroupArn) -> Action {
    Action::builder()
        .r#type(ActionTypeEnum::Forward)
        .target_group_arn(target_group.as_str())
        .build()
}

/// Target group a set of listener actions forwards to.
///
/// Only forward actions carry a target group. A weighted forward picks the
/// heaviest group, which is the one receiving the bulk of traffic.
fn forward_target(actions: &[Action]) -> Option<TargetGroupArn> {
    actions.iter().find_map(|action| {
        if let Some(arn) = action.target_group_arn() {
            return Some(TargetGroupArn::new(arn));
        }
        action
            .forward_config()
            .and_then(|forward| {
                forward
                    .target_groups()
                    .iter()
                    .max_by_key(|tuple| tuple.weight().unwrap_or(1))
            })
            .and_then(|tuple| tuple.target_group_arn())
            .map(TargetGroupArn::new)
    })
}

#[async_trait]
impl ServiceOps for AwsCloud {
    async fn describe_service(
        &self,
        cluster: &ResourceName,
        service: &ResourceName,
    ) -> Result<ServiceDescription, CloudError> {
        let output = self
            .ecs
            .describe_services()
            .cluster(cluster.as_str())
            .services(service.as_str())
            .send()
            .await
            .map_err(|e| api_error("DescribeServices", e))?;

        let svc = output
            .services()
            .first()
            .ok_or_else(|| CloudError::NotFound {
                resource: "ECS service",
                name: format!("{}/{}", cluster, service),
            })?;

        let status = svc
            .status()
            .unwrap_or_default()
            .parse::<ServiceStatus>()
            .context(UnmappedSnafu {
                operation: "DescribeServices",
            })?;

        let deployments = svc
            .deployments()
            .iter()
            .map(summarize_deployment)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ServiceDescription {
            status,
            desired_count: svc.desired_count(),
            running_count: svc.running_count(),
            deployments,
        })
    }

    async fn update_service(&self, update: &ServiceUpdate) -> Result<(), CloudError> {
        let mut request = self
            .ecs
            .update_service()
            .cluster(update.cluster.as_str())
            .service(update.service.as_str())
            .task_definition(update.task_definition.as_str());

        if let Some(binding) = &update.load_balancer {
            request = request.load_balancers(
                aws_sdk_ecs::types::LoadBalancer::builder()
                    .target_group_arn(binding.target_group.as_str())
                    .container_name(binding.container_name.as_str())
                    .container_port(i32::from(binding.container_port))
                    .build(),
            );
        }

        request
            .send()
            .await
            .map_err(|e| api_error("UpdateService", e))?;
        Ok(())
    }
}

#[async_trait]
impl LoadBalancerOps for AwsCloud {
    async fn listener_forward_target(
        &self,
        listener: &ListenerArn,
    ) -> Result<Option<TargetGroupArn>, CloudError> {
        let output = self
            .elb
            .describe_listeners()
            .listener_arns(listener.as_str())
            .send()
            .await
            .map_err(|e| api_error("DescribeListeners", e))?;

        let description = output
            .listeners()
            .first()
            .ok_or_else(|| CloudError::NotFound {
                resource: "listener",
                name: listener.to_string(),
            })?;

        Ok(forward_target(description.default_actions()))
    }

    async fn target_health(
        &self,
        target_group: &TargetGroupArn,
    ) -> Result<TargetHealthReport, CloudError> {
        let output = self
            .elb
            .describe_target_health()
            .target_group_arn(target_group.as_str())
            .send()
            .await
            .map_err(|e| api_error("DescribeTargetHealth", e))?;

        let targets = output
            .target_health_descriptions()
            .iter()
            .map(|description| {
                description
                    .target_health()
                    .and_then(|health| health.state())
                    .map(|state| state.as_str())
                    .unwrap_or_default()
                    .parse::<TargetHealthState>()
            })
            .collect::<Result<Vec<_>, _>>()
            .context(UnmappedSnafu {
                operation: "DescribeTargetHealth",
            })?;

        Ok(TargetHealthReport::new(targets))
    }

    async fn forward_all(
        &self,
        listener: &ListenerArn,
        target_group: &TargetGroupArn,
    ) -> Result<(), CloudError> {
        self.elb
            .modify_listener()
            .listener_arn(listener.as_str())
            .default_actions(forward_action(target_group))
            .send()
            .await
            .map_err(|e| api_error("ModifyListener", e))?;
        Ok(())
    }

    async fn find_target_group(&self, name: &str) -> Result<Option<TargetGroupArn>, CloudError> {
        match self.elb.describe_target_groups().names(name).send().await {
            Ok(output) => Ok(output
                .target_groups()
                .first()
                .and_then(|tg| tg.target_group_arn())
                .map(TargetGroupArn::new)),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_target_group_not_found_exception()) =>
            {
                Ok(None)
            }
            Err(err) => Err(api_error("DescribeTargetGroups", err)),
        }
    }
}
