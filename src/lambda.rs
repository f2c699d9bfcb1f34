// ABOUTME: Cloud-function entry point: reads parameters from the environment and runs one deployment.
// ABOUTME: Always answers with {statusCode, body}; failures become 500 rather than runtime errors.

use std::sync::Arc;

use lambda_runtime::{LambdaEvent, service_fn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::cloud::{AwsCloud, LoadBalancerOps, ServiceOps};
use crate::config::{DeploymentInput, Settings};
use crate::deploy::{DeploymentOutcome, Orchestrator};
use crate::error::{Error, Result};
use crate::notify::{Notifier, notifier_for};

/// Invocation payload. Every field is optional; the environment supplies the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeployEvent {
    /// Overrides `TASK_DEFINITION`.
    #[serde(default)]
    pub task_definition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LambdaResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON document, serialized.
    pub body: String,
}

impl LambdaResponse {
    fn new(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    /// Parsed body. Only fails if the body was built outside this module.
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

pub fn response_for(outcome: &DeploymentOutcome) -> LambdaResponse {
    let status = if outcome.success { 200 } else { 500 };
    LambdaResponse::new(status, &outcome.summary())
}

fn config_error(err: &Error) -> LambdaResponse {
    LambdaResponse::new(500, &json!({ "success": false, "error": err.to_string() }))
}

/// Handle one invocation against the given collaborators.
///
/// `lookup` stands in for the process environment.
pub async fn handle_with<C, F>(
    cloud: &C,
    notifier: &dyn Notifier,
    settings: &Settings,
    event: DeployEvent,
    lookup: F,
) -> LambdaResponse
where
    C: ServiceOps + LoadBalancerOps + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    let config = DeploymentInput::from_lookup(lookup).and_then(|mut input| {
        if let Some(task_definition) = event.task_definition.filter(|t| !t.trim().is_empty()) {
            input.task_definition = Some(task_definition);
        }
        input.build(settings)
    });

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid deployment parameters");
            return config_error(&e);
        }
    };

    let outcome = Orchestrator::new(cloud, notifier).run(config).await;
    response_for(&outcome)
}

/// Serve invocations until the runtime shuts the process down.
///
/// Takes no deploy lock: concurrent invocations for one service must be
/// serialized by whatever triggers them.
pub async fn run(settings: Settings) -> Result<()> {
    let cloud = Arc::new(AwsCloud::from_env().await);
    let webhook = std::env::var("SLACK_WEBHOOK_URL")
        .ok()
        .filter(|url| !url.is_empty())
        .or_else(|| settings.notifications.slack_webhook_url.clone());
    let notifier: Arc<dyn Notifier> = Arc::from(notifier_for(webhook.as_deref()));
    let settings = Arc::new(settings);

    tracing::info!("lambda runtime starting");
    lambda_runtime::run(service_fn(move |event: LambdaEvent<DeployEvent>| {
        let cloud = Arc::clone(&cloud);
        let notifier = Arc::clone(&notifier);
        let settings = Arc::clone(&settings);
        async move {
            tracing::info!(request_id = %event.context.request_id, "deployment invoked");
            let response = handle_with(
                cloud.as_ref(),
                notifier.as_ref(),
                &settings,
                event.payload,
                |key| std::env::var(key).ok(),
            )
            .await;
            Ok::<_, lambda_runtime::Error>(response)
        }
    }))
    .await
    .map_err(|e| Error::Lambda(e.to_string()))
}
