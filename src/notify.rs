// ABOUTME: Best-effort deployment notifications to a Slack-style incoming webhook.
// ABOUTME: Failures become Diagnostics warnings and never change a deployment outcome.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::diagnostics::{Diagnostics, Warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Started,
    Succeeded,
    Failed,
    RolledBack,
}

impl NotificationKind {
    fn color(self) -> &'static str {
        match self {
            NotificationKind::Started => "#ffc107",
            NotificationKind::Succeeded => "#28a745",
            NotificationKind::Failed | NotificationKind::RolledBack => "#dc3545",
        }
    }

    fn title(self) -> &'static str {
        match self {
            NotificationKind::Started => "Deployment started",
            NotificationKind::Succeeded => "Deployment succeeded",
            NotificationKind::Failed => "Deployment failed",
            NotificationKind::RolledBack => "Deployment rolled back",
        }
    }
}

/// One event worth telling humans about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub environment: String,
    pub service: String,
    pub strategy: String,
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned status {0}")]
    Status(u16),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Posts notifications as Slack attachments.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }
}

#[derive(Serialize)]
struct SlackPayload<'a> {
    attachments: [SlackAttachment<'a>; 1],
}

#[derive(Serialize)]
struct SlackAttachment<'a> {
    color: &'a str,
    title: &'a str,
    text: &'a str,
    fields: Vec<SlackField<'a>>,
}

#[derive(Serialize)]
struct SlackField<'a> {
    title: &'a str,
    value: &'a str,
    short: bool,
}

fn payload(notification: &Notification) -> SlackPayload<'_> {
    SlackPayload {
        attachments: [SlackAttachment {
            color: notification.kind.color(),
            title: notification.kind.title(),
            text: &notification.detail,
            fields: vec![
                SlackField {
                    title: "Environment",
                    value: &notification.environment,
                    short: true,
                },
                SlackField {
                    title: "Service",
                    value: &notification.service,
                    short: true,
                },
                SlackField {
                    title: "Strategy",
                    value: &notification.strategy,
                    short: true,
                },
            ],
        }],
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::debug!(kind = ?notification.kind, "POST slack webhook");
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload(notification))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Used when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Build the notifier for an optional webhook URL.
///
/// A client that cannot be constructed degrades to no notifications.
pub fn notifier_for(webhook_url: Option<&str>) -> Box<dyn Notifier> {
    match webhook_url.map(SlackNotifier::new) {
        Some(Ok(slack)) => Box::new(slack),
        Some(Err(e)) => {
            tracing::warn!(error = %e, "cannot build webhook client, notifications disabled");
            Box::new(NoopNotifier)
        }
        None => Box::new(NoopNotifier),
    }
}

/// Send a notification, recording any failure as a warning.
pub async fn notify_best_effort(
    notifier: &dyn Notifier,
    diagnostics: &mut Diagnostics,
    notification: &Notification,
) {
    if let Err(e) = notifier.notify(notification).await {
        diagnostics.warn(Warning::notification(format!(
            "failed to send {:?} notification: {e}",
            notification.kind
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(kind: NotificationKind) -> Notification {
        Notification {
            kind,
            environment: "prod".to_string(),
            service: "prod-connectly-atlantis-service".to_string(),
            strategy: "blue_green".to_string(),
            detail: "switched to green".to_string(),
        }
    }

    #[test]
    fn payload_carries_color_and_fields() {
        let n = notification(NotificationKind::Succeeded);
        let json = serde_json::to_value(payload(&n)).unwrap();
        let attachment = &json["attachments"][0];
        assert_eq!(attachment["color"], "#28a745");
        assert_eq!(attachment["title"], "Deployment succeeded");
        assert_eq!(attachment["fields"][0]["value"], "prod");
    }

    #[tokio::test]
    async fn unreachable_webhook_becomes_warning() {
        let slack = SlackNotifier::new("http://127.0.0.1:9/hook").unwrap();
        let mut diagnostics = Diagnostics::default();

        notify_best_effort(
            &slack,
            &mut diagnostics,
            &notification(NotificationKind::Failed),
        )
        .await;

        assert_eq!(diagnostics.warnings().len(), 1);
    }

    #[tokio::test]
    async fn noop_never_warns() {
        let mut diagnostics = Diagnostics::default();
        notify_best_effort(
            &NoopNotifier,
            &mut diagnostics,
            &notification(NotificationKind::Started),
        )
        .await;
        assert!(!diagnostics.has_warnings());
    }
}
