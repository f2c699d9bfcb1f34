// ABOUTME: Terminal, externally observable result of one orchestration run.
// ABOUTME: Serialized in full for --json output and trimmed for the Lambda response body.

use serde::Serialize;
use serde_json::{Value, json};

use super::slot::SlotDetermination;
use super::state::Phase;
use super::strategy::DeploymentStrategy;
use crate::diagnostics::Warning;
use crate::types::Slot;

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentOutcome {
    pub success: bool,
    pub environment: String,
    pub strategy: DeploymentStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// State in which the run failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_phase: Option<Phase>,
    /// Slot serving traffic when the run ended; `None` for direct deployments.
    pub slot: Option<Slot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_determination: Option<SlotDetermination>,
    /// Traffic was switched back after a failed post-switch verification.
    pub rolled_back: bool,
    pub elapsed_secs: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl DeploymentOutcome {
    /// Slot name for display. Direct deployments run on the single `main` service.
    pub fn slot_label(&self) -> &'static str {
        self.slot.map(Slot::as_str).unwrap_or("main")
    }

    /// `{success, environment, strategy, error?}`.
    pub fn summary(&self) -> Value {
        let mut body = json!({
            "success": self.success,
            "environment": self.environment,
            "strategy": self.strategy.as_str(),
        });
        if let Some(error) = &self.error {
            body["error"] = Value::String(error.clone());
        }
        body
    }
}
