// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes for deploys, gate reports and rollbacks.

use serde::Serialize;
use std::time::Instant;

use crate::deploy::DeploymentOutcome;
use crate::gate::HealthReport;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a warning. Quiet mode keeps warnings; they may need action.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => emit_err(&JsonEvent {
                event: "warning",
                message,
                duration_secs: None,
            }),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => emit(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => emit_err(&JsonEvent {
                event: "error",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print the per-check table of a gate run.
    pub fn health_report(&self, report: &HealthReport) {
        match self.mode {
            OutputMode::Normal => {
                for result in &report.results {
                    let mark = if result.passed { "✓" } else { "✗" };
                    println!("  {mark} {}: {}", result.check, result.message);
                }
                println!(
                    "Health check summary: {}/{} checks passed",
                    report.passed_count(),
                    report.total()
                );
            }
            OutputMode::Quiet => {
                for result in report.failures() {
                    println!("{}: {}", result.check, result.message);
                }
            }
            OutputMode::Json => emit(&ReportEvent {
                event: "health_report",
                passed: report.passed(),
                report,
            }),
        }
    }

    /// Print the terminal result of a deployment.
    pub fn deployment_outcome(&self, outcome: &DeploymentOutcome) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                for warning in &outcome.warnings {
                    self.warning(&warning.message);
                }
                if outcome.success {
                    self.success(&format!(
                        "Deployment to {} succeeded ({} strategy, serving from {})",
                        outcome.environment,
                        outcome.strategy,
                        outcome.slot_label()
                    ));
                } else {
                    let error = outcome.error.as_deref().unwrap_or("unknown error");
                    if outcome.rolled_back {
                        self.error(&format!(
                            "{error} (traffic rolled back to {})",
                            outcome.slot_label()
                        ));
                    } else {
                        self.error(error);
                    }
                }
            }
            OutputMode::Json => emit(&OutcomeEvent {
                event: "deployment_outcome",
                outcome,
            }),
        }
    }
}

fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

fn emit_err<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        eprintln!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct ReportEvent<'a> {
    event: &'a str,
    passed: bool,
    #[serde(flatten)]
    report: &'a HealthReport,
}

#[derive(Serialize)]
struct OutcomeEvent<'a> {
    event: &'a str,
    #[serde(flatten)]
    outcome: &'a DeploymentOutcome,
}
