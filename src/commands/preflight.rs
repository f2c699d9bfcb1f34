// ABOUTME: Preflight command implementation.
// ABOUTME: Runs the health gate battery with retries and prints the per-check report.

use std::time::Duration;

use atlantis_deploy::clock::{Clock, FixedClock, SystemClock};
use atlantis_deploy::cloud::AwsCloud;
use atlantis_deploy::config::{Environment, GateTarget, PreflightSettings, Settings};
use atlantis_deploy::control_plane::AtlantisClient;
use atlantis_deploy::error::{Error, Result};
use atlantis_deploy::gate::{HealthGate, HealthReport};
use atlantis_deploy::output::Output;

use crate::cli::PreflightArgs;

/// Gate parameters after applying command-line overrides to the settings file.
struct GateRun<'a> {
    environment: Environment,
    preflight: PreflightSettings,
    health_path: Option<&'a str>,
    clock: &'a dyn Clock,
}

/// Atlantis client for a gate target, honoring the liveness path override.
pub(crate) fn gate_client(
    target: &GateTarget,
    preflight: &PreflightSettings,
    health_path: Option<&str>,
) -> Result<AtlantisClient> {
    let client = AtlantisClient::new(&target.atlantis_url, preflight.request_timeout)?;
    Ok(match health_path {
        Some(path) => client.health_path(path),
        None => client,
    })
}

pub(crate) fn announce(target: &GateTarget, output: &Output) {
    output.progress(&format!(
        "Running pre-flight health checks for {} ({})",
        target.environment, target.atlantis_url
    ));
}

/// Run the gate for one environment and print its report.
async fn run_gate(
    settings: &Settings,
    cloud: &AwsCloud,
    run: GateRun<'_>,
    output: &Output,
) -> Result<HealthReport> {
    let target = settings.for_environment(run.environment)?;
    announce(&target, output);

    let client = gate_client(&target, &run.preflight, run.health_path)?;
    let report = HealthGate::new(&target, &client, cloud)
        .with_clock(run.clock)
        .with_window(settings.window)
        .run_with_retries(run.preflight.retry_count, run.preflight.retry_delay)
        .await;

    output.health_report(&report);
    Ok(report)
}

pub async fn preflight(settings: &Settings, args: PreflightArgs, mut output: Output) -> Result<()> {
    output.start_timer();

    let mut preflight = settings.preflight;
    if let Some(secs) = args.timeout {
        preflight.request_timeout = Duration::from_secs(secs);
    }
    if let Some(count) = args.retry_count {
        preflight.retry_count = count;
    }
    if let Some(secs) = args.retry_delay {
        preflight.retry_delay = Duration::from_secs(secs);
    }

    let fixed = args.at.map(FixedClock);
    let clock: &dyn Clock = match &fixed {
        Some(clock) => clock,
        None => &SystemClock,
    };

    let cloud = AwsCloud::from_env().await;
    let run = GateRun {
        environment: args.environment,
        preflight,
        health_path: None,
        clock,
    };
    let report = run_gate(settings, &cloud, run, &output).await?;

    if report.passed() {
        output.success("All health checks passed, safe to deploy");
        Ok(())
    } else {
        Err(Error::PreflightFailed {
            passed: report.passed_count(),
            total: report.total(),
        })
    }
}
