// ABOUTME: Deploy command implementation.
// ABOUTME: Validates parameters, takes the deploy lock, and runs the health gate ahead of the orchestrator.

use atlantis_deploy::clock::SystemClock;
use atlantis_deploy::cloud::AwsCloud;
use atlantis_deploy::config::{Environment, Settings};
use atlantis_deploy::deploy::{DeployLock, Orchestrator, default_state_dir};
use atlantis_deploy::diagnostics::Warning;
use atlantis_deploy::error::{Error, Result};
use atlantis_deploy::gate::HealthGate;
use atlantis_deploy::notify::notifier_for;
use atlantis_deploy::output::Output;

use super::preflight::{announce, gate_client};
use crate::cli::DeployArgs;

/// Deploy a task definition with the configured strategy.
pub async fn deploy(settings: &Settings, args: DeployArgs, mut output: Output) -> Result<()> {
    let skip_preflight = args.skip_preflight;
    let force = args.force;

    // Everything is validated before the first cloud call.
    let config = args.into_input().build(settings)?;
    let gate_target = if skip_preflight {
        None
    } else {
        let environment = config.environment.parse::<Environment>()?;
        Some(settings.for_environment(environment)?)
    };

    output.start_timer();
    output.progress(&format!(
        "Deploying {} to {} ({} strategy)",
        config.task_definition,
        config.service,
        config.strategy_kind()
    ));

    let cloud = AwsCloud::from_env().await;
    let notifier = notifier_for(settings.webhook_for(&config.environment));
    let orchestrator = Orchestrator::new(&cloud, notifier.as_ref());

    let state_dir = default_state_dir()?;
    let lock = DeployLock::acquire(&state_dir, &config.cluster, &config.service, force)?;
    tracing::debug!(path = %lock.path().display(), "deploy lock acquired");

    let gated = match &gate_target {
        Some(target) => {
            announce(target, &output);
            let client = gate_client(
                target,
                &settings.preflight,
                Some(config.health_check_path.as_str()),
            )?;
            let gate = HealthGate::new(target, &client, &cloud)
                .with_clock(&SystemClock)
                .with_window(settings.window);
            orchestrator
                .run_gated(config, &gate, &settings.preflight, |report| {
                    output.health_report(report)
                })
                .await
        }
        None => {
            output.warning("Skipping pre-flight health gate");
            Ok(orchestrator.run(config).await)
        }
    };

    let release = lock.release();
    let mut outcome = match gated {
        Ok(outcome) => outcome,
        Err(report) => {
            return Err(Error::PreflightFailed {
                passed: report.passed_count(),
                total: report.total(),
            });
        }
    };
    if let Err(e) = release {
        tracing::warn!(error = %e, "failed to release deploy lock");
        outcome
            .warnings
            .push(Warning::lock_release(format!("failed to release deploy lock: {e}")));
    }

    output.deployment_outcome(&outcome);
    if outcome.success {
        Ok(())
    } else {
        Err(Error::DeploymentFailed(
            outcome.error.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}
