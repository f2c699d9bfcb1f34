// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use std::path::PathBuf;

use atlantis_deploy::config::{DeploymentInput, Environment};
use atlantis_deploy::deploy::DeploymentStrategy;
use atlantis_deploy::output::OutputMode;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "atlantis-deploy")]
#[command(about = "Blue/green ECS deployments for Atlantis with a pre-flight health gate")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output for CI (only final result)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Output as JSON lines for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Settings file (defaults to atlantis-deploy.yml in the working directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Roll a new task definition onto an ECS service
    Deploy(DeployArgs),

    /// Run the pre-flight health gate for an environment (exit 0 pass, 1 fail)
    Preflight(PreflightArgs),

    /// Switch the listener back to the other blue/green slot
    Rollback(RollbackArgs),

    /// Serve deployments as a Lambda function, reading parameters from the environment
    Lambda,
}

#[derive(Args)]
pub struct DeployArgs {
    /// ECS cluster name or ARN
    #[arg(long)]
    pub cluster: String,

    /// ECS service name or ARN
    #[arg(long)]
    pub service: String,

    /// Task definition to deploy (family:revision or ARN)
    #[arg(long)]
    pub task_definition: String,

    #[arg(long, value_enum, default_value_t = DeploymentStrategy::Direct)]
    pub strategy: DeploymentStrategy,

    /// Environment name, used for reporting, notifications and the health gate
    #[arg(long)]
    pub environment: String,

    /// Blue target group ARN (blue_green only)
    #[arg(long)]
    pub blue_tg: Option<String>,

    /// Green target group ARN (blue_green only)
    #[arg(long)]
    pub green_tg: Option<String>,

    /// Listener ARN (blue_green only)
    #[arg(long)]
    pub listener: Option<String>,

    /// Rollout timeout in minutes
    #[arg(long)]
    pub timeout_minutes: Option<u64>,

    /// Liveness path on the Atlantis API
    #[arg(long)]
    pub health_check_path: Option<String>,

    /// Skip the pre-flight health gate
    #[arg(long)]
    pub skip_preflight: bool,

    /// Break an existing deploy lock held by another process
    #[arg(long)]
    pub force: bool,
}

impl DeployArgs {
    pub fn into_input(self) -> DeploymentInput {
        DeploymentInput {
            cluster: Some(self.cluster),
            service: Some(self.service),
            task_definition: Some(self.task_definition),
            strategy: Some(self.strategy),
            environment: Some(self.environment),
            blue_target_group: self.blue_tg,
            green_target_group: self.green_tg,
            listener: self.listener,
            health_check_path: self.health_check_path,
            timeout_minutes: self.timeout_minutes,
        }
    }
}

#[derive(Args)]
pub struct PreflightArgs {
    #[arg(short, long, value_enum)]
    pub environment: Environment,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Attempts of the full check battery
    #[arg(long)]
    pub retry_count: Option<u32>,

    /// Seconds between attempts
    #[arg(long)]
    pub retry_delay: Option<u64>,

    /// Evaluate the deployment window at this instant (RFC 3339) instead of now
    #[arg(long, value_name = "TIMESTAMP")]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Args)]
pub struct RollbackArgs {
    /// Listener ARN
    #[arg(long)]
    pub listener: String,

    /// Blue target group ARN
    #[arg(long)]
    pub blue_tg: String,

    /// Green target group ARN
    #[arg(long)]
    pub green_tg: String,
}
