// ABOUTME: Validated, immutable input to one orchestration run.
// ABOUTME: Built from CLI flags or Lambda environment variables; blue/green identifiers are checked up front.

use serde::Deserialize;

use super::{Settings, TimeoutSettings};
use crate::deploy::DeploymentStrategy;
use crate::error::{Error, Result};
use crate::poll::MAX_TIMEOUT;
use crate::types::{ListenerArn, ResourceName, Slot, TargetGroupArn, TaskDefinition};

/// Container name and port the load balancer forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerBinding {
    #[serde(default = "default_container_name")]
    pub name: String,
    #[serde(default = "default_container_port")]
    pub port: u16,
}

fn default_container_name() -> String {
    "atlantis".to_string()
}

fn default_container_port() -> u16 {
    4141
}

impl Default for ContainerBinding {
    fn default() -> Self {
        ContainerBinding {
            name: default_container_name(),
            port: default_container_port(),
        }
    }
}

/// The listener and the two target groups of a blue/green pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueGreenTargets {
    pub blue: TargetGroupArn,
    pub green: TargetGroupArn,
    pub listener: ListenerArn,
}

impl BlueGreenTargets {
    pub fn target_group(&self, slot: Slot) -> &TargetGroupArn {
        match slot {
            Slot::Blue => &self.blue,
            Slot::Green => &self.green,
        }
    }

    /// Which slot a target group belongs to, if either.
    pub fn classify(&self, target_group: &TargetGroupArn) -> Option<Slot> {
        if *target_group == self.blue {
            Some(Slot::Blue)
        } else if *target_group == self.green {
            Some(Slot::Green)
        } else {
            None
        }
    }
}

/// Strategy together with the infrastructure it needs.
///
/// Blue/green cannot be constructed without its listener and target groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyConfig {
    Direct,
    BlueGreen(BlueGreenTargets),
}

impl StrategyConfig {
    pub fn kind(&self) -> DeploymentStrategy {
        match self {
            StrategyConfig::Direct => DeploymentStrategy::Direct,
            StrategyConfig::BlueGreen(_) => DeploymentStrategy::BlueGreen,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub cluster: ResourceName,
    pub service: ResourceName,
    pub task_definition: TaskDefinition,
    pub strategy: StrategyConfig,
    pub environment: String,
    pub health_check_path: String,
    pub timeouts: TimeoutSettings,
    pub container: ContainerBinding,
}

impl DeploymentConfig {
    pub fn strategy_kind(&self) -> DeploymentStrategy {
        self.strategy.kind()
    }

    pub fn blue_green(&self) -> Option<&BlueGreenTargets> {
        match &self.strategy {
            StrategyConfig::BlueGreen(targets) => Some(targets),
            StrategyConfig::Direct => None,
        }
    }
}

/// Unvalidated deployment parameters as they arrive from a CLI or the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentInput {
    pub cluster: Option<String>,
    pub service: Option<String>,
    pub task_definition: Option<String>,
    pub strategy: Option<DeploymentStrategy>,
    pub environment: Option<String>,
    pub blue_target_group: Option<String>,
    pub green_target_group: Option<String>,
    pub listener: Option<String>,
    pub health_check_path: Option<String>,
    pub timeout_minutes: Option<u64>,
}

impl DeploymentInput {
    /// Read parameters from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read parameters through an arbitrary variable lookup.
    ///
    /// `CLUSTER_NAME`, `SERVICE_NAME` and `ENVIRONMENT` are required.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).ok_or_else(|| Error::MissingEnvVar(key.to_string()));

        let strategy = get("DEPLOYMENT_STRATEGY")
            .map(|s| s.parse::<DeploymentStrategy>())
            .transpose()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        let timeout_minutes = get("TIMEOUT_MINUTES")
            .map(|s| {
                s.trim().parse::<u64>().map_err(|_| {
                    Error::InvalidConfig(format!("TIMEOUT_MINUTES must be a whole number: {s}"))
                })
            })
            .transpose()?;

        Ok(Self {
            cluster: Some(require("CLUSTER_NAME")?),
            service: Some(require("SERVICE_NAME")?),
            task_definition: get("TASK_DEFINITION"),
            strategy,
            environment: Some(require("ENVIRONMENT")?),
            blue_target_group: get("BLUE_TG_ARN"),
            green_target_group: get("GREEN_TG_ARN"),
            listener: get("LISTENER_ARN"),
            health_check_path: get("HEALTH_CHECK_URL"),
            timeout_minutes,
        })
    }

    /// Validate into a `DeploymentConfig`. No cloud API is touched.
    pub fn build(self, settings: &Settings) -> Result<DeploymentConfig> {
        let cluster = required(self.cluster, "cluster")?;
        let service = required(self.service, "service")?;
        let task_definition = required(self.task_definition, "task definition")?;
        let environment = required(self.environment, "environment")?;

        let cluster = ResourceName::new(&cluster)
            .map_err(|e| Error::InvalidConfig(format!("cluster: {e}")))?;
        let service = ResourceName::new(&service)
            .map_err(|e| Error::InvalidConfig(format!("service: {e}")))?;
        let task_definition = TaskDefinition::parse(&task_definition)
            .map_err(|e| Error::InvalidConfig(format!("task definition: {e}")))?;

        let strategy = match self.strategy.unwrap_or(DeploymentStrategy::Direct) {
            DeploymentStrategy::Direct => StrategyConfig::Direct,
            DeploymentStrategy::BlueGreen => {
                let blue = self
                    .blue_target_group
                    .ok_or(Error::IncompleteBlueGreen("blue target group ARN"))?;
                let green = self
                    .green_target_group
                    .ok_or(Error::IncompleteBlueGreen("green target group ARN"))?;
                let listener = self
                    .listener
                    .ok_or(Error::IncompleteBlueGreen("listener ARN"))?;

                if blue == green {
                    return Err(Error::InvalidConfig(
                        "blue and green target groups must differ".to_string(),
                    ));
                }

                StrategyConfig::BlueGreen(BlueGreenTargets {
                    blue: TargetGroupArn::new(blue),
                    green: TargetGroupArn::new(green),
                    listener: ListenerArn::new(listener),
                })
            }
        };

        let timeouts = match self.timeout_minutes {
            Some(minutes) => settings
                .timeouts
                .with_rollout_minutes(minutes)
                .ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "timeout must be between 1 and {} minutes, got {minutes}",
                        MAX_TIMEOUT.as_secs() / 60
                    ))
                })?,
            None => settings.timeouts,
        };

        Ok(DeploymentConfig {
            cluster,
            service,
            task_definition,
            strategy,
            environment,
            health_check_path: self
                .health_check_path
                .unwrap_or_else(|| "/healthz".to_string()),
            timeouts,
            container: settings.container.clone(),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(Error::MissingField(field))
}
