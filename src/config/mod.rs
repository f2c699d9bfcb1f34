// ABOUTME: Configuration types and parsing for atlantis-deploy.yml.
// ABOUTME: Handles settings discovery, built-in defaults, and per-environment overrides.

mod deployment;
mod environment;
mod timeouts;

pub use deployment::{
    BlueGreenTargets, ContainerBinding, DeploymentConfig, DeploymentInput, StrategyConfig,
};
pub use environment::Environment;
pub use timeouts::TimeoutSettings;

use crate::error::{Error, Result};
use crate::gate::WindowPolicy;
use crate::types::ResourceName;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "atlantis-deploy.yml";
pub const CONFIG_FILENAME_ALT: &str = "atlantis-deploy.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".atlantis-deploy/config.yml";

/// Operator settings shared by `deploy`, `preflight`, `rollback` and the Lambda handler.
///
/// Every field has a default, so an absent settings file is equivalent to an empty one.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_project")]
    pub project: String,

    /// Environment subject to the deployment-window policy.
    #[serde(default = "default_production_environment")]
    pub production_environment: Environment,

    #[serde(default)]
    pub container: ContainerBinding,

    #[serde(default)]
    pub timeouts: TimeoutSettings,

    #[serde(default)]
    pub preflight: PreflightSettings,

    #[serde(default)]
    pub window: WindowPolicy,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub environments: HashMap<Environment, EnvironmentOverride>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PreflightSettings {
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Total attempts of the full check battery.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    #[serde(default = "default_retry_delay", with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for PreflightSettings {
    fn default() -> Self {
        PreflightSettings {
            request_timeout: default_request_timeout(),
            retry_count: default_retry_count(),
            retry_delay: default_retry_delay(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub slack_webhook_url: Option<String>,
}

/// Per-environment overrides. Unset fields fall back to naming conventions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvironmentOverride {
    #[serde(default)]
    pub atlantis_url: Option<String>,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub target_group: Option<String>,
    #[serde(default)]
    pub slack_webhook_url: Option<String>,
}

/// Everything the health gate needs to know about one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateTarget {
    pub environment: Environment,
    pub atlantis_url: String,
    pub cluster: ResourceName,
    pub service: ResourceName,
    pub target_group: String,
    /// Whether the deployment-window policy applies.
    pub production: bool,
}

fn default_project() -> String {
    "connectly-atlantis".to_string()
}

fn default_production_environment() -> Environment {
    Environment::Prod
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(10)
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            project: default_project(),
            production_environment: default_production_environment(),
            container: ContainerBinding::default(),
            timeouts: TimeoutSettings::default(),
            preflight: PreflightSettings::default(),
            window: WindowPolicy::default(),
            notifications: NotificationSettings::default(),
            environments: HashMap::new(),
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        if let Some(budget) = settings.timeouts.oversized() {
            return Err(Error::InvalidConfig(format!(
                "timeouts.{budget} must not exceed 24h"
            )));
        }
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading settings");
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Like `discover`, but an absent settings file yields the built-in defaults.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Err(Error::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Resolve the gate target for an environment, applying overrides.
    pub fn for_environment(&self, environment: Environment) -> Result<GateTarget> {
        let overrides = self
            .environments
            .get(&environment)
            .cloned()
            .unwrap_or_default();
        let prefix = format!("{}-{}", environment, self.project);

        let cluster = overrides
            .cluster
            .unwrap_or_else(|| format!("{prefix}-cluster"));
        let service = overrides
            .service
            .unwrap_or_else(|| format!("{prefix}-service"));

        Ok(GateTarget {
            environment,
            atlantis_url: overrides
                .atlantis_url
                .unwrap_or_else(|| environment.default_atlantis_url().to_string()),
            cluster: ResourceName::new(&cluster)
                .map_err(|e| Error::InvalidConfig(format!("cluster {cluster:?}: {e}")))?,
            service: ResourceName::new(&service)
                .map_err(|e| Error::InvalidConfig(format!("service {service:?}: {e}")))?,
            target_group: overrides.target_group.unwrap_or(prefix),
            production: environment == self.production_environment,
        })
    }

    /// Webhook for a deployment environment: per-environment override, then the global one.
    pub fn webhook_for(&self, environment: &str) -> Option<&str> {
        environment
            .parse::<Environment>()
            .ok()
            .and_then(|env| self.environments.get(&env))
            .and_then(|o| o.slack_webhook_url.as_deref())
            .or(self.notifications.slack_webhook_url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_is_all_defaults() {
        let settings = Settings::from_yaml("{}").unwrap();
        assert_eq!(settings.project, "connectly-atlantis");
        assert_eq!(settings.production_environment, Environment::Prod);
        assert_eq!(settings.container.port, 4141);
        assert_eq!(settings.preflight.retry_count, 3);
    }

    #[test]
    fn naming_follows_environment_and_project() {
        let target = Settings::default()
            .for_environment(Environment::Staging)
            .unwrap();
        assert_eq!(
            target.cluster.as_str(),
            "staging-connectly-atlantis-cluster"
        );
        assert_eq!(
            target.service.as_str(),
            "staging-connectly-atlantis-service"
        );
        assert_eq!(target.target_group, "staging-connectly-atlantis");
        assert_eq!(target.atlantis_url, "https://atlantis-staging.set-of.com");
        assert!(!target.production);
    }

    #[test]
    fn environment_overrides_replace_conventions() {
        let yaml = r#"
environments:
  prod:
    atlantis_url: https://atlantis.internal
    target_group: prod-tg
    slack_webhook_url: https://hooks.example/prod
notifications:
  slack_webhook_url: https://hooks.example/all
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        let target = settings.for_environment(Environment::Prod).unwrap();

        assert_eq!(target.atlantis_url, "https://atlantis.internal");
        assert_eq!(target.target_group, "prod-tg");
        assert_eq!(target.cluster.as_str(), "prod-connectly-atlantis-cluster");
        assert!(target.production);
        assert_eq!(
            settings.webhook_for("prod"),
            Some("https://hooks.example/prod")
        );
        assert_eq!(
            settings.webhook_for("preview-42"),
            Some("https://hooks.example/all")
        );
    }

    #[test]
    fn unknown_environment_key_is_rejected() {
        assert!(Settings::from_yaml("environments:\n  qa: {}\n").is_err());
    }

    #[test]
    fn timeouts_longer_than_a_day_are_rejected() {
        let err = Settings::from_yaml("timeouts:\n  rollout: 30days\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref m) if m.contains("timeouts.rollout")));
    }
}
