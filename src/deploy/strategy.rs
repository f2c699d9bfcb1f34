// ABOUTME: Deployment strategy selection.
// ABOUTME: Direct updates the service in place; blue/green deploys to the idle slot and switches traffic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy for rolling out a new task definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStrategy {
    /// Update the single running service in place and wait for the rollout.
    /// No listener is touched.
    #[value(name = "direct")]
    Direct,

    /// Deploy to the inactive target group, verify it, then repoint the listener.
    #[value(name = "blue_green", alias = "blue-green")]
    BlueGreen,
}

impl DeploymentStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentStrategy::Direct => "direct",
            DeploymentStrategy::BlueGreen => "blue_green",
        }
    }
}

impl fmt::Display for DeploymentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown deployment strategy: {0} (expected direct or blue_green)")]
pub struct UnknownStrategy(pub String);

impl FromStr for DeploymentStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "direct" => Ok(DeploymentStrategy::Direct),
            "blue_green" | "blue-green" => Ok(DeploymentStrategy::BlueGreen),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_spellings_of_blue_green() {
        assert_eq!(
            "blue_green".parse::<DeploymentStrategy>(),
            Ok(DeploymentStrategy::BlueGreen)
        );
        assert_eq!(
            "blue-green".parse::<DeploymentStrategy>(),
            Ok(DeploymentStrategy::BlueGreen)
        );
    }

    #[test]
    fn parses_direct() {
        assert_eq!(
            "direct".parse::<DeploymentStrategy>(),
            Ok(DeploymentStrategy::Direct)
        );
    }

    #[test]
    fn rejects_unknown_strategy() {
        let err = "canary".parse::<DeploymentStrategy>().unwrap_err();
        assert!(err.to_string().contains("canary"));
    }

    #[test]
    fn serializes_as_wire_name() {
        assert_eq!(
            serde_json::to_string(&DeploymentStrategy::BlueGreen).unwrap(),
            "\"blue_green\""
        );
    }
}
