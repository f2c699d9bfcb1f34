// ABOUTME: Application-wide error types for atlantis-deploy.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::cloud::CloudError;
use crate::deploy::DeployError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("missing required parameter: {0}")]
    MissingField(&'static str),

    #[error("blue_green strategy requires a {0}")]
    IncompleteBlueGreen(&'static str),

    #[error("unknown environment: {0} (expected dev, staging or prod)")]
    UnknownEnvironment(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("pre-flight health gate failed: {passed}/{total} checks passed")]
    PreflightFailed { passed: usize, total: usize },

    #[error("deployment failed: {0}")]
    DeploymentFailed(String),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lambda runtime error: {0}")]
    Lambda(String),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Configuration problems are detected before any cloud API call.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound(_)
                | Error::MissingEnvVar(_)
                | Error::MissingField(_)
                | Error::IncompleteBlueGreen(_)
                | Error::UnknownEnvironment(_)
                | Error::InvalidConfig(_)
                | Error::Yaml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
