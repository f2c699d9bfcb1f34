// ABOUTME: Cloud API error types with SNAFU pattern.
// ABOUTME: Unifies ECS and ELB failures for programmatic handling.

use snafu::Snafu;

use crate::types::UnmappedState;

/// Failure talking to the container-orchestration or load-balancer control plane.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CloudError {
    #[snafu(display("{operation} failed: {message}"))]
    Api {
        operation: &'static str,
        message: String,
    },

    #[snafu(display("{resource} not found: {name}"))]
    NotFound {
        resource: &'static str,
        name: String,
    },

    #[snafu(display("{operation} returned {source}"))]
    Unmapped {
        operation: &'static str,
        source: UnmappedState,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudErrorKind {
    /// The API call itself failed (network, throttling, permissions).
    Api,
    /// The referenced resource does not exist.
    NotFound,
    /// The provider reported a state this crate does not model.
    UnmappedState,
}

impl CloudError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> CloudErrorKind {
        match self {
            CloudError::Api { .. } => CloudErrorKind::Api,
            CloudError::NotFound { .. } => CloudErrorKind::NotFound,
            CloudError::Unmapped { .. } => CloudErrorKind::UnmappedState,
        }
    }

    /// Unmapped states are not transient: retrying will observe the same value.
    pub fn is_unmapped_state(&self) -> bool {
        self.kind() == CloudErrorKind::UnmappedState
    }

    pub fn api(operation: &'static str, message: impl Into<String>) -> Self {
        CloudError::Api {
            operation,
            message: message.into(),
        }
    }
}
