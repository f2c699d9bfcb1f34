// ABOUTME: HTTP client for the Atlantis control plane: liveness endpoint and lock registry.
// ABOUTME: Distinguishes timeout, refused connection, and bad status for the health gate.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Failure reaching an HTTP endpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

/// One active Terraform lock as reported by the lock registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LockEntry {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub pull_num: Option<u64>,
}

impl LockEntry {
    pub fn label(&self) -> &str {
        self.project.as_deref().unwrap_or("Unknown")
    }
}

/// Result of asking the lock registry for active locks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockQuery {
    Locks(Vec<LockEntry>),
    /// The registry could not be queried. Carries the reason for diagnostics.
    Unavailable(String),
}

/// The Atlantis server: liveness and lock listing.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// GET the liveness endpoint and return its HTTP status code.
    async fn healthz(&self) -> Result<u16, RequestError>;

    /// List active locks. Never errors: an unreachable registry is `Unavailable`.
    async fn locks(&self) -> LockQuery;
}

/// `reqwest`-backed Atlantis client.
#[derive(Debug, Clone)]
pub struct AtlantisClient {
    client: reqwest::Client,
    base_url: String,
    health_path: String,
    timeout: Duration,
}

impl AtlantisClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            health_path: "/healthz".to_string(),
            timeout,
        })
    }

    /// Override the liveness path (default `/healthz`).
    pub fn health_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.health_path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn classify(&self, err: reqwest::Error) -> RequestError {
        if err.is_timeout() {
            RequestError::Timeout(self.timeout)
        } else if err.is_connect() {
            RequestError::Connect(err.to_string())
        } else {
            RequestError::Other(err.to_string())
        }
    }
}

#[async_trait]
impl ControlPlane for AtlantisClient {
    async fn healthz(&self) -> Result<u16, RequestError> {
        let url = format!("{}{}", self.base_url, self.health_path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        Ok(response.status().as_u16())
    }

    async fn locks(&self) -> LockQuery {
        let url = format!("{}/locks", self.base_url);
        tracing::debug!("GET {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return LockQuery::Unavailable(self.classify(e).to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return LockQuery::Unavailable(format!("locks endpoint returned status {status}"));
        }

        match response.json::<Vec<LockEntry>>().await {
            Ok(locks) => LockQuery::Locks(locks),
            Err(e) => LockQuery::Unavailable(format!("unreadable lock listing: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_entries_tolerate_missing_fields() {
        let locks: Vec<LockEntry> =
            serde_json::from_str(r#"[{"project": "network"}, {"workspace": "default"}]"#).unwrap();
        assert_eq!(locks[0].label(), "network");
        assert_eq!(locks[1].label(), "Unknown");
    }

    #[test]
    fn health_path_is_normalized() {
        let client = AtlantisClient::new("https://atlantis.example.com/", Duration::from_secs(5))
            .unwrap()
            .health_path("status");
        assert_eq!(client.base_url(), "https://atlantis.example.com");
        assert_eq!(client.health_path, "/status");
    }

    #[tokio::test]
    async fn refused_connection_is_reported() {
        // Port 9 (discard) on loopback is closed in any sane test environment.
        let client = AtlantisClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        match client.healthz().await {
            Err(RequestError::Connect(_)) | Err(RequestError::Timeout(_)) => {}
            other => panic!("expected connection failure, got {other:?}"),
        }
        assert!(matches!(client.locks().await, LockQuery::Unavailable(_)));
    }
}
