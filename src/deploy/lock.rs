// ABOUTME: Deploy lock to prevent concurrent deployments to the same service from one host.
// ABOUTME: Uses atomic file creation with lock info stored in ~/.local/state/atlantis-deploy/.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ResourceName;

use super::DeployError;

/// State directory relative to $HOME when $XDG_STATE_HOME is unset.
const STATE_DIR: &str = ".local/state/atlantis-deploy";

/// Information about who holds a deploy lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Cluster and service being deployed.
    pub service: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            service: service.into(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    /// Lock file name for a cluster/service pair. ARN punctuation is flattened.
    pub fn lock_file_name(cluster: &ResourceName, service: &ResourceName) -> String {
        let key: String = format!("{cluster}--{service}")
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{key}.lock")
    }
}

/// Default directory for lock files: `$XDG_STATE_HOME/atlantis-deploy`, falling
/// back to `~/.local/state/atlantis-deploy`.
pub fn default_state_dir() -> Result<PathBuf, DeployError> {
    if let Some(xdg) = std::env::var_os("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join("atlantis-deploy"));
    }
    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(STATE_DIR))
        .ok_or_else(|| DeployError::lock_error("neither XDG_STATE_HOME nor HOME is set"))
}

/// A held deploy lock. Released explicitly with `release`, or on drop.
#[derive(Debug)]
pub struct DeployLock {
    path: PathBuf,
    released: bool,
}

impl DeployLock {
    /// Acquire the deploy lock for a cluster/service pair.
    ///
    /// Uses `create_new` for atomic lock acquisition (no TOCTOU race).
    /// Returns error if lock is already held by another process.
    /// Auto-breaks stale locks (>1 hour) with a warning; `force` breaks any lock.
    pub fn acquire(
        state_dir: &Path,
        cluster: &ResourceName,
        service: &ResourceName,
        force: bool,
    ) -> Result<Self, DeployError> {
        fs::create_dir_all(state_dir).map_err(|e| {
            DeployError::lock_error(format!(
                "failed to create state directory {}: {e}",
                state_dir.display()
            ))
        })?;

        let path = state_dir.join(LockInfo::lock_file_name(cluster, service));
        let lock_info = LockInfo::new(format!("{cluster}/{service}"));
        let lock_json = serde_json::to_string(&lock_info)
            .map_err(|e| DeployError::lock_error(format!("failed to serialize lock: {e}")))?;

        match create_lock_file(&path, &lock_json) {
            Ok(()) => return Ok(Self::held(path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(DeployError::lock_error(format!(
                    "failed to acquire lock: {e}"
                )));
            }
        }

        // Lock acquisition failed - check if existing lock should be broken
        let existing = read_lock_info(&path);
        if !should_break(existing.as_ref(), force) {
            return Err(match existing {
                Some(info) => DeployError::lock_held(info.holder, info.pid, info.started_at),
                None => DeployError::lock_error("lock held by another process"),
            });
        }

        tracing::debug!(path = %path.display(), "removing stale or forced lock");
        if let Err(e) = fs::remove_file(&path)
            && e.kind() != ErrorKind::NotFound
        {
            return Err(DeployError::lock_error(format!(
                "failed to break lock: {e}"
            )));
        }

        match create_lock_file(&path, &lock_json) {
            Ok(()) => Ok(Self::held(path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(DeployError::lock_error(
                "lock acquired by another process during break",
            )),
            Err(e) => Err(DeployError::lock_error(format!(
                "failed to acquire lock: {e}"
            ))),
        }
    }

    fn held(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock.
    pub fn release(mut self) -> Result<(), DeployError> {
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DeployError::lock_error(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn create_lock_file(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

fn read_lock_info(path: &Path) -> Option<LockInfo> {
    let contents = fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Check if an existing lock should be broken (stale, forced, or corrupted).
fn should_break(existing: Option<&LockInfo>, force: bool) -> bool {
    match existing {
        Some(lock) if force => {
            tracing::warn!(
                "Breaking lock held by {} (pid {}) since {}",
                lock.holder,
                lock.pid,
                lock.started_at
            );
            true
        }
        Some(lock) if lock.is_stale() => {
            tracing::warn!(
                "Auto-breaking stale lock held by {} (pid {}) since {}",
                lock.holder,
                lock.pid,
                lock.started_at
            );
            true
        }
        Some(_) => false,
        None => {
            tracing::warn!("Lock info unreadable or corrupted, breaking lock");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> (ResourceName, ResourceName) {
        (
            ResourceName::new("prod-cluster").unwrap(),
            ResourceName::new("atlantis").unwrap(),
        )
    }

    #[test]
    fn lock_info_creates_with_current_host_and_pid() {
        let info = LockInfo::new("prod-cluster/atlantis");

        assert_eq!(info.service, "prod-cluster/atlantis");
        assert_eq!(info.pid, std::process::id());
        assert!(!info.holder.is_empty());
    }

    #[test]
    fn lock_file_name_flattens_arn_punctuation() {
        let cluster = ResourceName::new("arn:aws:ecs:us-east-1:123456789012:cluster/prod").unwrap();
        let service = ResourceName::new("atlantis").unwrap();
        let name = LockInfo::lock_file_name(&cluster, &service);
        assert!(name.ends_with("--atlantis.lock"));
        assert!(!name.contains(':'));
        assert!(!name.contains('/'));
    }

    #[test]
    fn fresh_lock_is_not_stale() {
        assert!(!LockInfo::new("x").is_stale());
    }

    #[test]
    fn old_lock_is_stale() {
        let mut info = LockInfo::new("x");
        info.started_at = Utc::now() - chrono::Duration::hours(2);
        assert!(info.is_stale());
    }

    #[test]
    fn second_acquire_reports_holder() {
        let dir = tempfile::tempdir().unwrap();
        let (cluster, service) = names();

        let lock = DeployLock::acquire(dir.path(), &cluster, &service, false).unwrap();
        let err = DeployLock::acquire(dir.path(), &cluster, &service, false).unwrap_err();
        assert!(matches!(err, DeployError::LockHeld { pid, .. } if pid == std::process::id()));

        lock.release().unwrap();
        DeployLock::acquire(dir.path(), &cluster, &service, false).unwrap();
    }

    #[test]
    fn force_breaks_a_held_lock() {
        let dir = tempfile::tempdir().unwrap();
        let (cluster, service) = names();

        let first = DeployLock::acquire(dir.path(), &cluster, &service, false).unwrap();
        let second = DeployLock::acquire(dir.path(), &cluster, &service, true).unwrap();
        assert_eq!(first.path(), second.path());
        std::mem::forget(first);
    }

    #[test]
    fn stale_and_corrupt_locks_are_broken() {
        let dir = tempfile::tempdir().unwrap();
        let (cluster, service) = names();
        let path = dir.path().join(LockInfo::lock_file_name(&cluster, &service));

        let mut stale = LockInfo::new("old");
        stale.started_at = Utc::now() - chrono::Duration::hours(3);
        fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();
        let lock = DeployLock::acquire(dir.path(), &cluster, &service, false).unwrap();
        lock.release().unwrap();

        fs::write(&path, "not json").unwrap();
        DeployLock::acquire(dir.path(), &cluster, &service, false).unwrap();
    }

    #[test]
    fn drop_removes_the_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let (cluster, service) = names();
        let path = {
            let lock = DeployLock::acquire(dir.path(), &cluster, &service, false).unwrap();
            lock.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
