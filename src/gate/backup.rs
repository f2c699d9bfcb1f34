// ABOUTME: Backup subsystem readiness seam for the health gate.
// ABOUTME: PlaceholderBackup reports ready until a real backup integration exists.

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupReadiness {
    Ready,
    /// The collaborator explicitly signalled it cannot take a backup.
    Unavailable(String),
}

#[async_trait]
pub trait BackupStatus: Send + Sync {
    async fn readiness(&self) -> BackupReadiness;
}

/// Always ready.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderBackup;

#[async_trait]
impl BackupStatus for PlaceholderBackup {
    async fn readiness(&self) -> BackupReadiness {
        BackupReadiness::Ready
    }
}
