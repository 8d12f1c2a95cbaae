use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Schedule not found: {0}")]
    ScheduleNotFound(Uuid),

    #[error("Backup already in progress for schedule: {0}")]
    BackupInProgress(Uuid),

    #[error("Schedule name cannot be empty")]
    EmptyScheduleName,

    #[error("Backup path cannot be empty")]
    EmptyBackupPath,

    #[error("Backup path is not a writable directory: {}", path.display())]
    InvalidBackupPath { path: PathBuf },

    #[error("Retention count must be at least 1, got {0}")]
    InvalidRetentionCount(i64),
}
