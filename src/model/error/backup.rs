use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Database connection string is not configured")]
    ConnectionStringMissing,

    #[error("pg_dump not found, install the PostgreSQL client tools")]
    DumpToolMissing(#[source] std::io::Error),

    #[error("pg_dump failed: {stderr}")]
    DumpToolFailed { stderr: String },

    #[error("Database file not found: {}", path.display())]
    SourceDatabaseMissing { path: PathBuf },

    #[error("Snapshot into {} failed", path.display())]
    SnapshotFailed {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to compress backup: {}", path.display())]
    CompressBackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
