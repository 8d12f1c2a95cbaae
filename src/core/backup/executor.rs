use crate::core::backup::BACKUP_FILE_PREFIX;
use crate::core::backup::retention::RetentionEnforcer;
use crate::model::backup_outcome::BackupOutcome;
use crate::model::backup_schedule::BackupSchedule;
use crate::model::error::Error;
use crate::model::error::backup::BackupError;
use crate::model::error::io::IOError;
use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info, warn};

/// The database kind is decided once per attempt from the configured
/// connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DatabaseKind {
    Postgres(String),
    Sqlite(PathBuf),
}

impl DatabaseKind {
    fn from_connection_string(url: &str) -> Result<Self, BackupError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(BackupError::ConnectionStringMissing);
        }
        if trimmed.to_lowercase().contains("postgres") {
            return Ok(Self::Postgres(trimmed.to_string()));
        }
        let path = trimmed
            .strip_prefix("sqlite:///")
            .or_else(|| trimmed.strip_prefix("sqlite://"))
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        Ok(Self::Sqlite(PathBuf::from(path)))
    }

    fn artifact_extension(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "sql",
            Self::Sqlite(_) => "sqlite3",
        }
    }
}

/// Ordered SQLite snapshot strategies; the first to succeed wins, failure of
/// the last one is the operation's failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapshotStrategy {
    VacuumInto,
    FileCopy,
}

/// Produces one backup artifact per call: dump or snapshot, optional gzip
/// compression, then retention enforcement for the schedule's directory.
pub struct BackupExecutor {
    database_url: String,
}

impl BackupExecutor {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Runs one backup attempt for `schedule`. Never propagates an error
    /// past this boundary: every failure becomes `BackupOutcome::Failure`.
    pub async fn execute(&self, schedule: &BackupSchedule) -> BackupOutcome {
        match self.try_execute(schedule).await {
            Ok((path, size)) => {
                info!(
                    "Backup successful for schedule {}: {} ({size} bytes)",
                    schedule.name,
                    path.display()
                );
                BackupOutcome::Success { path, size }
            }
            Err(err) => {
                error!("Backup failed for schedule {}: {err}", schedule.name);
                BackupOutcome::Failure {
                    message: err.to_string(),
                }
            }
        }
    }

    async fn try_execute(&self, schedule: &BackupSchedule) -> Result<(PathBuf, u64), Error> {
        let kind = DatabaseKind::from_connection_string(&self.database_url)?;
        let backup_dir = schedule.backup_path.as_path();
        tokio::fs::create_dir_all(backup_dir)
            .await
            .map_err(|source| IOError::CreateDirectoryFailed {
                path: backup_dir.to_path_buf(),
                source,
            })?;

        // Second-granularity timestamp keeps concurrent manual and scheduled
        // runs from colliding on the same filename.
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let artifact = backup_dir.join(format!(
            "{BACKUP_FILE_PREFIX}_{timestamp}.{}",
            kind.artifact_extension()
        ));

        match &kind {
            DatabaseKind::Postgres(url) => self.dump_postgres(url, &artifact).await?,
            DatabaseKind::Sqlite(source) => self.snapshot_sqlite(source, &artifact).await?,
        }

        let artifact = if schedule.compress {
            compress_artifact(&artifact)?
        } else {
            artifact
        };

        let size = tokio::fs::metadata(&artifact)
            .await
            .map_err(|source| IOError::GetMetadataFailed {
                path: artifact.clone(),
                source,
            })?
            .len();

        RetentionEnforcer::enforce(backup_dir, schedule.retention_count.max(0) as usize).await;

        Ok((artifact, size))
    }

    async fn dump_postgres(&self, url: &str, artifact: &Path) -> Result<(), Error> {
        let output = Command::new("pg_dump")
            .arg("--no-owner")
            .arg("--no-acl")
            .arg("-f")
            .arg(artifact)
            .arg(url)
            .output()
            .await
            .map_err(BackupError::DumpToolMissing)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            // Partial dump file, if any, is useless.
            let _ = tokio::fs::remove_file(artifact).await;
            return Err(BackupError::DumpToolFailed { stderr }.into());
        }
        Ok(())
    }

    async fn snapshot_sqlite(&self, source: &Path, artifact: &Path) -> Result<(), Error> {
        if tokio::fs::metadata(source).await.is_err() {
            return Err(BackupError::SourceDatabaseMissing {
                path: source.to_path_buf(),
            }
            .into());
        }
        match run_snapshot(SnapshotStrategy::VacuumInto, source, artifact).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(
                    "VacuumInto snapshot of {} failed, falling back to file copy: {err}",
                    source.display()
                );
                run_snapshot(SnapshotStrategy::FileCopy, source, artifact).await
            }
        }
    }
}

async fn run_snapshot(
    strategy: SnapshotStrategy,
    source: &Path,
    artifact: &Path,
) -> Result<(), Error> {
    match strategy {
        // Database-level snapshot into a fresh file; the live database is
        // neither blocked nor left inconsistent mid-copy.
        SnapshotStrategy::VacuumInto => {
            let options = SqliteConnectOptions::new().filename(source);
            let mut connection =
                options
                    .connect()
                    .await
                    .map_err(|source| BackupError::SnapshotFailed {
                        path: artifact.to_path_buf(),
                        source,
                    })?;
            let statement = format!(
                "VACUUM INTO '{}'",
                artifact.display().to_string().replace('\'', "''")
            );
            sqlx::query(&statement)
                .execute(&mut connection)
                .await
                .map_err(|source| BackupError::SnapshotFailed {
                    path: artifact.to_path_buf(),
                    source,
                })?;
            connection
                .close()
                .await
                .map_err(|source| BackupError::SnapshotFailed {
                    path: artifact.to_path_buf(),
                    source,
                })?;
            Ok(())
        }
        SnapshotStrategy::FileCopy => {
            tokio::fs::copy(source, artifact)
                .await
                .map_err(|copy_err| IOError::CopyFileFailed {
                    src: source.to_path_buf(),
                    dst: artifact.to_path_buf(),
                    source: copy_err,
                })?;
            Ok(())
        }
    }
}

/// Gzips the artifact into a `.gz` sibling and removes the uncompressed
/// original. The reported path is the compressed file.
fn compress_artifact(artifact: &Path) -> Result<PathBuf, Error> {
    let mut compressed_name = artifact.as_os_str().to_owned();
    compressed_name.push(".gz");
    let compressed_path = PathBuf::from(compressed_name);

    let mut input =
        File::open(artifact).map_err(|source| BackupError::CompressBackupFailed {
            path: artifact.to_path_buf(),
            source,
        })?;
    let output =
        File::create(&compressed_path).map_err(|source| BackupError::CompressBackupFailed {
            path: compressed_path.clone(),
            source,
        })?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder).map_err(|source| BackupError::CompressBackupFailed {
        path: compressed_path.clone(),
        source,
    })?;
    encoder
        .finish()
        .map_err(|source| BackupError::CompressBackupFailed {
            path: compressed_path.clone(),
            source,
        })?;
    std::fs::remove_file(artifact).map_err(|source| IOError::DeleteFileFailed {
        path: artifact.to_path_buf(),
        source,
    })?;
    Ok(compressed_path)
}
