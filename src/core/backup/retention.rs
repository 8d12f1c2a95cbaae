use crate::core::backup::BACKUP_FILE_PREFIX;
use crate::model::error::Error;
use crate::model::error::io::IOError;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{error, info, warn};

/// Compressed and uncompressed variants of both supported database kinds.
const ARTIFACT_SUFFIXES: [&str; 4] = [".sql", ".sql.gz", ".sqlite3", ".sqlite3.gz"];

/// Bounds disk usage per schedule by keeping only the most recent artifacts.
pub struct RetentionEnforcer;

impl RetentionEnforcer {
    /// Deletes everything beyond the `keep` most recently modified
    /// artifacts. Best-effort: failures are logged, never propagated.
    pub async fn enforce(directory: &Path, keep: usize) {
        if let Err(err) = Self::try_enforce(directory, keep).await {
            error!(
                "Retention cleanup failed for {}: {err}",
                directory.display()
            );
        }
    }

    async fn try_enforce(directory: &Path, keep: usize) -> Result<(), Error> {
        let mut entries =
            tokio::fs::read_dir(directory)
                .await
                .map_err(|source| IOError::ReadDirectoryFailed {
                    path: directory.to_path_buf(),
                    source,
                })?;

        let mut artifacts: Vec<(PathBuf, SystemTime)> = Vec::new();
        while let Some(entry) =
            entries
                .next_entry()
                .await
                .map_err(|source| IOError::ReadDirectoryFailed {
                    path: directory.to_path_buf(),
                    source,
                })?
        {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !Self::is_artifact(name) {
                continue;
            }
            let modified = match entry
                .metadata()
                .await
                .and_then(|metadata| metadata.modified())
            {
                Ok(modified) => modified,
                Err(err) => {
                    warn!(
                        "Skipping {} during retention cleanup: {err}",
                        entry.path().display()
                    );
                    continue;
                }
            };
            artifacts.push((entry.path(), modified));
        }

        // Newest first.
        artifacts.sort_by(|a, b| b.1.cmp(&a.1));

        let mut removed = 0usize;
        for (path, _) in artifacts.iter().skip(keep) {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {
                    info!("Removed old backup: {}", path.display());
                    removed += 1;
                }
                Err(err) => warn!("Failed to remove old backup {}: {err}", path.display()),
            }
        }
        if removed > 0 {
            info!(
                "Cleaned up {removed} old backup(s) in {}, keeping {keep}",
                directory.display()
            );
        }
        Ok(())
    }

    fn is_artifact(name: &str) -> bool {
        name.starts_with(BACKUP_FILE_PREFIX)
            && ARTIFACT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{File, FileTimes};
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_artifact(directory: &Path, name: &str, age: Duration) {
        let path = directory.join(name);
        std::fs::write(&path, b"artifact").unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_times(FileTimes::new().set_modified(SystemTime::now() - age))
            .unwrap();
    }

    #[test]
    fn artifact_matching_covers_all_suffixes() {
        assert!(RetentionEnforcer::is_artifact("warden_backup_20250601_020000.sql"));
        assert!(RetentionEnforcer::is_artifact("warden_backup_20250601_020000.sql.gz"));
        assert!(RetentionEnforcer::is_artifact("warden_backup_20250601_020000.sqlite3"));
        assert!(RetentionEnforcer::is_artifact("warden_backup_20250601_020000.sqlite3.gz"));
        assert!(!RetentionEnforcer::is_artifact("other_20250601_020000.sql"));
        assert!(!RetentionEnforcer::is_artifact("warden_backup_20250601_020000.txt"));
    }

    #[tokio::test]
    async fn oldest_artifacts_beyond_keep_are_deleted() {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), "warden_backup_1.sql", Duration::from_secs(400));
        write_artifact(dir.path(), "warden_backup_2.sql.gz", Duration::from_secs(300));
        write_artifact(dir.path(), "warden_backup_3.sqlite3", Duration::from_secs(200));
        write_artifact(dir.path(), "warden_backup_4.sqlite3.gz", Duration::from_secs(100));

        RetentionEnforcer::enforce(dir.path(), 3).await;

        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "warden_backup_2.sql.gz",
                "warden_backup_3.sqlite3",
                "warden_backup_4.sqlite3.gz",
            ]
        );
    }

    #[tokio::test]
    async fn unrelated_files_are_never_touched() {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), "warden_backup_1.sql", Duration::from_secs(200));
        write_artifact(dir.path(), "warden_backup_2.sql", Duration::from_secs(100));
        std::fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

        RetentionEnforcer::enforce(dir.path(), 1).await;

        assert!(dir.path().join("notes.txt").exists());
        assert!(!dir.path().join("warden_backup_1.sql").exists());
        assert!(dir.path().join("warden_backup_2.sql").exists());
    }

    #[tokio::test]
    async fn keep_zero_deletes_every_artifact() {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), "warden_backup_1.sql", Duration::from_secs(200));
        write_artifact(dir.path(), "warden_backup_2.sql", Duration::from_secs(100));

        RetentionEnforcer::enforce(dir.path(), 0).await;

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_directory_does_not_panic() {
        let dir = TempDir::new().unwrap();
        RetentionEnforcer::enforce(&dir.path().join("nope"), 3).await;
    }
}
