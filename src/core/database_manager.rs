use crate::interface::repository::history::HistoryRepository;
use crate::interface::repository::schedule::ScheduleRepository;
use crate::model::error::Error;
use crate::model::error::database::DatabaseError;
use crate::utils::database_lock::DatabaseLock;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::fs;
use std::path::Path;
use tracing::info;

const DATABASE_FILE_NAME: &str = "warden.sqlite3";

/// Owns the schedule store: an SQLite pool plus the exclusive on-disk lock
/// that enforces the single-instance assumption.
#[derive(Debug)]
pub struct DatabaseManager {
    pool: SqlitePool,
    _lock: DatabaseLock,
}

impl DatabaseManager {
    pub async fn new(data_directory: &Path) -> Result<Self, Error> {
        fs::create_dir_all(data_directory).map_err(DatabaseError::CreateDatabaseFailed)?;
        let lock = DatabaseLock::acquire(data_directory)?;
        let options = SqliteConnectOptions::new()
            .filename(data_directory.join(DATABASE_FILE_NAME))
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(DatabaseError::DatabaseConnectFailed)?;
        let database_manager = Self { pool, _lock: lock };
        if !database_manager.exist_table("BackupSchedules").await {
            database_manager.create_backup_schedule_table().await?;
        }
        if !database_manager.exist_table("BackupHistory").await {
            database_manager.create_backup_history_table().await?;
        }
        info!("Schedule store ready at {}", data_directory.display());
        Ok(database_manager)
    }

    pub fn get_pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub async fn exist_table(&self, table_name: &str) -> bool {
        let pool = self.get_pool();
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type='table' AND name = ?)",
        )
        .bind(table_name)
        .fetch_one(&pool)
        .await
        .unwrap_or(false)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn tables_are_created_on_first_open() {
        let dir = TempDir::new().unwrap();
        let database = DatabaseManager::new(dir.path()).await.unwrap();
        assert!(database.exist_table("BackupSchedules").await);
        assert!(database.exist_table("BackupHistory").await);
        assert!(!database.exist_table("Nonexistent").await);
    }

    #[tokio::test]
    async fn reopening_existing_store_keeps_tables() {
        let dir = TempDir::new().unwrap();
        {
            let database = DatabaseManager::new(dir.path()).await.unwrap();
            database.close().await;
        }
        let database = DatabaseManager::new(dir.path()).await.unwrap();
        assert!(database.exist_table("BackupSchedules").await);
    }
}
