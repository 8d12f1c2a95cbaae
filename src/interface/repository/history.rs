use crate::core::database_manager::DatabaseManager;
use crate::model::backup_history::{BackupStatus, HistoryRecord};
use crate::model::error::Error;
use crate::model::error::database::DatabaseError;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

/// Append-only log of backup attempt outcomes. Records are never mutated and
/// are deleted only through the schedule cascade.
pub trait HistoryRepository {
    async fn create_backup_history_table(&self) -> Result<(), Error>;
    async fn append_backup_history(
        &self,
        schedule_uuid: Uuid,
        status: BackupStatus,
        file_path: Option<&str>,
        file_size: Option<i64>,
        error_message: Option<&str>,
    ) -> Result<HistoryRecord, Error>;
    async fn get_backup_history(
        &self,
        schedule_uuid: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<HistoryRecord>, Error>;
}

fn history_from_row(row: &SqliteRow) -> Result<HistoryRecord, Error> {
    let uuid_bytes: Vec<u8> = row.get("uuid");
    let uuid = Uuid::from_slice(&uuid_bytes).map_err(|_| DatabaseError::DataCorrupted)?;

    let schedule_uuid_bytes: Vec<u8> = row.get("schedule_uuid");
    let schedule_uuid =
        Uuid::from_slice(&schedule_uuid_bytes).map_err(|_| DatabaseError::DataCorrupted)?;

    let status_str: String = row.get("status");
    let status = serde_json::from_str(&status_str).map_err(|_| DatabaseError::DataCorrupted)?;

    Ok(HistoryRecord {
        uuid,
        schedule_uuid,
        timestamp: row.get("timestamp"),
        status,
        file_path: row.get("file_path"),
        file_size: row.get("file_size"),
        error_message: row.get("error_message"),
    })
}

impl HistoryRepository for DatabaseManager {
    async fn create_backup_history_table(&self) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            CREATE TABLE BackupHistory (
                uuid BLOB PRIMARY KEY,
                schedule_uuid BLOB NOT NULL,
                timestamp TEXT NOT NULL,
                status TEXT NOT NULL,
                file_path TEXT,
                file_size INTEGER,
                error_message TEXT,
                FOREIGN KEY (schedule_uuid)
                    REFERENCES BackupSchedules (uuid) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        sqlx::query(
            "CREATE INDEX idx_backup_history_schedule \
             ON BackupHistory (schedule_uuid, timestamp DESC)",
        )
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn append_backup_history(
        &self,
        schedule_uuid: Uuid,
        status: BackupStatus,
        file_path: Option<&str>,
        file_size: Option<i64>,
        error_message: Option<&str>,
    ) -> Result<HistoryRecord, Error> {
        let record = HistoryRecord {
            uuid: Uuid::new_v4(),
            schedule_uuid,
            timestamp: Utc::now(),
            status,
            file_path: file_path.map(str::to_string),
            file_size,
            error_message: error_message.map(str::to_string),
        };

        let pool = self.get_pool();
        sqlx::query(
            r#"
            INSERT INTO BackupHistory (
                uuid,
                schedule_uuid,
                timestamp,
                status,
                file_path,
                file_size,
                error_message
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.uuid.as_bytes().as_slice())
        .bind(record.schedule_uuid.as_bytes().as_slice())
        .bind(record.timestamp)
        .bind(serde_json::to_string(&record.status).map_err(DatabaseError::SerializeFailed)?)
        .bind(&record.file_path)
        .bind(record.file_size)
        .bind(&record.error_message)
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;

        Ok(record)
    }

    async fn get_backup_history(
        &self,
        schedule_uuid: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<HistoryRecord>, Error> {
        let pool = self.get_pool();
        let rows = match schedule_uuid {
            Some(schedule_uuid) => {
                sqlx::query(
                    "SELECT uuid, schedule_uuid, timestamp, status, \
                            file_path, file_size, error_message \
                     FROM BackupHistory WHERE schedule_uuid = ? \
                     ORDER BY timestamp DESC LIMIT ?",
                )
                .bind(schedule_uuid.as_bytes().as_slice())
                .bind(limit)
                .fetch_all(&pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT uuid, schedule_uuid, timestamp, status, \
                            file_path, file_size, error_message \
                     FROM BackupHistory ORDER BY timestamp DESC LIMIT ?",
                )
                .bind(limit)
                .fetch_all(&pool)
                .await
            }
        }
        .map_err(DatabaseError::StatementExecutionFailed)?;

        rows.iter().map(history_from_row).collect()
    }
}
