use crate::core::database_manager::DatabaseManager;
use crate::model::backup_schedule::{BackupSchedule, OwnerId};
use crate::model::error::Error;
use crate::model::error::database::DatabaseError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

/// Durable schedule store. Engine-side mutations (`update_*`, `deactivate`)
/// touch only the fields the poll loop owns; full-row writes are reserved
/// for host-driven create/modify operations.
pub trait ScheduleRepository {
    async fn create_backup_schedule_table(&self) -> Result<(), Error>;
    async fn create_backup_schedule(&self, schedule: &BackupSchedule) -> Result<(), Error>;
    async fn modify_backup_schedule(&self, schedule: &BackupSchedule) -> Result<(), Error>;
    async fn remove_backup_schedule(&self, uuid: Uuid) -> Result<(), Error>;
    async fn get_backup_schedule(&self, uuid: Uuid) -> Result<Option<BackupSchedule>, Error>;
    async fn get_backup_schedules_by_owner(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<BackupSchedule>, Error>;
    async fn get_active_backup_schedules(&self) -> Result<Vec<BackupSchedule>, Error>;
    async fn update_next_backup_date(
        &self,
        uuid: Uuid,
        next_backup_date: DateTime<Utc>,
    ) -> Result<(), Error>;
    async fn update_schedule_error(
        &self,
        uuid: Uuid,
        message: &str,
        error_time: DateTime<Utc>,
    ) -> Result<(), Error>;
    async fn update_schedule_success(
        &self,
        uuid: Uuid,
        success_time: DateTime<Utc>,
        backup_path: &str,
        backup_size: i64,
    ) -> Result<(), Error>;
    async fn deactivate_backup_schedule(&self, uuid: Uuid) -> Result<(), Error>;
}

fn schedule_from_row(row: &SqliteRow) -> Result<BackupSchedule, Error> {
    let uuid_bytes: Vec<u8> = row.get("uuid");
    let uuid = Uuid::from_slice(&uuid_bytes).map_err(|_| DatabaseError::DataCorrupted)?;

    let frequency_str: String = row.get("frequency");
    let frequency =
        serde_json::from_str(&frequency_str).map_err(|_| DatabaseError::DataCorrupted)?;

    Ok(BackupSchedule {
        uuid,
        owner: OwnerId::new(row.get::<String, _>("owner")),
        name: row.get("name"),
        backup_path: row.get::<String, _>("backup_path").into(),
        frequency,
        start_datetime: row.get("start_datetime"),
        next_backup_date: row.get("next_backup_date"),
        retention_count: row.get("retention_count"),
        active: row.get("active"),
        end_datetime: row.get("end_datetime"),
        compress: row.get("compress"),
        created_at: row.get("created_at"),
        last_error: row.get("last_error"),
        last_error_time: row.get("last_error_time"),
        last_success_time: row.get("last_success_time"),
        last_backup_path: row.get("last_backup_path"),
        last_backup_size: row.get("last_backup_size"),
    })
}

const SCHEDULE_COLUMNS: &str = r#"
    uuid,
    owner,
    name,
    backup_path,
    frequency,
    start_datetime,
    next_backup_date,
    retention_count,
    active,
    end_datetime,
    compress,
    created_at,
    last_error,
    last_error_time,
    last_success_time,
    last_backup_path,
    last_backup_size
"#;

impl ScheduleRepository for DatabaseManager {
    async fn create_backup_schedule_table(&self) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            CREATE TABLE BackupSchedules (
                uuid BLOB PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                backup_path TEXT NOT NULL,
                frequency TEXT NOT NULL,
                start_datetime TEXT NOT NULL,
                next_backup_date TEXT NOT NULL,
                retention_count INTEGER NOT NULL DEFAULT 7,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                end_datetime TEXT,
                compress BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TEXT NOT NULL,
                last_error TEXT,
                last_error_time TEXT,
                last_success_time TEXT,
                last_backup_path TEXT,
                last_backup_size INTEGER
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn create_backup_schedule(&self, schedule: &BackupSchedule) -> Result<(), Error> {
        let pool = self.get_pool();
        let statement = format!(
            "INSERT INTO BackupSchedules ({SCHEDULE_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&statement)
            .bind(schedule.uuid.as_bytes().as_slice())
            .bind(schedule.owner.as_str())
            .bind(&schedule.name)
            .bind(schedule.backup_path.to_string_lossy().to_string())
            .bind(
                serde_json::to_string(&schedule.frequency)
                    .map_err(DatabaseError::SerializeFailed)?,
            )
            .bind(schedule.start_datetime)
            .bind(schedule.next_backup_date)
            .bind(schedule.retention_count)
            .bind(schedule.active)
            .bind(schedule.end_datetime)
            .bind(schedule.compress)
            .bind(schedule.created_at)
            .bind(&schedule.last_error)
            .bind(schedule.last_error_time)
            .bind(schedule.last_success_time)
            .bind(&schedule.last_backup_path)
            .bind(schedule.last_backup_size)
            .execute(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn modify_backup_schedule(&self, schedule: &BackupSchedule) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            UPDATE BackupSchedules
            SET
                owner = ?,
                name = ?,
                backup_path = ?,
                frequency = ?,
                start_datetime = ?,
                next_backup_date = ?,
                retention_count = ?,
                active = ?,
                end_datetime = ?,
                compress = ?
            WHERE uuid = ?
            "#,
        )
        .bind(schedule.owner.as_str())
        .bind(&schedule.name)
        .bind(schedule.backup_path.to_string_lossy().to_string())
        .bind(serde_json::to_string(&schedule.frequency).map_err(DatabaseError::SerializeFailed)?)
        .bind(schedule.start_datetime)
        .bind(schedule.next_backup_date)
        .bind(schedule.retention_count)
        .bind(schedule.active)
        .bind(schedule.end_datetime)
        .bind(schedule.compress)
        .bind(schedule.uuid.as_bytes().as_slice())
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn remove_backup_schedule(&self, uuid: Uuid) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query("DELETE FROM BackupSchedules WHERE uuid = ?")
            .bind(uuid.as_bytes().as_slice())
            .execute(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn get_backup_schedule(&self, uuid: Uuid) -> Result<Option<BackupSchedule>, Error> {
        let pool = self.get_pool();
        let statement = format!("SELECT {SCHEDULE_COLUMNS} FROM BackupSchedules WHERE uuid = ?");
        let row = sqlx::query(&statement)
            .bind(uuid.as_bytes().as_slice())
            .fetch_optional(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;

        match row {
            Some(row) => Ok(Some(schedule_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_backup_schedules_by_owner(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<BackupSchedule>, Error> {
        let pool = self.get_pool();
        let statement = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM BackupSchedules \
             WHERE owner = ? ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&statement)
            .bind(owner.as_str())
            .fetch_all(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;

        rows.iter().map(schedule_from_row).collect()
    }

    async fn get_active_backup_schedules(&self) -> Result<Vec<BackupSchedule>, Error> {
        let pool = self.get_pool();
        let statement = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM BackupSchedules \
             WHERE active = TRUE ORDER BY next_backup_date"
        );
        let rows = sqlx::query(&statement)
            .fetch_all(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;

        rows.iter().map(schedule_from_row).collect()
    }

    async fn update_next_backup_date(
        &self,
        uuid: Uuid,
        next_backup_date: DateTime<Utc>,
    ) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query("UPDATE BackupSchedules SET next_backup_date = ? WHERE uuid = ?")
            .bind(next_backup_date)
            .bind(uuid.as_bytes().as_slice())
            .execute(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn update_schedule_error(
        &self,
        uuid: Uuid,
        message: &str,
        error_time: DateTime<Utc>,
    ) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            UPDATE BackupSchedules
            SET last_error = ?, last_error_time = ?
            WHERE uuid = ?
            "#,
        )
        .bind(message)
        .bind(error_time)
        .bind(uuid.as_bytes().as_slice())
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn update_schedule_success(
        &self,
        uuid: Uuid,
        success_time: DateTime<Utc>,
        backup_path: &str,
        backup_size: i64,
    ) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            UPDATE BackupSchedules
            SET
                last_error = NULL,
                last_error_time = NULL,
                last_success_time = ?,
                last_backup_path = ?,
                last_backup_size = ?
            WHERE uuid = ?
            "#,
        )
        .bind(success_time)
        .bind(backup_path)
        .bind(backup_size)
        .bind(uuid.as_bytes().as_slice())
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn deactivate_backup_schedule(&self, uuid: Uuid) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query("UPDATE BackupSchedules SET active = FALSE WHERE uuid = ?")
            .bind(uuid.as_bytes().as_slice())
            .execute(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }
}
