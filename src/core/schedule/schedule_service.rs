use crate::core::database_manager::DatabaseManager;
use crate::interface::repository::schedule::ScheduleRepository;
use crate::model::backup_schedule::{BackupSchedule, CreateScheduleData, OwnerId};
use crate::model::error::Error;
use crate::model::error::io::IOError;
use crate::model::error::task::TaskError;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Probe file written and removed while checking a backup destination.
const WRITE_PROBE_NAME: &str = ".warden_write_test";

/// Host-facing schedule management. All mutations go through here so
/// validation happens in exactly one place.
pub struct ScheduleService {
    database_manager: Arc<DatabaseManager>,
}

impl ScheduleService {
    pub fn new(database_manager: Arc<DatabaseManager>) -> Self {
        Self { database_manager }
    }

    pub async fn create_schedule(&self, data: CreateScheduleData) -> Result<BackupSchedule, Error> {
        Self::validate(&data.name, data.retention_count)?;
        Self::validate_backup_path(&data.backup_path).await?;

        let schedule = BackupSchedule::from_create_data(data);
        self.database_manager
            .create_backup_schedule(&schedule)
            .await?;
        info!(
            "Created backup schedule {} ({}) for owner {}",
            schedule.name, schedule.uuid, schedule.owner
        );
        Ok(schedule)
    }

    pub async fn update_schedule(&self, schedule: &BackupSchedule) -> Result<(), Error> {
        Self::validate(&schedule.name, schedule.retention_count)?;
        Self::validate_backup_path(&schedule.backup_path).await?;

        self.database_manager
            .get_backup_schedule(schedule.uuid)
            .await?
            .ok_or(TaskError::ScheduleNotFound(schedule.uuid))?;
        self.database_manager
            .modify_backup_schedule(schedule)
            .await?;
        info!("Updated backup schedule {}", schedule.uuid);
        Ok(())
    }

    /// Removes the schedule and, via the store's cascade, its history.
    pub async fn remove_schedule(&self, uuid: Uuid) -> Result<(), Error> {
        self.database_manager
            .get_backup_schedule(uuid)
            .await?
            .ok_or(TaskError::ScheduleNotFound(uuid))?;
        self.database_manager.remove_backup_schedule(uuid).await?;
        info!("Removed backup schedule {uuid}");
        Ok(())
    }

    pub async fn activate_schedule(&self, uuid: Uuid) -> Result<(), Error> {
        self.set_active(uuid, true).await
    }

    pub async fn deactivate_schedule(&self, uuid: Uuid) -> Result<(), Error> {
        self.set_active(uuid, false).await
    }

    pub async fn get_schedule(&self, uuid: Uuid) -> Result<Option<BackupSchedule>, Error> {
        self.database_manager.get_backup_schedule(uuid).await
    }

    pub async fn get_schedules_by_owner(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<BackupSchedule>, Error> {
        self.database_manager
            .get_backup_schedules_by_owner(owner)
            .await
    }

    async fn set_active(&self, uuid: Uuid, active: bool) -> Result<(), Error> {
        let mut schedule = self
            .database_manager
            .get_backup_schedule(uuid)
            .await?
            .ok_or(TaskError::ScheduleNotFound(uuid))?;
        schedule.active = active;
        self.database_manager
            .modify_backup_schedule(&schedule)
            .await?;
        info!(
            "Schedule {uuid} is now {}",
            if active { "active" } else { "inactive" }
        );
        Ok(())
    }

    fn validate(name: &str, retention_count: i64) -> Result<(), Error> {
        if name.trim().is_empty() {
            return Err(TaskError::EmptyScheduleName.into());
        }
        if retention_count < 1 {
            return Err(TaskError::InvalidRetentionCount(retention_count).into());
        }
        Ok(())
    }

    /// A destination is accepted only if it exists (or can be created) and a
    /// probe file can actually be written there.
    async fn validate_backup_path(backup_path: &Path) -> Result<(), Error> {
        if backup_path.as_os_str().is_empty() {
            return Err(TaskError::EmptyBackupPath.into());
        }
        tokio::fs::create_dir_all(backup_path)
            .await
            .map_err(|_| TaskError::InvalidBackupPath {
                path: backup_path.to_path_buf(),
            })?;

        let probe = backup_path.join(WRITE_PROBE_NAME);
        tokio::fs::write(&probe, b"")
            .await
            .map_err(|_| TaskError::InvalidBackupPath {
                path: backup_path.to_path_buf(),
            })?;
        if let Err(err) = tokio::fs::remove_file(&probe).await {
            // A probe we cannot remove again also fails validation.
            return Err(IOError::DeleteFileFailed {
                path: probe,
                source: err,
            }
            .into());
        }
        Ok(())
    }
}
