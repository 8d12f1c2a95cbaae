use crate::core::backup::executor::BackupExecutor;
use crate::core::database_manager::DatabaseManager;
use crate::interface::repository::history::HistoryRepository;
use crate::interface::repository::schedule::ScheduleRepository;
use crate::model::backup_history::BackupStatus;
use crate::model::backup_outcome::BackupOutcome;
use crate::model::backup_schedule::BackupSchedule;
use crate::model::error::Error;
use crate::model::error::task::TaskError;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Shared execute-and-record path for poll-driven and manual backups: runs
/// the executor, appends exactly one history record per attempt and updates
/// the schedule's status fields.
pub struct BackupService {
    database_manager: Arc<DatabaseManager>,
    executor: BackupExecutor,
    in_flight: DashMap<Uuid, ()>,
}

impl BackupService {
    pub fn new(database_manager: Arc<DatabaseManager>, executor: BackupExecutor) -> Self {
        Self {
            database_manager,
            executor,
            in_flight: DashMap::new(),
        }
    }

    pub async fn execute_and_record(
        &self,
        schedule: &BackupSchedule,
    ) -> Result<BackupOutcome, Error> {
        // Single-flight per schedule id: a manual trigger racing the poll
        // loop must not start a second dump of the same database.
        {
            match self.in_flight.entry(schedule.uuid) {
                Entry::Occupied(_) => {
                    return Err(TaskError::BackupInProgress(schedule.uuid).into());
                }
                Entry::Vacant(entry) => {
                    entry.insert(());
                }
            }
        }

        let outcome = self.executor.execute(schedule).await;
        self.in_flight.remove(&schedule.uuid);

        self.record_outcome(schedule, &outcome).await?;
        Ok(outcome)
    }

    /// On-demand backup outside the poll loop. Reuses the scheduled path but
    /// never advances `next_backup_date`.
    pub async fn execute_manual(&self, schedule_uuid: Uuid) -> Result<BackupOutcome, Error> {
        let schedule = self
            .database_manager
            .get_backup_schedule(schedule_uuid)
            .await?
            .ok_or(TaskError::ScheduleNotFound(schedule_uuid))?;
        info!("Manual backup requested for schedule: {}", schedule.name);
        self.execute_and_record(&schedule).await
    }

    async fn record_outcome(
        &self,
        schedule: &BackupSchedule,
        outcome: &BackupOutcome,
    ) -> Result<(), Error> {
        let now = Utc::now();
        match outcome {
            BackupOutcome::Success { path, size } => {
                let path = path.display().to_string();
                let size = *size as i64;
                self.database_manager
                    .append_backup_history(
                        schedule.uuid,
                        BackupStatus::Success,
                        Some(&path),
                        Some(size),
                        None,
                    )
                    .await?;
                self.database_manager
                    .update_schedule_success(schedule.uuid, now, &path, size)
                    .await?;
            }
            BackupOutcome::Failure { message } => {
                self.database_manager
                    .append_backup_history(
                        schedule.uuid,
                        BackupStatus::Error,
                        None,
                        None,
                        Some(message),
                    )
                    .await?;
                self.database_manager
                    .update_schedule_error(schedule.uuid, message, now)
                    .await?;
            }
        }
        Ok(())
    }
}
