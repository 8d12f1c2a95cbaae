use crate::core::backup::backup_service::BackupService;
use crate::core::database_manager::DatabaseManager;
use crate::core::schedule::deactivation_cache::DeactivationCache;
use crate::interface::core::runnable::Runnable;
use crate::interface::repository::schedule::ScheduleRepository;
use crate::model::backup_outcome::BackupOutcome;
use crate::model::backup_schedule::BackupSchedule;
use crate::model::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::oneshot::Receiver;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Fixed tick cadence; also the practical backup granularity floor.
const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Bound on the session-local deactivation memo.
const DEACTIVATION_CACHE_CAPACITY: usize = 100;

/// Drives periodic evaluation of all active schedules. One schedule's
/// failure never blocks the others, and no error terminates the loop.
pub struct SchedulePoller {
    database_manager: Arc<DatabaseManager>,
    backup_service: Arc<BackupService>,
}

impl SchedulePoller {
    pub fn new(database_manager: Arc<DatabaseManager>, backup_service: Arc<BackupService>) -> Self {
        Self {
            database_manager,
            backup_service,
        }
    }

    /// One pass over all active schedules. Tick-level errors are logged and
    /// the caller simply proceeds to the next tick.
    pub async fn run_tick(&self, current_time: DateTime<Utc>, deactivated: &mut DeactivationCache) {
        debug!("Checking backup schedules");
        let schedules = match self.database_manager.get_active_backup_schedules().await {
            Ok(schedules) => schedules,
            Err(err) => {
                error!("Failed to load active schedules: {err}");
                return;
            }
        };
        debug!("Found {} active backup schedule(s)", schedules.len());

        for schedule in &schedules {
            if let Err(err) = self
                .process_schedule(schedule, current_time, deactivated)
                .await
            {
                error!("Error handling schedule {}: {err}", schedule.name);
            }
        }
    }

    async fn process_schedule(
        &self,
        schedule: &BackupSchedule,
        current_time: DateTime<Utc>,
        deactivated: &mut DeactivationCache,
    ) -> Result<(), Error> {
        if deactivated.contains(&schedule.uuid) {
            debug!("Skipping already-deactivated schedule: {}", schedule.name);
            return Ok(());
        }

        if current_time < schedule.start_datetime {
            debug!(
                "Schedule {} has not started yet (starts at {})",
                schedule.name, schedule.start_datetime
            );
            return Ok(());
        }

        if let Some(end_datetime) = schedule.end_datetime {
            if current_time > end_datetime {
                info!("Schedule {} has expired, deactivating", schedule.name);
                self.database_manager
                    .deactivate_backup_schedule(schedule.uuid)
                    .await?;
                deactivated.insert(schedule.uuid);
                return Ok(());
            }
        }

        if current_time < schedule.next_backup_date {
            return Ok(());
        }

        info!("Processing backup for schedule: {}", schedule.name);
        let outcome = self.backup_service.execute_and_record(schedule).await;

        // The next due time always advances from the tick's current time,
        // even after a failed attempt, so a failing schedule retries at its
        // natural cadence instead of looping immediately, and a delayed tick
        // does not trigger catch-up runs.
        let next_backup_date = schedule.frequency.advance_from(current_time);
        self.database_manager
            .update_next_backup_date(schedule.uuid, next_backup_date)
            .await?;

        match outcome? {
            BackupOutcome::Success { .. } => {
                info!(
                    "Next backup for {} scheduled at {next_backup_date}",
                    schedule.name
                );
            }
            BackupOutcome::Failure { .. } => {
                error!(
                    "Backup failed for {}. Next attempt at {next_backup_date}",
                    schedule.name
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Runnable for SchedulePoller {
    async fn run_impl(self: Arc<Self>, mut shutdown_rx: Receiver<()>) {
        info!("Backup schedule poller started");
        let mut deactivated = DeactivationCache::new(DEACTIVATION_CACHE_CAPACITY);
        loop {
            self.run_tick(Utc::now(), &mut deactivated).await;
            select! {
                biased;
                _ = &mut shutdown_rx => break,
                _ = sleep(POLL_INTERVAL) => {}
            }
        }
        info!("Backup schedule poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backup::executor::BackupExecutor;
    use crate::interface::repository::history::HistoryRepository;
    use crate::model::backup_schedule::{Frequency, OwnerId};
    use chrono::TimeZone;
    use std::path::Path;
    use tempfile::TempDir;
    use uuid::Uuid;

    struct Fixture {
        _store_dir: TempDir,
        work_dir: TempDir,
        database: Arc<DatabaseManager>,
        poller: SchedulePoller,
    }

    async fn fixture_with_source(source_bytes: Option<&[u8]>) -> Fixture {
        let store_dir = TempDir::new().unwrap();
        let work_dir = TempDir::new().unwrap();
        let source = work_dir.path().join("app.sqlite3");
        if let Some(bytes) = source_bytes {
            std::fs::write(&source, bytes).unwrap();
        }
        let database = Arc::new(DatabaseManager::new(store_dir.path()).await.unwrap());
        let backup_service = Arc::new(BackupService::new(
            database.clone(),
            BackupExecutor::new(source.display().to_string()),
        ));
        let poller = SchedulePoller::new(database.clone(), backup_service);
        Fixture {
            _store_dir: store_dir,
            work_dir,
            database,
            poller,
        }
    }

    fn schedule_with(
        backup_path: &Path,
        frequency: Frequency,
        start_datetime: DateTime<Utc>,
        next_backup_date: DateTime<Utc>,
        end_datetime: Option<DateTime<Utc>>,
    ) -> BackupSchedule {
        BackupSchedule {
            uuid: Uuid::new_v4(),
            owner: OwnerId::new("wallet-1"),
            name: "test".to_string(),
            backup_path: backup_path.to_path_buf(),
            frequency,
            start_datetime,
            next_backup_date,
            retention_count: 7,
            active: true,
            end_datetime,
            compress: false,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            last_error: None,
            last_error_time: None,
            last_success_time: None,
            last_backup_path: None,
            last_backup_size: None,
        }
    }

    #[tokio::test]
    async fn due_schedule_runs_and_advances_by_one_hour() {
        let fixture = fixture_with_source(Some(b"raw bytes")).await;
        let tick_time = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let schedule = schedule_with(
            &fixture.work_dir.path().join("backups"),
            Frequency::Hourly,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            // Due five minutes ago.
            Utc.with_ymd_and_hms(2025, 6, 1, 11, 55, 0).unwrap(),
            None,
        );
        fixture.database.create_backup_schedule(&schedule).await.unwrap();

        let mut cache = DeactivationCache::new(100);
        fixture.poller.run_tick(tick_time, &mut cache).await;

        let history = fixture.database.get_backup_history(None, 50).await.unwrap();
        assert_eq!(history.len(), 1);

        let loaded = fixture
            .database
            .get_backup_schedule(schedule.uuid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            loaded.next_backup_date,
            Utc.with_ymd_and_hms(2025, 6, 1, 13, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn failed_attempt_still_advances_next_backup_date() {
        // No source file at all, so every attempt fails.
        let fixture = fixture_with_source(None).await;
        let tick_time = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let schedule = schedule_with(
            &fixture.work_dir.path().join("backups"),
            Frequency::Daily,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap(),
            None,
        );
        fixture.database.create_backup_schedule(&schedule).await.unwrap();

        let mut cache = DeactivationCache::new(100);
        fixture.poller.run_tick(tick_time, &mut cache).await;

        let history = fixture.database.get_backup_history(None, 50).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].error_message.is_some());

        let loaded = fixture
            .database
            .get_backup_schedule(schedule.uuid)
            .await
            .unwrap()
            .unwrap();
        assert!(loaded.last_error.is_some());
        assert_eq!(
            loaded.next_backup_date,
            Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn schedule_before_start_is_left_alone() {
        let fixture = fixture_with_source(Some(b"raw bytes")).await;
        let tick_time = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let next_backup_date = Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap();
        let schedule = schedule_with(
            &fixture.work_dir.path().join("backups"),
            Frequency::Hourly,
            // Starts tomorrow.
            Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
            next_backup_date,
            None,
        );
        fixture.database.create_backup_schedule(&schedule).await.unwrap();

        let mut cache = DeactivationCache::new(100);
        fixture.poller.run_tick(tick_time, &mut cache).await;

        assert!(fixture.database.get_backup_history(None, 50).await.unwrap().is_empty());
        let loaded = fixture
            .database
            .get_backup_schedule(schedule.uuid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.next_backup_date, next_backup_date);
    }

    #[tokio::test]
    async fn expired_schedule_is_deactivated_without_an_attempt() {
        let fixture = fixture_with_source(Some(b"raw bytes")).await;
        let tick_time = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let next_backup_date = Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap();
        let schedule = schedule_with(
            &fixture.work_dir.path().join("backups"),
            Frequency::Hourly,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            next_backup_date,
            // Expired one second before the tick.
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 11, 59, 59).unwrap()),
        );
        fixture.database.create_backup_schedule(&schedule).await.unwrap();

        let mut cache = DeactivationCache::new(100);
        fixture.poller.run_tick(tick_time, &mut cache).await;

        assert!(fixture.database.get_backup_history(None, 50).await.unwrap().is_empty());
        let loaded = fixture
            .database
            .get_backup_schedule(schedule.uuid)
            .await
            .unwrap()
            .unwrap();
        assert!(!loaded.active);
        assert_eq!(loaded.next_backup_date, next_backup_date);
        assert!(cache.contains(&schedule.uuid));

        // Later ticks never touch it again.
        fixture.poller.run_tick(tick_time, &mut cache).await;
        assert!(fixture.database.get_backup_history(None, 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn not_yet_due_schedule_is_skipped() {
        let fixture = fixture_with_source(Some(b"raw bytes")).await;
        let tick_time = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let next_backup_date = Utc.with_ymd_and_hms(2025, 6, 1, 13, 0, 0).unwrap();
        let schedule = schedule_with(
            &fixture.work_dir.path().join("backups"),
            Frequency::Hourly,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            next_backup_date,
            None,
        );
        fixture.database.create_backup_schedule(&schedule).await.unwrap();

        let mut cache = DeactivationCache::new(100);
        fixture.poller.run_tick(tick_time, &mut cache).await;

        assert!(fixture.database.get_backup_history(None, 50).await.unwrap().is_empty());
        let loaded = fixture
            .database
            .get_backup_schedule(schedule.uuid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.next_backup_date, next_backup_date);
    }

    #[tokio::test]
    async fn one_failing_schedule_does_not_block_the_others() {
        let fixture = fixture_with_source(Some(b"raw bytes")).await;
        let tick_time = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        // An unwritable backup directory fails the first schedule.
        let blocked_path = fixture.work_dir.path().join("blocked");
        std::fs::write(&blocked_path, b"file, not a directory").unwrap();
        let failing = schedule_with(
            &blocked_path,
            Frequency::Hourly,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            None,
        );
        let healthy = schedule_with(
            &fixture.work_dir.path().join("backups"),
            Frequency::Hourly,
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 1, 11, 0, 0).unwrap(),
            None,
        );
        fixture.database.create_backup_schedule(&failing).await.unwrap();
        fixture.database.create_backup_schedule(&healthy).await.unwrap();

        let mut cache = DeactivationCache::new(100);
        fixture.poller.run_tick(tick_time, &mut cache).await;

        let history = fixture.database.get_backup_history(None, 50).await.unwrap();
        assert_eq!(history.len(), 2);
        let healthy_history = fixture
            .database
            .get_backup_history(Some(healthy.uuid), 50)
            .await
            .unwrap();
        assert_eq!(healthy_history.len(), 1);
        assert!(healthy_history[0].error_message.is_none());
    }
}
