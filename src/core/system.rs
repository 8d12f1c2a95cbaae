use crate::core::app_config::AppConfig;
use crate::core::backup::backup_service::BackupService;
use crate::core::backup::executor::BackupExecutor;
use crate::core::database_manager::DatabaseManager;
use crate::core::schedule::poller::SchedulePoller;
use crate::core::schedule::schedule_service::ScheduleService;
use crate::interface::core::runnable::Runnable;
use crate::model::error::Error;
use crate::utils::logging::Logging;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Wires configuration, the schedule store, services and the poll loop
/// together, and owns their shutdown order.
pub struct System {
    _logging: Logging,
    database_manager: Arc<DatabaseManager>,
    schedule_service: Arc<ScheduleService>,
    backup_service: Arc<BackupService>,
    poller_shutdown: oneshot::Sender<()>,
    poller_handle: JoinHandle<()>,
}

impl System {
    pub async fn initialize() -> Result<Self, Error> {
        let config = AppConfig::new()?;
        let logging = Logging::initialize(&config.data_directory.join("logs"));
        info!("Initializing");

        let database_manager = Arc::new(DatabaseManager::new(&config.data_directory).await?);
        let backup_service = Arc::new(BackupService::new(
            database_manager.clone(),
            BackupExecutor::new(&config.database_url),
        ));
        let schedule_service = Arc::new(ScheduleService::new(database_manager.clone()));

        let poller = Arc::new(SchedulePoller::new(
            database_manager.clone(),
            backup_service.clone(),
        ));
        let (poller_shutdown, poller_handle) = poller.run().await;

        info!("Initialization complete");
        Ok(Self {
            _logging: logging,
            database_manager,
            schedule_service,
            backup_service,
            poller_shutdown,
            poller_handle,
        })
    }

    pub fn schedule_service(&self) -> Arc<ScheduleService> {
        self.schedule_service.clone()
    }

    pub fn backup_service(&self) -> Arc<BackupService> {
        self.backup_service.clone()
    }

    /// Blocks until interrupted.
    pub async fn run(&self) {
        info!("Online");
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {err}");
        }
    }

    /// Signals the poller, waits for any in-flight tick to finish, then
    /// closes the store.
    pub async fn terminate(self) {
        info!("Terminating");
        let _ = self.poller_shutdown.send(());
        if let Err(err) = self.poller_handle.await {
            error!("Poller task failed: {err}");
        }
        self.database_manager.close().await;
        info!("Terminate complete");
    }
}
