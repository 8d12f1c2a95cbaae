use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_FILE_NAME: &str = "backup_warden.log";

/// Global tracing setup: stderr plus a daily-rolling file. The worker guard
/// must stay alive for the file writer to flush.
pub struct Logging {
    _guard: WorkerGuard,
}

impl Logging {
    pub fn initialize(log_directory: &Path) -> Self {
        let file_appender = tracing_appender::rolling::daily(log_directory, LOG_FILE_NAME);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "backup_warden=info".into());
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .init();
        log_panics::init();
        Self { _guard: guard }
    }
}
