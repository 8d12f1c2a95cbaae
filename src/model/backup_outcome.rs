use std::path::PathBuf;

/// Structured result of one backup attempt. The executor converts every
/// internal error into `Failure` instead of propagating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Success { path: PathBuf, size: u64 },
    Failure { message: String },
}

impl BackupOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BackupOutcome::Success { .. })
    }
}
