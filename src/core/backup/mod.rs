pub mod backup_service;
pub mod executor;
pub mod retention;

/// Stable artifact filename prefix. Retention matching depends on it staying
/// constant within one installation.
pub const BACKUP_FILE_PREFIX: &str = "warden_backup";
