use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackupStatus {
    Success,
    Error,
}

/// Immutable audit entry, created exactly once per backup attempt and only
/// ever deleted together with its parent schedule.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HistoryRecord {
    pub uuid: Uuid,
    pub schedule_uuid: Uuid,
    pub timestamp: DateTime<Utc>,
    pub status: BackupStatus,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub error_message: Option<String>,
}
