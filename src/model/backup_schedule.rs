use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Normalized owner reference. Host applications may wrap account identity
/// in whatever shape they like; the engine only ever sees this one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Next due time measured from `from`. The poller always passes the
    /// tick's current time rather than the previous due time, so a delayed
    /// tick does not cause compounding catch-up runs.
    pub fn advance_from(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Frequency::Hourly => from + Duration::hours(1),
            Frequency::Daily => from + Duration::days(1),
            Frequency::Weekly => from + Duration::days(7),
            // Calendar month, clamped to the last valid day of the next
            // month (Jan 31 -> Feb 28/29).
            Frequency::Monthly => from
                .checked_add_months(Months::new(1))
                .unwrap_or(from + Duration::days(30)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BackupSchedule {
    pub uuid: Uuid,
    pub owner: OwnerId,
    pub name: String,
    pub backup_path: PathBuf,
    pub frequency: Frequency,
    pub start_datetime: DateTime<Utc>,
    pub next_backup_date: DateTime<Utc>,
    pub retention_count: i64,
    pub active: bool,
    pub end_datetime: Option<DateTime<Utc>>,
    pub compress: bool,
    pub created_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub last_error_time: Option<DateTime<Utc>>,
    pub last_success_time: Option<DateTime<Utc>>,
    pub last_backup_path: Option<String>,
    pub last_backup_size: Option<i64>,
}

/// Host-facing creation payload. The uuid and `created_at` are assigned by
/// the engine, status fields start empty.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateScheduleData {
    pub name: String,
    pub owner: OwnerId,
    pub backup_path: PathBuf,
    pub frequency: Frequency,
    pub start_datetime: DateTime<Utc>,
    pub next_backup_date: DateTime<Utc>,
    #[serde(default = "default_retention_count")]
    pub retention_count: i64,
    #[serde(default = "default_true")]
    pub active: bool,
    pub end_datetime: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub compress: bool,
}

fn default_retention_count() -> i64 {
    7
}

fn default_true() -> bool {
    true
}

impl BackupSchedule {
    pub fn from_create_data(data: CreateScheduleData) -> Self {
        BackupSchedule {
            uuid: Uuid::new_v4(),
            owner: data.owner,
            name: data.name,
            backup_path: data.backup_path,
            frequency: data.frequency,
            start_datetime: data.start_datetime,
            next_backup_date: data.next_backup_date,
            retention_count: data.retention_count,
            active: data.active,
            end_datetime: data.end_datetime,
            compress: data.compress,
            created_at: Utc::now(),
            last_error: None,
            last_error_time: None,
            last_success_time: None,
            last_backup_path: None,
            last_backup_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn hourly_advances_by_one_hour() {
        let from = Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap();
        assert_eq!(
            Frequency::Hourly.advance_from(from),
            Utc.with_ymd_and_hms(2025, 6, 15, 11, 30, 0).unwrap()
        );
    }

    #[test]
    fn weekly_advances_by_seven_days() {
        let from = Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap();
        assert_eq!(
            Frequency::Weekly.advance_from(from),
            Utc.with_ymd_and_hms(2025, 6, 22, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn monthly_keeps_day_of_month() {
        let from = Utc.with_ymd_and_hms(2025, 3, 15, 8, 0, 0).unwrap();
        assert_eq!(
            Frequency::Monthly.advance_from(from),
            Utc.with_ymd_and_hms(2025, 4, 15, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn monthly_clamps_to_shorter_month() {
        let from = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        assert_eq!(
            Frequency::Monthly.advance_from(from),
            Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn monthly_respects_leap_year() {
        let from = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        assert_eq!(
            Frequency::Monthly.advance_from(from),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn frequency_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Frequency::Hourly).unwrap(),
            "\"hourly\""
        );
        assert_eq!(
            serde_json::from_str::<Frequency>("\"monthly\"").unwrap(),
            Frequency::Monthly
        );
    }
}
