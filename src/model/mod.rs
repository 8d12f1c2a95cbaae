pub mod backup_history;
pub mod backup_outcome;
pub mod backup_schedule;
pub mod config;
pub mod error;
