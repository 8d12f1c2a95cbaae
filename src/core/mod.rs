pub mod app_config;
pub mod backup;
pub mod database_manager;
pub mod schedule;
pub mod system;
