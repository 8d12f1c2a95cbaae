pub mod deactivation_cache;
pub mod poller;
pub mod schedule_service;
