pub mod database_lock;
pub mod logging;
