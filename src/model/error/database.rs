use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to create database directory")]
    CreateDatabaseFailed(#[source] std::io::Error),

    #[error("Failed to connect to database")]
    DatabaseConnectFailed(#[source] sqlx::Error),

    #[error("Failed to lock database")]
    LockDatabaseFailed(#[source] std::io::Error),

    #[error("Database is locked by another instance")]
    DatabaseAlreadyLocked,

    #[error("Failed to execute SQL statement")]
    StatementExecutionFailed(#[source] sqlx::Error),

    #[error("Failed to serialize column value")]
    SerializeFailed(#[source] serde_json::Error),

    #[error("Stored data is corrupted")]
    DataCorrupted,
}
