pub mod backup;
pub mod database;
pub mod io;
pub mod system;
pub mod task;

use crate::model::error::backup::BackupError;
use crate::model::error::database::DatabaseError;
use crate::model::error::io::IOError;
use crate::model::error::system::SystemError;
use crate::model::error::task::TaskError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    IO(#[from] IOError),
    #[error(transparent)]
    System(#[from] SystemError),
    #[error(transparent)]
    Task(#[from] TaskError),
}
