use crate::model::error::Error;
use crate::model::error::database::DatabaseError;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

const LOCK_FILE_NAME: &str = "warden.lock";

/// Exclusive lock over the data directory. Two engine instances sharing one
/// schedule store is unsupported; the lock turns that misconfiguration into
/// a startup error instead of silent double-processing. Released on drop.
#[derive(Debug)]
pub struct DatabaseLock {
    _file: File,
}

impl DatabaseLock {
    pub fn acquire(data_directory: &Path) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(data_directory.join(LOCK_FILE_NAME))
            .map_err(DatabaseError::LockDatabaseFailed)?;
        let locked = file
            .try_lock_exclusive()
            .map_err(DatabaseError::LockDatabaseFailed)?;
        if !locked {
            return Err(DatabaseError::DatabaseAlreadyLocked.into());
        }
        Ok(Self { _file: file })
    }
}
