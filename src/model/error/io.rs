use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IOError {
    #[error("Failed to create directory: {}", path.display())]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory: {}", path.display())]
    ReadDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy file: From {} To {}", src.display(), dst.display())]
    CopyFileFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete file: {}", path.display())]
    DeleteFileFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to get file metadata: {}", path.display())]
    GetMetadataFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
