use std::path::PathBuf;

/// Shared error type for the utilities in this crate.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    #[error("path error: {0}")]
    Path(String),

    #[error("date parse error: {0}")]
    DateParse(String),

    #[error("lock file error: {0}")]
    Lock(#[from] LockError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors specific to [`crate::lockfile::LockFile`].
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("unable to create lock file '{path}': already locked")]
    AlreadyLocked { path: PathBuf },

    #[error("unable to create lock file '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to commit lock file '{path}': {source}")]
    Commit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}