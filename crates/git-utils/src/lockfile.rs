use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{LockError, UtilError};
use crate::Result;

/// RAII guard for the create-write-rename-on-commit lock protocol: a sibling
/// `<path>.lock` file is opened with `O_CREAT|O_EXCL` so two writers racing
/// for the same path can't both succeed; the loser sees `AlreadyLocked`.
/// Dropping an uncommitted guard removes the `.lock` file (rollback).
pub struct LockFile {
    path: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

const LOCK_SUFFIX: &str = ".lock";

fn lock_open_error(lock_path: &Path, source: io::Error) -> LockError {
    if source.kind() == io::ErrorKind::AlreadyExists {
        LockError::AlreadyLocked {
            path: lock_path.to_path_buf(),
        }
    } else {
        LockError::Create {
            path: lock_path.to_path_buf(),
            source,
        }
    }
}

impl LockFile {
    /// Acquire a lock on `path` by exclusively creating `path.lock`.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock_path = PathBuf::from(format!("{}{}", path.display(), LOCK_SUFFIX));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|e| UtilError::Lock(lock_open_error(&lock_path, e)))?;

        Ok(Self {
            path,
            lock_path,
            file: Some(file),
            committed: false,
        })
    }

    /// Try to acquire without blocking. Returns Ok(None) if already locked,
    /// Ok(Some(lockfile)) on success, or Err on other failures.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        match Self::acquire(path) {
            Ok(lk) => Ok(Some(lk)),
            Err(UtilError::Lock(LockError::AlreadyLocked { .. })) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get a mutable reference to the underlying file for writing.
    pub fn file_mut(&mut self) -> Option<&mut File> {
        self.file.as_mut()
    }

    /// Get the path of the target file (without .lock).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the path of the lock file (with .lock).
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Flush, sync, and atomically rename the lock file onto the target path.
    pub fn commit(mut self) -> Result<()> {
        let commit_err = |source| UtilError::Lock(LockError::Commit {
            path: self.lock_path.clone(),
            source,
        });

        if let Some(mut file) = self.file.take() {
            file.flush().map_err(commit_err)?;
            file.sync_all().map_err(commit_err)?;
        }

        fs::rename(&self.lock_path, &self.path).map_err(commit_err)?;
        self.committed = true;
        Ok(())
    }

    /// Rollback: remove .lock file (also happens on Drop).
    pub fn rollback(mut self) -> Result<()> {
        self.file.take();
        if self.lock_path.exists() {
            fs::remove_file(&self.lock_path)?;
        }
        self.committed = true; // Prevent Drop from trying to clean up again
        Ok(())
    }
}

impl Write for LockFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("lock file already closed"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("lock file already closed"))?
            .flush()
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if !self.committed {
            self.file.take();
            let _ = fs::remove_file(&self.lock_path);
        }
    }
}
