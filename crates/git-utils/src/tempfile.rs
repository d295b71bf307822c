use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::Result;

/// A named temp file, created next to its eventual target so a later
/// rename onto that target stays on the same filesystem and is atomic.
/// Deleted on drop unless [`persist`](TempFile::persist) was called.
pub struct TempFile {
    inner: Option<::tempfile::NamedTempFile>,
    persisted: bool,
}

impl TempFile {
    /// Create a uniquely-named temp file inside `dir`, creating `dir` first if needed.
    pub fn new_in(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            inner: Some(::tempfile::NamedTempFile::new_in(dir)?),
            persisted: false,
        })
    }

    /// Create a temp file in the same directory `target` will eventually live in.
    pub fn new_for(target: impl AsRef<Path>) -> Result<Self> {
        let dir = target.as_ref().parent().unwrap_or(Path::new("."));
        Self::new_in(dir)
    }

    pub fn path(&self) -> &Path {
        self.inner.as_ref().map(|n| n.path()).unwrap_or(Path::new(""))
    }

    pub fn file_mut(&mut self) -> Option<&mut std::fs::File> {
        self.inner.as_mut().map(|n| n.as_file_mut())
    }

    /// Rename onto `target`, consuming this guard so drop cannot delete it afterward.
    pub fn persist(mut self, target: impl AsRef<Path>) -> Result<()> {
        if let Some(named) = self.inner.take() {
            named
                .persist(target.as_ref())
                .map_err(|e| crate::error::UtilError::Io(e.error))?;
        }
        self.persisted = true;
        Ok(())
    }
}

impl Write for TempFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::other("temp file already closed"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::other("temp file already closed"))?
            .flush()
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        // NamedTempFile automatically deletes on drop if not persisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_persist() {
        let dir = ::tempfile::tempdir().unwrap();
        let target = dir.path().join("output.txt");

        let mut tf = TempFile::new_for(&target).unwrap();
        tf.write_all(b"hello world").unwrap();
        tf.persist(&target).unwrap();

        let content = fs::read_to_string(&target).unwrap();
        assert_eq!(content, "hello world");
    }

    #[test]
    fn drop_cleans_up() {
        let dir = ::tempfile::tempdir().unwrap();
        let temp_path;

        {
            let mut tf = TempFile::new_in(dir.path()).unwrap();
            temp_path = tf.path().to_path_buf();
            tf.write_all(b"temporary").unwrap();
            assert!(temp_path.exists());
        }

        // After drop, the temp file should be gone
        assert!(!temp_path.exists());
    }

    #[test]
    fn new_for_creates_in_same_dir() {
        let dir = ::tempfile::tempdir().unwrap();
        let target = dir.path().join("subdir").join("file.txt");
        fs::create_dir_all(target.parent().unwrap()).unwrap();

        let tf = TempFile::new_for(&target).unwrap();
        assert_eq!(tf.path().parent(), target.parent());
    }
}
