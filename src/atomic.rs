//! Locked reads and atomic replacement of a document file.
use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

struct FileLock {
    _file: File,
}

impl FileLock {
    fn lock(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        // Blocks until exclusive lock is acquired
        file.lock_exclusive()?;

        Ok(Self { _file: file })
    }
}

#[derive(Debug, Clone)]
pub struct AtomicFile {
    path: PathBuf,
}

impl AtomicFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads the whole file under a shared lock.
    pub fn read(&self) -> Result<String> {
        self.read_locked().map_err(|e| Error::io(e, &self.path))
    }

    fn read_locked(&self) -> std::io::Result<String> {
        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut buf = String::new();
        (&file).read_to_string(&mut buf)?;

        Ok(buf)
    }

    /// Replaces the file with `contents`. The target either keeps its old
    /// contents or holds all of the new ones.
    pub fn write(&self, contents: &str) -> Result<()> {
        self.write_locked(contents)
            .map_err(|e| Error::io(e, &self.path))
    }

    fn write_locked(&self, contents: &str) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let _lock = FileLock::lock(&self.path)?;
        let mut tmp = NamedTempFile::new_in(dir)?;

        tmp.write_all(contents.as_bytes())?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;

        tmp.persist(&self.path)?;

        Ok(())
    }
}
