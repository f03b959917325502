//! Directory Lock
//!
//! Advisory, exclusive, non-blocking lock on a file inside the data
//! directory. It gates whole processes (one writer process per directory);
//! it does not protect tables from each other.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::Result;

/// Advisory lock held for the lifetime of a database handle
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
    /// Open while the lock is held
    file: Option<File>,
}

impl DirLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Try to take the lock without blocking
    ///
    /// Returns `Ok(false)` if it is already held, whether by another handle,
    /// another process, or this handle (the lock is not reentrant).
    pub fn acquire(&mut self) -> Result<bool> {
        if self.file.is_some() {
            return Ok(false);
        }

        loop {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&self.path)?;

            match file.try_lock_exclusive() {
                Ok(()) => {}
                Err(e) if is_contended(&e) => return Ok(false),
                Err(e) => return Err(e.into()),
            }

            // The previous holder may have unlinked the file between our open
            // and our lock; a lock on an orphaned inode excludes nobody
            if !still_linked(&file, &self.path)? {
                debug!(path = %self.path.display(), "lock file replaced, retrying");
                continue;
            }

            debug!(path = %self.path.display(), "acquired directory lock");
            self.file = Some(file);
            return Ok(true);
        }
    }

    /// Release the lock and remove the lock file; no-op if not held
    pub fn release(&mut self) -> Result<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        // Unlink while still locked so no other process can lock this inode
        // after the path is gone
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        file.unlock()?;
        drop(file);

        debug!(path = %self.path.display(), "released directory lock");
        Ok(())
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(path = %self.path.display(), error = %e, "failed to release directory lock");
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Whether `path` still names the file `file` was opened from
#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata()?;
    match fs::metadata(path) {
        Ok(current) => Ok(current.dev() == held.dev() && current.ino() == held.ino()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, path: &Path) -> Result<bool> {
    Ok(path.exists())
}
