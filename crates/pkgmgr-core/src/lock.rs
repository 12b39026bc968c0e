//! Per-package advisory locks in the index directory.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs4::FileExt;
use pkgmgr_schema::PackageName;

use crate::error::{Error, Result};
use crate::paths::lock_path;

/// Exclusive lock on one package name, released on drop.
///
/// The lock file itself is left behind: removing it would let a waiter and a
/// newcomer lock two different inodes.
#[derive(Debug)]
pub struct PackageLock {
    _file: File,
    path: PathBuf,
}

impl PackageLock {
    /// Block until the lock for `name` in `index_dir` is held.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the lock file cannot be opened or locked.
    pub fn acquire(index_dir: &Path, name: &PackageName) -> Result<Self> {
        let path = lock_path(index_dir, name);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::io("failed to open lock file", &path, e))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                tracing::info!("waiting for another operation on {name} to finish");
                file.lock_exclusive()
                    .map_err(|e| Error::io("failed to lock", &path, e))?;
            }
            Err(err) => return Err(Error::io("failed to lock", &path, err)),
        }

        tracing::trace!("locked {}", path.display());
        Ok(Self { _file: file, path })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_lock_file_survives_release() {
        let tmp = tempdir().unwrap();
        let name = PackageName::new("foo").unwrap();

        let lock = PackageLock::acquire(tmp.path(), &name).unwrap();
        let path = lock.path().to_path_buf();
        drop(lock);

        assert!(path.exists());
        // Re-acquiring after release does not block.
        PackageLock::acquire(tmp.path(), &name).unwrap();
    }

    #[test]
    fn test_same_name_serializes() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        let name = PackageName::new("foo").unwrap();

        let held = PackageLock::acquire(&dir, &name).unwrap();

        let (tx, rx) = mpsc::channel();
        let waiter = std::thread::spawn(move || {
            let _lock = PackageLock::acquire(&dir, &name).unwrap();
            tx.send(()).unwrap();
        });

        // The second acquire must still be waiting.
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        drop(held);
        rx.recv_timeout(Duration::from_secs(10)).unwrap();
        waiter.join().unwrap();
    }

    #[test]
    fn test_different_names_do_not_block() {
        let tmp = tempdir().unwrap();
        let _a = PackageLock::acquire(tmp.path(), &PackageName::new("a").unwrap()).unwrap();
        let _b = PackageLock::acquire(tmp.path(), &PackageName::new("b").unwrap()).unwrap();
    }
}
