//! Installed-package index
//!
//! One record per package name, stored as `<index_dir>/<name>`. The presence
//! of a record is what makes a package "installed or followed"; see
//! [`IndexRecord`] for the file format.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use pkgmgr_schema::{HIDDEN_PREFIX, IndexRecord, PackageName};

use crate::error::{Error, Result};
use crate::lock::PackageLock;
use crate::paths::{canonical_dir, record_path};

/// Handle on an index directory.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    /// Open an existing index directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotADirectory`] if `dir` is missing or not a
    /// directory.
    pub fn open(dir: &Path) -> Result<Self> {
        Ok(Self {
            dir: canonical_dir("index directory", dir)?,
        })
    }

    /// Location of the record for `name`.
    pub fn record_path(&self, name: &PackageName) -> PathBuf {
        record_path(&self.dir, name)
    }

    /// Whether a record (of either kind) exists for `name`.
    pub fn contains(&self, name: &PackageName) -> bool {
        self.record_path(name).is_file()
    }

    /// Take the per-package lock. Held until the guard is dropped.
    ///
    /// # Errors
    ///
    /// See [`PackageLock::acquire`].
    pub fn lock(&self, name: &PackageName) -> Result<PackageLock> {
        PackageLock::acquire(&self.dir, name)
    }

    /// Replace the record for `name` with the given owned paths.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the record cannot be written.
    pub fn write(&self, name: &PackageName, paths: &[PathBuf]) -> Result<()> {
        self.put(name, &IndexRecord::Installed(paths.to_vec()))
    }

    /// Replace the record for `name` with the followed-only marker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the record cannot be written.
    pub fn write_followed_only(&self, name: &PackageName) -> Result<()> {
        self.put(name, &IndexRecord::FollowedOnly)
    }

    /// Write-temp-then-rename, so readers see either the old record or the
    /// new one.
    fn put(&self, name: &PackageName, record: &IndexRecord) -> Result<()> {
        let path = self.record_path(name);
        let bytes = record
            .encode()
            .map_err(|e| Error::io("failed to encode index record", &path, std::io::Error::other(e)))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!("{HIDDEN_PREFIX}{name}."))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| Error::io("failed to create index record", &self.dir, e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Error::io("failed to write index record", tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| Error::io("failed to replace index record", &path, e.error))?;

        tracing::debug!(
            "wrote index record {} ({} paths)",
            path.display(),
            record.paths().len()
        );
        Ok(())
    }

    /// Load the record for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInstalled`] if there is no record and
    /// [`Error::IndexCorrupt`] if it cannot be read or parsed.
    pub fn read(&self, name: &PackageName) -> Result<IndexRecord> {
        let path = self.record_path(name);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotInstalled { name: name.clone() });
            }
            Err(e) => return Err(Error::index_corrupt(&path, e)),
        };
        IndexRecord::decode(&bytes).map_err(|e| Error::index_corrupt(&path, e))
    }

    /// Delete the record for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInstalled`] if there is no record, or
    /// [`Error::Io`] if it cannot be removed.
    pub fn remove(&self, name: &PackageName) -> Result<()> {
        let path = self.record_path(name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("removed index record {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::NotInstalled { name: name.clone() })
            }
            Err(e) => Err(Error::io("failed to remove index record", &path, e)),
        }
    }

    /// Every recorded package with its record, sorted by name.
    ///
    /// Lock files, in-flight temporaries and anything that is not a valid
    /// package name are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory cannot be read and
    /// [`Error::IndexCorrupt`] if a record cannot be parsed.
    pub fn list(&self) -> Result<Vec<(PackageName, IndexRecord)>> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| Error::io("failed to read index directory", &self.dir, e))?;

        let mut records = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| Error::io("failed to read index directory", &self.dir, e))?;
            let is_file = entry.file_type().is_ok_and(|t| t.is_file());
            let Some(name) = entry
                .file_name()
                .to_str()
                .and_then(|s| PackageName::new(s).ok())
            else {
                continue;
            };
            if !is_file {
                continue;
            }
            let record = self.read(&name)?;
            records.push((name, record));
        }

        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records)
    }
}
