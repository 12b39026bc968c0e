//! Package library lookup
//!
//! The library is a plain directory of archives named `<package><ext>`.

use std::path::{Path, PathBuf};

use pkgmgr_schema::{ArchiveFormat, PackageName};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Resolve a package name to its archive in `library_dir`.
///
/// Extensions are tried in [`ArchiveFormat::EXTENSIONS`] order and the
/// first regular file wins, so a name always maps to exactly one archive.
///
/// # Errors
///
/// Returns [`Error::PackageNotFound`] if no candidate exists.
pub fn resolve(library_dir: &Path, name: &PackageName) -> Result<PathBuf> {
    find(library_dir, name).ok_or_else(|| Error::PackageNotFound {
        name: name.clone(),
        library: library_dir.to_path_buf(),
    })
}

/// Like [`resolve`], but a missing archive is `None`.
pub fn find(library_dir: &Path, name: &PackageName) -> Option<PathBuf> {
    let found = ArchiveFormat::EXTENSIONS
        .iter()
        .map(|(ext, _)| library_dir.join(format!("{name}{ext}")))
        .find(|candidate| candidate.is_file());

    if let Some(path) = &found {
        tracing::debug!("resolved {name} to {}", path.display());
    }
    found
}

/// Names of every archive found anywhere under `library_dir`.
///
/// Sorted and de-duplicated. Files whose stem is not a valid package name
/// are skipped.
///
/// # Errors
///
/// Returns [`Error::NotADirectory`] if the library does not exist, or
/// [`Error::Io`] if a directory cannot be read.
pub fn list_available(library_dir: &Path) -> Result<Vec<PackageName>> {
    if !library_dir.is_dir() {
        return Err(Error::NotADirectory {
            role: "package library",
            path: library_dir.to_path_buf(),
        });
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(library_dir).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(library_dir).to_path_buf();
            Error::io("failed to read package library", path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        let Some((stem, _)) = ArchiveFormat::split_file_name(file_name) else {
            continue;
        };
        match PackageName::new(stem) {
            Ok(name) => names.push(name),
            Err(e) => tracing::debug!("skipping {}: {e}", entry.path().display()),
        }
    }

    names.sort();
    names.dedup();
    Ok(names)
}
