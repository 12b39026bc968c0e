//! Package archive reader
//!
//! Handles tar, tar.gz and tar.zst containers. Members are produced lazily,
//! in archive order, with their payload already read into memory. The reader
//! never touches the filesystem outside the archive itself; materializing
//! members is the installer's job.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use pkgmgr_schema::{ArchiveFormat, ScriptKind};
use zstd::stream::Decoder as ZstdDecoder;

use crate::error::{Error, Result};

/// What an archive member turns into on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    /// Regular file; contents in [`ArchiveMember::payload`].
    File,
    /// Directory.
    Directory,
    /// Symbolic link to the given target.
    Symlink(PathBuf),
    /// Lifecycle script; contents in [`ArchiveMember::payload`].
    Script(ScriptKind),
}

/// One entry of a package archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Normalized path relative to the archive root (no `.`/`..`, never empty).
    pub path: PathBuf,
    /// Member kind.
    pub kind: MemberKind,
    /// File contents; empty for directories and symlinks.
    pub payload: Vec<u8>,
    /// Permission bits (`0o7777` mask) from the archive header.
    pub mode: u32,
}

impl ArchiveMember {
    /// The lifecycle script kind, if this member is a script.
    pub fn script_kind(&self) -> Option<ScriptKind> {
        match self.kind {
            MemberKind::Script(kind) => Some(kind),
            _ => None,
        }
    }
}

type BoxedReader = Box<dyn Read>;

/// An opened package archive.
pub struct PackageArchive {
    path: PathBuf,
    archive: tar::Archive<BoxedReader>,
}

impl std::fmt::Debug for PackageArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageArchive")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl PackageArchive {
    /// Open an archive, picking the decoder from the file extension.
    ///
    /// Unknown extensions are read as plain tar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveNotFound`] if the path cannot be opened or is
    /// not a regular file, and [`Error::ArchiveCorrupt`] if the compression
    /// header is invalid.
    pub fn open(path: &Path) -> Result<Self> {
        let not_found = |source| Error::ArchiveNotFound {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(not_found)?;
        let metadata = file.metadata().map_err(not_found)?;
        if !metadata.is_file() {
            return Err(not_found(io::Error::other("not a regular file")));
        }

        let format = ArchiveFormat::detect(path).unwrap_or(ArchiveFormat::Tar);
        let reader: BoxedReader = match format {
            ArchiveFormat::Tar => Box::new(BufReader::new(file)),
            ArchiveFormat::TarGz => Box::new(GzDecoder::new(BufReader::new(file))),
            ArchiveFormat::TarZst => {
                Box::new(ZstdDecoder::new(file).map_err(|e| corrupt(path, &e))?)
            }
        };

        tracing::debug!("opened {} as {:?}", path.display(), format);

        Ok(Self {
            path: path.to_path_buf(),
            archive: tar::Archive::new(reader),
        })
    }

    /// Iterate over the members in archive order.
    ///
    /// Single pass: the underlying stream is consumed, so this can only be
    /// called once per opened archive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveCorrupt`] if the stream cannot be read.
    pub fn members(&mut self) -> Result<Members<'_>> {
        let path = &self.path;
        let entries = self.archive.entries().map_err(|e| corrupt(path, &e))?;
        Ok(Members {
            path,
            entries,
            fused: false,
        })
    }
}

/// Lazy iterator over the members of a [`PackageArchive`].
///
/// Yields at most one error, after which it is exhausted.
pub struct Members<'a> {
    path: &'a Path,
    entries: tar::Entries<'a, BoxedReader>,
    fused: bool,
}

impl std::fmt::Debug for Members<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Members")
            .field("path", &self.path)
            .field("fused", &self.fused)
            .finish_non_exhaustive()
    }
}

impl Iterator for Members<'_> {
    type Item = Result<ArchiveMember>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.fused {
            let result = match self.entries.next()? {
                Ok(entry) => read_member(self.path, entry),
                Err(e) => Err(corrupt(self.path, &e)),
            };

            match result {
                Ok(Some(member)) => return Some(Ok(member)),
                Ok(None) => {}
                Err(e) => {
                    self.fused = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

/// Open `path` and collect every member.
///
/// # Errors
///
/// Same as [`PackageArchive::open`] and [`PackageArchive::members`]; the
/// first bad member aborts the read.
pub fn read_members(path: &Path) -> Result<Vec<ArchiveMember>> {
    let mut archive = PackageArchive::open(path)?;
    archive.members()?.collect()
}

fn read_member(
    archive: &Path,
    mut entry: tar::Entry<'_, BoxedReader>,
) -> Result<Option<ArchiveMember>> {
    let raw_path = entry.path().map_err(|e| corrupt(archive, &e))?.into_owned();
    let Some(path) = normalize(&raw_path).map_err(|reason| corrupt(archive, &reason))? else {
        return Ok(None);
    };

    let header = entry.header();
    let mode = header.mode().map_err(|e| corrupt(archive, &e))? & 0o7777;
    let entry_type = header.entry_type();

    let kind = if entry_type.is_dir() {
        MemberKind::Directory
    } else if entry_type.is_symlink() {
        let target = entry
            .link_name()
            .map_err(|e| corrupt(archive, &e))?
            .ok_or_else(|| {
                corrupt(archive, &format!("symlink {} has no target", path.display()))
            })?
            .into_owned();
        MemberKind::Symlink(target)
    } else if entry_type.is_file() || entry_type == tar::EntryType::Continuous {
        let script = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(ScriptKind::from_file_name);
        script.map_or(MemberKind::File, MemberKind::Script)
    } else if entry_type.is_pax_global_extensions() {
        return Ok(None);
    } else {
        tracing::warn!(
            "skipping unsupported member {} ({:?}) in {}",
            path.display(),
            entry_type,
            archive.display()
        );
        return Ok(None);
    };

    // The header size is untrusted; the buffer grows with what is actually read.
    let mut payload = Vec::new();
    if matches!(kind, MemberKind::File | MemberKind::Script(_)) {
        let expected = entry.size();
        entry
            .read_to_end(&mut payload)
            .map_err(|e| corrupt(archive, &e))?;
        if payload.len() as u64 != expected {
            return Err(corrupt(
                archive,
                &format!(
                    "member {} is truncated ({} of {expected} bytes)",
                    path.display(),
                    payload.len()
                ),
            ));
        }
    }

    tracing::trace!("member {} {:?} mode {:o}", path.display(), kind, mode);

    Ok(Some(ArchiveMember {
        path,
        kind,
        payload,
        mode,
    }))
}

/// Normalize a member path to a clean relative path.
///
/// `./` prefixes are dropped. Returns `Ok(None)` for the archive root entry.
fn normalize(raw: &Path) -> std::result::Result<Option<PathBuf>, String> {
    let mut out = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!(
                    "member {} escapes the archive root",
                    raw.display()
                ));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("member {} is an absolute path", raw.display()));
            }
        }
    }

    if out.as_os_str().as_bytes().contains(&b'\n') {
        return Err(format!("member {:?} contains a newline", raw));
    }

    Ok((!out.as_os_str().is_empty()).then_some(out))
}

fn corrupt(path: &Path, reason: &dyn std::fmt::Display) -> Error {
    Error::ArchiveCorrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
