//! Index record wire format.
//!
//! A record is a plain file named after the package. An install record lists
//! every owned absolute path, one per line, in archive member order. A
//! followed-only record is an empty file at the same location. Paths are
//! stored as raw bytes so non-UTF-8 file names survive a round trip.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// Errors raised while encoding or decoding an [`IndexRecord`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A path cannot be represented in the line-oriented format.
    #[error("path {0:?} contains a newline")]
    UnencodablePath(PathBuf),

    /// A path is relative; every recorded path must be absolute.
    #[error("line {line}: path {path:?} is not absolute")]
    RelativePath {
        /// 1-based line number.
        line: usize,
        /// The offending path.
        path: PathBuf,
    },

    /// An empty line in the middle of a record.
    #[error("line {0}: empty entry")]
    EmptyLine(usize),
}

/// The persisted state of one package in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexRecord {
    /// Tracked without any owned paths.
    FollowedOnly,
    /// Installed; owns exactly these absolute paths, in creation order.
    Installed(Vec<PathBuf>),
}

impl IndexRecord {
    /// Paths owned by the package (empty for a followed-only record).
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Self::FollowedOnly => &[],
            Self::Installed(paths) => paths,
        }
    }

    /// Whether this is the followed-only marker.
    pub fn is_followed_only(&self) -> bool {
        matches!(self, Self::FollowedOnly)
    }

    /// Serialize the record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnencodablePath`] if a path contains a newline.
    pub fn encode(&self) -> Result<Vec<u8>, RecordError> {
        let mut out = Vec::new();
        for path in self.paths() {
            let bytes = path.as_os_str().as_bytes();
            if bytes.contains(&b'\n') {
                return Err(RecordError::UnencodablePath(path.clone()));
            }
            out.extend_from_slice(bytes);
            out.push(b'\n');
        }
        Ok(out)
    }

    /// Parse a record from its on-disk bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if a line is empty (other than the final
    /// terminator) or holds a relative path.
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        if bytes.is_empty() {
            return Ok(Self::FollowedOnly);
        }

        let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
        let mut paths = Vec::new();
        for (idx, line) in body.split(|b| *b == b'\n').enumerate() {
            if line.is_empty() {
                return Err(RecordError::EmptyLine(idx + 1));
            }
            let path = Path::new(OsStr::from_bytes(line));
            if !path.is_absolute() {
                return Err(RecordError::RelativePath {
                    line: idx + 1,
                    path: path.to_path_buf(),
                });
            }
            paths.push(path.to_path_buf());
        }

        Ok(Self::Installed(paths))
    }
}
