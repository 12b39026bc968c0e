//! Domain-specific errors for package operations

use std::io;
use std::path::{Path, PathBuf};

use pkgmgr_schema::{NameError, PackageName, ScriptKind};
use thiserror::Error;

/// Every way an install, uninstall, follow or unfollow can fail.
///
/// All variants are fatal to the current invocation. Each one names the
/// package or path it concerns so the caller can report it precisely.
#[derive(Error, Debug)]
pub enum Error {
    /// No archive for the package exists in the library.
    #[error("package '{name}' could not be found in {}", library.display())]
    PackageNotFound {
        /// Requested package.
        name: PackageName,
        /// Library directory that was searched.
        library: PathBuf,
    },

    /// The archive path could not be opened.
    #[error("archive {} could not be opened: {source}", path.display())]
    ArchiveNotFound {
        /// Archive path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The archive container could not be parsed, or holds an unsafe entry.
    #[error("archive {} is corrupt: {reason}", path.display())]
    ArchiveCorrupt {
        /// Archive path.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Writing a member into the system root was refused.
    #[error("permission denied while installing {}", path.display())]
    InstallPermissionDenied {
        /// Path that could not be written.
        path: PathBuf,
    },

    /// Removing an owned path was refused.
    #[error("permission denied while uninstalling {}", path.display())]
    UninstallPermissionDenied {
        /// Path that could not be removed.
        path: PathBuf,
    },

    /// A lifecycle script could not be run or exited unsuccessfully.
    #[error("{kind} script for '{package}' failed: {reason}")]
    ScriptFailure {
        /// Package the script belongs to.
        package: PackageName,
        /// Which lifecycle script.
        kind: ScriptKind,
        /// Exit status or spawn error.
        reason: String,
    },

    /// The package has no index record.
    #[error("package '{name}' is not installed or followed")]
    NotInstalled {
        /// Requested package.
        name: PackageName,
    },

    /// An index record exists but cannot be read or parsed.
    #[error("index record {} is corrupt: {reason}", path.display())]
    IndexCorrupt {
        /// Record path.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The package name is not usable as a file name.
    #[error("invalid package name: {0}")]
    InvalidPackageName(#[from] NameError),

    /// A directory the operation depends on is missing or not a directory.
    #[error("the {role} {} must be an existing directory", path.display())]
    NotADirectory {
        /// What the directory is for (e.g. "system root").
        role: &'static str,
        /// Configured path.
        path: PathBuf,
    },

    /// Any other filesystem failure.
    #[error("{context} {}: {source}", path.display())]
    Io {
        /// What was being attempted.
        context: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Wrap an I/O error with the path and action it concerns.
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Map an I/O error raised while materializing `path`.
    ///
    /// Permission failures become [`Error::InstallPermissionDenied`].
    pub(crate) fn install(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::InstallPermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            Self::io("failed to install", path, source)
        }
    }

    /// Map an I/O error raised while removing `path`.
    ///
    /// Permission failures become [`Error::UninstallPermissionDenied`].
    pub(crate) fn uninstall(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::UninstallPermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            Self::io("failed to remove", path, source)
        }
    }

    pub(crate) fn index_corrupt(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::IndexCorrupt {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
