//! Process exit codes.
//!
//! | Code | Meaning |
//! |---|---|
//! | 0 | success |
//! | 2 | command-line usage error |
//! | 3 | configuration error |
//! | 10 | package not found in the library |
//! | 11 | archive could not be opened |
//! | 12 | archive is corrupt |
//! | 13 | permission denied while installing |
//! | 14 | permission denied while uninstalling |
//! | 15 | lifecycle script failed |
//! | 16 | package is not installed or followed |
//! | 17 | index record is corrupt |
//! | 18 | invalid package name |
//! | 19 | a required directory is missing |
//! | 20 | other filesystem failure |
//!
//! These are stable: test drivers and scripts rely on them.

use std::process::ExitCode;

use pkgmgr_core::Error;
use pkgmgr_schema::NameError;

use crate::config::ConfigError;

pub const SUCCESS: u8 = 0;
pub const USAGE: u8 = 2;
pub const CONFIG: u8 = 3;
pub const PACKAGE_NOT_FOUND: u8 = 10;
pub const ARCHIVE_NOT_FOUND: u8 = 11;
pub const ARCHIVE_CORRUPT: u8 = 12;
pub const INSTALL_PERMISSION_DENIED: u8 = 13;
pub const UNINSTALL_PERMISSION_DENIED: u8 = 14;
pub const SCRIPT_FAILURE: u8 = 15;
pub const NOT_INSTALLED: u8 = 16;
pub const INDEX_CORRUPT: u8 = 17;
pub const INVALID_NAME: u8 = 18;
pub const NOT_A_DIRECTORY: u8 = 19;
pub const IO: u8 = 20;

/// Exit code for an engine error.
pub fn code_for_error(err: &Error) -> u8 {
    match err {
        Error::PackageNotFound { .. } => PACKAGE_NOT_FOUND,
        Error::ArchiveNotFound { .. } => ARCHIVE_NOT_FOUND,
        Error::ArchiveCorrupt { .. } => ARCHIVE_CORRUPT,
        Error::InstallPermissionDenied { .. } => INSTALL_PERMISSION_DENIED,
        Error::UninstallPermissionDenied { .. } => UNINSTALL_PERMISSION_DENIED,
        Error::ScriptFailure { .. } => SCRIPT_FAILURE,
        Error::NotInstalled { .. } => NOT_INSTALLED,
        Error::IndexCorrupt { .. } => INDEX_CORRUPT,
        Error::InvalidPackageName(_) => INVALID_NAME,
        Error::NotADirectory { .. } => NOT_A_DIRECTORY,
        Error::Io { .. } => IO,
    }
}

/// Exit code for whatever ended the run, found by walking the cause chain.
pub fn code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(engine) = cause.downcast_ref::<Error>() {
            return code_for_error(engine);
        }
        if cause.is::<ConfigError>() {
            return CONFIG;
        }
        if cause.is::<NameError>() {
            return INVALID_NAME;
        }
        if cause.is::<clap::Error>() {
            return USAGE;
        }
    }
    IO
}

/// Convert a run result into the process exit code.
pub fn exit_code(result: &anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::from(SUCCESS),
        Err(err) => ExitCode::from(code_for(err)),
    }
}
