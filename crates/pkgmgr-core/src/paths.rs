//! Directory layout and the fixed locations derived from it.

use std::path::{Path, PathBuf};

use pkgmgr_schema::{HIDDEN_PREFIX, PackageName, ScriptKind};

use crate::error::{Error, Result};

/// Default system root: `/`
pub const DEFAULT_SYSTEM_ROOT: &str = "/";

/// Default package library: `/var/lib/pkg-mgr/pkgs`
pub const DEFAULT_LIBRARY_DIR: &str = "/var/lib/pkg-mgr/pkgs";

/// Default index directory: `/var/lib/pkg-mgr/installed`
pub const DEFAULT_INDEX_DIR: &str = "/var/lib/pkg-mgr/installed";

/// The directories one operation works with.
///
/// Built once from the command line and configuration files and handed to
/// every component; nothing in the engine reads paths from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Where regular archive members are materialized.
    pub system_root: PathBuf,
    /// Read-only directory of package archives.
    pub library_dir: PathBuf,
    /// Directory holding one index record per package.
    pub index_dir: PathBuf,
    /// Parent directory of every script workspace.
    pub script_root: PathBuf,
}

impl Layout {
    /// Create a layout with the default script workspace root.
    pub fn new(
        system_root: impl Into<PathBuf>,
        library_dir: impl Into<PathBuf>,
        index_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            system_root: system_root.into(),
            library_dir: library_dir.into(),
            index_dir: index_dir.into(),
            script_root: default_script_root(),
        }
    }

    /// Override the parent directory of script workspaces.
    pub fn with_script_root(mut self, script_root: impl Into<PathBuf>) -> Self {
        self.script_root = script_root.into();
        self
    }
}

/// Script workspaces live in the system temp dir unless configured otherwise.
pub fn default_script_root() -> PathBuf {
    std::env::temp_dir()
}

/// Workspace for one script run: `<script_root>/<package>-<kind>`
pub fn script_workspace(script_root: &Path, package: &PackageName, kind: ScriptKind) -> PathBuf {
    script_root.join(format!("{package}-{kind}"))
}

/// Index record for a package: `<index_dir>/<package>`
pub fn record_path(index_dir: &Path, package: &PackageName) -> PathBuf {
    index_dir.join(package)
}

/// Lock file guarding a package's record: `<index_dir>/.<package>.lock`
pub fn lock_path(index_dir: &Path, package: &PackageName) -> PathBuf {
    index_dir.join(format!("{HIDDEN_PREFIX}{package}.lock"))
}

/// Resolve `path` to an absolute, symlink-free directory.
///
/// # Errors
///
/// Returns [`Error::NotADirectory`] if the path does not exist or is not a
/// directory.
pub fn canonical_dir(role: &'static str, path: &Path) -> Result<PathBuf> {
    match std::fs::canonicalize(path) {
        Ok(resolved) if resolved.is_dir() => Ok(resolved),
        _ => Err(Error::NotADirectory {
            role,
            path: path.to_path_buf(),
        }),
    }
}
