//! pkgmgr-core - the install/uninstall engine behind `pkg-mgr`
//!
//! Turns a package archive's member list into filesystem state under a
//! system root, records exactly which paths were created, and removes them
//! again on uninstall. Lifecycle scripts run in per-package workspaces.
//!
//! Every entry point takes an explicit [`Layout`]; nothing here reads paths
//! from global state.

pub mod error;
pub mod index;
pub mod io;
pub mod library;
pub mod lock;
pub mod ops;
pub mod paths;
pub mod reporter;
pub mod script;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{Error, Result};
pub use index::IndexStore;
pub use paths::Layout;
pub use reporter::{NullReporter, Reporter};
