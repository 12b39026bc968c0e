//! Orchestrators: one per command-line mode.
//!
//! Each entry point takes a [`Context`] and runs synchronously to
//! completion. Operations on a single package name hold that name's
//! [`PackageLock`](crate::lock::PackageLock) for their whole duration.

pub mod context;
pub mod follow;
pub mod install;
pub mod list;
pub mod uninstall;

pub use context::Context;
pub use follow::{follow, unfollow};
pub use install::{InstallReport, install, install_all};
pub use list::{InstalledPackage, list_available, list_installed};
pub use uninstall::{UninstallReport, uninstall};
