//! Listing available and installed packages.

use pkgmgr_schema::{IndexRecord, PackageName};

use crate::error::Result;
use crate::index::IndexStore;
use crate::library;
use crate::ops::Context;

/// One entry of the installed-package listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    /// Package name.
    pub name: PackageName,
    /// Its index record.
    pub record: IndexRecord,
}

impl InstalledPackage {
    /// Short human description of the record state.
    pub fn state(&self) -> String {
        match &self.record {
            IndexRecord::FollowedOnly => "followed".to_string(),
            IndexRecord::Installed(paths) => format!("installed, {} paths", paths.len()),
        }
    }
}

/// Every package archive in the library, sorted by name.
///
/// # Errors
///
/// See [`library::list_available`].
pub fn list_available(ctx: &Context) -> Result<Vec<PackageName>> {
    library::list_available(&ctx.layout.library_dir)
}

/// Every installed or followed package, sorted by name.
///
/// # Errors
///
/// See [`IndexStore::list`].
pub fn list_installed(ctx: &Context) -> Result<Vec<InstalledPackage>> {
    let index = IndexStore::open(&ctx.layout.index_dir)?;
    Ok(index
        .list()?
        .into_iter()
        .map(|(name, record)| InstalledPackage { name, record })
        .collect())
}
