//! Follow / unfollow: index-only bookkeeping.
//!
//! Following marks a package as satisfied by other means. Neither operation
//! touches the system root or needs the package's archive.

use pkgmgr_schema::PackageName;

use crate::error::Result;
use crate::index::IndexStore;
use crate::ops::Context;

/// Write a followed-only record for `name`.
///
/// Idempotent. Following an installed package replaces its record, so the
/// paths it owned are forgotten (but stay on disk).
///
/// # Errors
///
/// [`Error::NotADirectory`](crate::Error::NotADirectory) if the index is
/// missing, or [`Error::Io`](crate::Error::Io) if the record cannot be written.
pub fn follow(ctx: &Context, name: &PackageName) -> Result<()> {
    let index = IndexStore::open(&ctx.layout.index_dir)?;
    let _lock = index.lock(name)?;

    match index.read(name) {
        Ok(record) if !record.is_followed_only() => {
            let msg = format!(
                "{name} was installed; following it forgets its {} owned paths",
                record.paths().len()
            );
            tracing::warn!("{msg}");
            ctx.reporter.warning(&msg);
        }
        _ => {}
    }

    index.write_followed_only(name)?;
    tracing::info!("following {name}");
    ctx.reporter.done(name, "followed");
    Ok(())
}

/// Delete the record for `name`, whatever kind it is.
///
/// # Errors
///
/// [`Error::NotInstalled`](crate::Error::NotInstalled) if there is no record.
pub fn unfollow(ctx: &Context, name: &PackageName) -> Result<()> {
    let index = IndexStore::open(&ctx.layout.index_dir)?;
    let _lock = index.lock(name)?;

    match index.read(name) {
        Ok(record) if !record.is_followed_only() => {
            let msg = format!(
                "{name} was installed; its {} files are left in place",
                record.paths().len()
            );
            tracing::warn!("{msg}");
            ctx.reporter.warning(&msg);
        }
        _ => {}
    }

    index.remove(name)?;
    tracing::info!("no longer following {name}");
    ctx.reporter.done(name, "unfollowed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::testutil::Fixture;
    use pkgmgr_schema::IndexRecord;
    use std::path::PathBuf;

    #[test]
    fn test_follow_unfollow_round_trip() {
        let fx = Fixture::new();
        let ctx = fx.context();
        let pkg = PackageName::new("test0").unwrap();
        let index = IndexStore::open(&fx.layout.index_dir).unwrap();

        follow(&ctx, &pkg).unwrap();
        follow(&ctx, &pkg).unwrap();
        assert_eq!(index.read(&pkg).unwrap(), IndexRecord::FollowedOnly);
        // No archive in the library was needed.
        assert!(std::fs::read_dir(&fx.layout.library_dir).unwrap().next().is_none());

        unfollow(&ctx, &pkg).unwrap();
        assert!(matches!(index.read(&pkg), Err(Error::NotInstalled { .. })));
        assert!(matches!(unfollow(&ctx, &pkg), Err(Error::NotInstalled { .. })));
    }

    #[test]
    fn test_follow_overwrites_install_record() {
        let fx = Fixture::new();
        let pkg = PackageName::new("both").unwrap();
        let index = IndexStore::open(&fx.layout.index_dir).unwrap();
        index.write(&pkg, &[PathBuf::from("/somewhere")]).unwrap();

        follow(&fx.context(), &pkg).unwrap();
        assert!(index.read(&pkg).unwrap().is_followed_only());
    }
}
