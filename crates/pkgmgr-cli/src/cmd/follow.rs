//! Follow / unfollow commands
use anyhow::{Context as _, Result};
use pkgmgr_core::ops::{self, Context};
use pkgmgr_schema::PackageName;

pub fn follow(ctx: &Context, packages: &[PackageName]) -> Result<()> {
    for name in packages {
        ops::follow(ctx, name).with_context(|| format!("failed to follow {name}"))?;
    }
    Ok(())
}

pub fn unfollow(ctx: &Context, packages: &[PackageName]) -> Result<()> {
    for name in packages {
        ops::unfollow(ctx, name).with_context(|| format!("failed to unfollow {name}"))?;
    }
    Ok(())
}
