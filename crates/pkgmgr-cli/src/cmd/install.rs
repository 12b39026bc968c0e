//! Install command
use anyhow::{Context as _, Result};
use pkgmgr_core::ops::{self, Context};
use pkgmgr_schema::PackageName;

use crate::ui::Output;

/// Install packages left to right; every name must resolve first.
pub fn install(ctx: &Context, output: &Output, packages: &[PackageName]) -> Result<()> {
    let reports = ops::install_all(ctx, packages).context("install failed")?;

    if reports.len() > 1 {
        let paths: usize = reports.iter().map(|r| r.paths.len()).sum();
        output.success(&format!(
            "{} packages installed ({paths} paths)",
            reports.len()
        ));
    }
    Ok(())
}
