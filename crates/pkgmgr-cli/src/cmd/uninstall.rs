//! Uninstall command
use anyhow::{Context as _, Result};
use pkgmgr_core::Reporter;
use pkgmgr_core::ops::{self, Context};
use pkgmgr_schema::PackageName;

use crate::ui::Output;

/// Uninstall packages left to right, stopping at the first failure.
pub fn uninstall(ctx: &Context, output: &Output, packages: &[PackageName]) -> Result<()> {
    for name in packages {
        let report =
            ops::uninstall(ctx, name).with_context(|| format!("failed to uninstall {name}"))?;

        if !report.kept.is_empty() {
            output.warning(&format!(
                "{name}: left {} director{} holding files it does not own",
                report.kept.len(),
                if report.kept.len() == 1 { "y" } else { "ies" }
            ));
        }
    }
    Ok(())
}
