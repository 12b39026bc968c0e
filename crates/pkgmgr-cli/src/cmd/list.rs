//! List commands
//!
//! Names go to stdout one per line, whatever the verbosity, so the output
//! can be piped.
use anyhow::{Context as _, Result};
use crossterm::style::Stylize;
use pkgmgr_core::ops::{self, Context};

use crate::ui::Output;

/// Detail is appended from this verbosity up.
const DETAIL_LEVEL: u8 = 3;

/// Every package in the library.
pub fn list_all(ctx: &Context) -> Result<()> {
    let names = ops::list_available(ctx).context("failed to list the package library")?;
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Every installed or followed package.
pub fn list_installed(ctx: &Context, output: &Output) -> Result<()> {
    let packages = ops::list_installed(ctx).context("failed to list installed packages")?;
    for package in packages {
        if output.verbosity() >= DETAIL_LEVEL {
            println!("{}  {}", package.name, package.state().dark_grey());
        } else {
            println!("{}", package.name);
        }
    }
    Ok(())
}
