//! pkg-mgr - package manager CLI

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use pkgmgr_cli::config::{self, Settings};
use pkgmgr_cli::ui::Output;
use pkgmgr_cli::{Cli, Mode, cmd, exit};
use pkgmgr_core::ops::Context;
use pkgmgr_core::script::ScriptOutput;
use pkgmgr_schema::PackageName;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(msg) = cli.validate() {
        Cli::command()
            .error(clap::error::ErrorKind::WrongNumberOfValues, msg)
            .exit();
    }

    let (settings, warnings) = match config::resolve(
        cli.flag_settings(),
        cli.global_config.as_deref(),
        cli.user_config.as_deref(),
    ) {
        Ok(resolved) => resolved,
        Err(err) => {
            if cli.verbosity != Some(0) {
                eprintln!("{} {err}", "error:".red().bold());
            }
            return ExitCode::from(exit::CONFIG);
        }
    };

    let verbosity = settings.verbosity();
    init_tracing(verbosity);
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    let output = Output::new(verbosity);
    let result = run(&cli, &settings, &output);
    if let Err(err) = &result {
        output.error(&format!("{err:#}"));
    }
    exit::exit_code(&result)
}

/// Map verbosity onto a tracing filter; `RUST_LOG` wins when set.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "off",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli, settings: &Settings, output: &Output) -> Result<()> {
    let packages = cli
        .packages
        .iter()
        .map(|p| PackageName::new(p).with_context(|| format!("bad package name '{p}'")))
        .collect::<Result<Vec<_>>>()?;

    let layout = settings.layout();
    tracing::debug!("layout: {layout:?}");

    let script_output = if output.verbosity() == 0 {
        ScriptOutput::Discard
    } else {
        ScriptOutput::Inherit
    };
    let ctx = Context::new(layout, Arc::new(output.clone())).with_script_output(script_output);

    match cli.mode {
        Mode::Install => cmd::install::install(&ctx, output, &packages),
        Mode::Uninstall => cmd::uninstall::uninstall(&ctx, output, &packages),
        Mode::Follow => cmd::follow::follow(&ctx, &packages),
        Mode::Unfollow => cmd::follow::unfollow(&ctx, &packages),
        Mode::ListAll => cmd::list::list_all(&ctx),
        Mode::ListInstalled => cmd::list::list_installed(&ctx, output),
    }
}
