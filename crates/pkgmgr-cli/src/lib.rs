//! pkg-mgr - install, uninstall and follow archive packages
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Thin front end over [`pkgmgr_core`]: argument parsing, configuration
//! files, logging setup and exit codes.
//!
//! # Directory Layout
//!
//! ```text
//! /var/lib/pkg-mgr/
//! ├── pkgs/        # package library: <name>.tar, <name>.tar.gz, ...
//! └── installed/   # index: one record per installed or followed package
//! ```

pub mod cmd;
pub mod config;
pub mod exit;
pub mod ui;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::Settings;

#[derive(Debug, Parser)]
#[command(name = "pkg-mgr")]
#[command(author, version, about = "pkg-mgr - install and remove archive packages")]
pub struct Cli {
    /// Operation mode
    #[arg(short = 'm', long = "mode", value_enum)]
    pub mode: Mode,

    /// Directory packages are installed into
    #[arg(short = 's', long = "system-root")]
    pub system_root: Option<PathBuf>,

    /// Directory holding the package archives
    #[arg(short = 'l', long = "package-library")]
    pub package_library: Option<PathBuf>,

    /// Directory holding the installed-package index
    #[arg(short = 'i', long = "installed-pkg-library")]
    pub installed_pkg_library: Option<PathBuf>,

    /// 0 silent, 1 errors and warnings, 2 normal, 3 debug, 4 trace
    #[arg(short = 'v', long = "verbosity")]
    pub verbosity: Option<u8>,

    /// Global configuration file
    #[arg(short = 'g', long = "global-config", env = "PKG_MGR_GLOBAL_CONFIG")]
    pub global_config: Option<PathBuf>,

    /// User configuration file
    #[arg(short = 'u', long = "user-config", env = "PKG_MGR_USER_CONFIG")]
    pub user_config: Option<PathBuf>,

    /// Package names
    pub packages: Vec<String>,
}

impl Cli {
    /// Settings given directly on the command line.
    pub fn flag_settings(&self) -> Settings {
        Settings {
            verbosity: self.verbosity,
            system_root: self.system_root.clone(),
            package_library: self.package_library.clone(),
            installed_pkg_path: self.installed_pkg_library.clone(),
            user_config_path: self.user_config.clone(),
            script_workspace_root: None,
        }
    }

    /// Check the package count against the mode.
    pub fn validate(&self) -> Result<(), String> {
        match (self.mode.takes_packages(), self.packages.is_empty()) {
            (true, true) => Err(format!("mode '{}' needs at least one package name", self.mode)),
            (false, false) => Err(format!("mode '{}' does not take package names", self.mode)),
            _ => Ok(()),
        }
    }
}

/// What to do. Each mode has a short alias so `-mi` works like `-m install`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Install packages from the library
    #[value(name = "install", alias = "i")]
    Install,
    /// Remove installed packages
    #[value(name = "uninstall", alias = "u")]
    Uninstall,
    /// Mark packages as present without installing them
    #[value(name = "follow", alias = "f")]
    Follow,
    /// Drop a package's index record
    #[value(name = "unfollow", alias = "uf")]
    Unfollow,
    /// List packages in the library
    #[value(name = "list-all", alias = "la")]
    ListAll,
    /// List installed and followed packages
    #[value(name = "list-installed", alias = "li")]
    ListInstalled,
}

impl Mode {
    pub fn takes_packages(self) -> bool {
        !matches!(self, Self::ListAll | Self::ListInstalled)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self
            .to_possible_value()
            .map_or_else(String::new, |v| v.get_name().to_string());
        f.write_str(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pkg-mgr").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_short_mode_aliases() {
        assert_eq!(parse(&["-mi", "a"]).mode, Mode::Install);
        assert_eq!(parse(&["-mu", "a"]).mode, Mode::Uninstall);
        assert_eq!(parse(&["-mf", "a"]).mode, Mode::Follow);
        assert_eq!(parse(&["-muf", "a"]).mode, Mode::Unfollow);
        assert_eq!(parse(&["-mla"]).mode, Mode::ListAll);
        assert_eq!(parse(&["-mli"]).mode, Mode::ListInstalled);
        assert_eq!(parse(&["-m", "install", "a"]).mode, Mode::Install);
        assert_eq!(parse(&["--mode", "list-all"]).mode, Mode::ListAll);
    }

    #[test]
    fn test_paths_and_packages() {
        let cli = parse(&[
            "-mi", "-s", "/root", "-l", "/lib", "-i", "/idx", "-v", "4", "test3", "test4",
        ]);
        assert_eq!(cli.system_root, Some(PathBuf::from("/root")));
        assert_eq!(cli.package_library, Some(PathBuf::from("/lib")));
        assert_eq!(cli.installed_pkg_library, Some(PathBuf::from("/idx")));
        assert_eq!(cli.verbosity, Some(4));
        assert_eq!(cli.packages, vec!["test3", "test4"]);
    }

    #[test]
    fn test_package_count_validation() {
        assert!(parse(&["-mi"]).validate().is_err());
        assert!(parse(&["-mla", "x"]).validate().is_err());
        assert!(parse(&["-mli"]).validate().is_ok());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["pkg-mgr", "-mx"]).is_err());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Unfollow.to_string(), "unfollow");
    }
}
