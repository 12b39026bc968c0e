//! Verbosity-aware status lines.
//!
//! | Verbosity | Shown |
//! |---|---|
//! | 0 | nothing |
//! | 1 | warnings and errors (stderr) |
//! | 2 | + one success line per package (stdout) |
//! | 3+ | + progress lines for each step |

use crossterm::style::Stylize;
use pkgmgr_core::Reporter;
use pkgmgr_schema::{PackageName, ScriptKind};

use super::theme::Icons;

const WARN_LEVEL: u8 = 1;
const SUCCESS_LEVEL: u8 = 2;
const PROGRESS_LEVEL: u8 = 3;

/// Reporter that prints to the terminal.
#[derive(Debug, Clone)]
pub struct Output {
    verbosity: u8,
    icons: Icons,
}

impl Output {
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity,
            icons: Icons::default(),
        }
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    fn shows(&self, level: u8) -> bool {
        self.verbosity >= level
    }

    /// Print the error that ended the run.
    pub fn error(&self, msg: &str) {
        if self.shows(WARN_LEVEL) {
            eprintln!("{} {}", self.icons.error.red(), msg.red());
        }
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.shows(SUCCESS_LEVEL) {
            println!("{} {}", self.icons.success.green(), msg);
        }
    }
}

impl Reporter for Output {
    fn installing(&self, name: &PackageName) {
        if self.shows(PROGRESS_LEVEL) {
            println!("{} installing {}", self.icons.active.cyan(), name.as_str().cyan());
        }
    }

    fn removing(&self, name: &PackageName) {
        if self.shows(PROGRESS_LEVEL) {
            println!("{} removing {}", self.icons.active.cyan(), name.as_str().cyan());
        }
    }

    fn script(&self, name: &PackageName, kind: ScriptKind) {
        if self.shows(PROGRESS_LEVEL) {
            println!(
                "{} running {} script for {}",
                self.icons.active.dark_grey(),
                kind,
                name.as_str().cyan()
            );
        }
    }

    fn done(&self, name: &PackageName, detail: &str) {
        if self.shows(SUCCESS_LEVEL) {
            println!(
                "{} {} {}",
                self.icons.success.green(),
                name.as_str().cyan(),
                detail.dark_grey()
            );
        }
    }

    // The final error is printed once by `main`; this is per-step detail.
    fn failed(&self, name: &PackageName, reason: &str) {
        if self.shows(PROGRESS_LEVEL) {
            eprintln!(
                "{} {} {}",
                self.icons.error.red(),
                name.as_str().cyan(),
                reason.red()
            );
        }
    }

    fn warning(&self, msg: &str) {
        if self.shows(WARN_LEVEL) {
            eprintln!("{} {}", self.icons.warning.yellow(), msg.yellow());
        }
    }
}
