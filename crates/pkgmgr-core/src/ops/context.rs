//! Shared operation context.
//!
//! Groups the directories and the reporter every orchestrator needs, so the
//! entry points take one argument instead of five.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::paths::{Layout, canonical_dir};
use crate::reporter::Reporter;
use crate::script::{ScriptOutput, ScriptRunner};

/// Everything an operation needs besides the package name.
#[derive(Clone)]
pub struct Context {
    /// Directories to work in.
    pub layout: Layout,
    /// Progress sink.
    pub reporter: Arc<dyn Reporter>,
    /// Where lifecycle script output goes.
    pub script_output: ScriptOutput,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("layout", &self.layout)
            .field("script_output", &self.script_output)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Create a context; script output is inherited.
    pub fn new(layout: Layout, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            layout,
            reporter,
            script_output: ScriptOutput::default(),
        }
    }

    /// Choose where lifecycle script output goes.
    pub fn with_script_output(mut self, output: ScriptOutput) -> Self {
        self.script_output = output;
        self
    }

    /// Canonical system root.
    ///
    /// # Errors
    ///
    /// [`Error::NotADirectory`](crate::Error::NotADirectory) if the root is
    /// missing.
    pub fn system_root(&self) -> Result<PathBuf> {
        canonical_dir("system root", &self.layout.system_root)
    }

    /// A script runner for the given (canonical) system root.
    pub fn script_runner(&self, system_root: &Path) -> ScriptRunner {
        ScriptRunner::new(&self.layout.script_root, system_root).with_output(self.script_output)
    }
}
