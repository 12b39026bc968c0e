//! Lifecycle script execution.
//!
//! Each script runs in its own workspace, `<script_root>/<package>-<kind>/`,
//! which is wiped before the run and left in place afterwards so its side
//! effects can be inspected. The script is written there under its archive
//! basename and executed with the workspace as working directory.
//!
//! ## Environment contract
//!
//! Scripts inherit the caller's environment plus:
//!
//! | Variable | Value |
//! |---|---|
//! | `PKG_MGR_PACKAGE` | Package name |
//! | `PKG_MGR_SCRIPT` | Script kind (`pre-install`, ...) |
//! | `PKG_MGR_ROOT` | Canonical system root |
//! | `PKG_MGR_WORKSPACE` | The script workspace |
//!
//! ## Invocation
//!
//! A payload starting with `#!` is run through the interpreter named on that
//! line (with at most one argument, as the kernel would). Anything else is
//! handed to `/bin/sh`. The script file is never executed directly.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use pkgmgr_schema::{PackageName, ScriptKind};

use crate::error::{Error, Result};
use crate::io::{ArchiveMember, MemberKind};
use crate::paths::script_workspace;

const DEFAULT_SHELL: &str = "/bin/sh";

/// A lifecycle script pulled out of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Which lifecycle hook this is.
    pub kind: ScriptKind,
    /// Basename the script had in the archive.
    pub file_name: OsString,
    /// Script body.
    pub payload: Vec<u8>,
}

impl Script {
    /// Convert a script member; returns the member back if it is not one.
    ///
    /// # Errors
    ///
    /// The member itself, for anything that is not [`MemberKind::Script`].
    pub fn from_member(member: ArchiveMember) -> std::result::Result<Self, ArchiveMember> {
        let MemberKind::Script(kind) = member.kind else {
            return Err(member);
        };
        let file_name = member
            .path
            .file_name()
            .map_or_else(|| OsString::from(kind.as_str()), OsStr::to_os_string);
        Ok(Self {
            kind,
            file_name,
            payload: member.payload,
        })
    }
}

/// The scripts of one package, at most one per kind.
#[derive(Debug, Clone, Default)]
pub struct Scripts {
    slots: [Option<Script>; 4],
}

impl Scripts {
    /// Add a script. The first script of each kind wins; a later duplicate is
    /// dropped with a warning and `false` is returned.
    pub fn insert(&mut self, script: Script) -> bool {
        let slot = &mut self.slots[slot(script.kind)];
        if let Some(existing) = slot {
            tracing::warn!(
                "ignoring duplicate {} script {:?} (keeping {:?})",
                script.kind,
                script.file_name,
                existing.file_name
            );
            return false;
        }
        *slot = Some(script);
        true
    }

    /// The script of the given kind, if the package has one.
    pub fn get(&self, kind: ScriptKind) -> Option<&Script> {
        self.slots[slot(kind)].as_ref()
    }

    /// Whether the package carries no scripts at all.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

fn slot(kind: ScriptKind) -> usize {
    match kind {
        ScriptKind::PreInstall => 0,
        ScriptKind::PostInstall => 1,
        ScriptKind::PreUninstall => 2,
        ScriptKind::PostUninstall => 3,
    }
}

/// What happens to a script's stdout and stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptOutput {
    /// Pass through to the caller's terminal.
    #[default]
    Inherit,
    /// Discard.
    Discard,
}

impl ScriptOutput {
    fn stdio(self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::Discard => Stdio::null(),
        }
    }
}

/// Runs lifecycle scripts for one system root.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    script_root: PathBuf,
    system_root: PathBuf,
    output: ScriptOutput,
}

impl ScriptRunner {
    /// Create a runner placing workspaces under `script_root`.
    pub fn new(script_root: impl Into<PathBuf>, system_root: impl Into<PathBuf>) -> Self {
        Self {
            script_root: script_root.into(),
            system_root: system_root.into(),
            output: ScriptOutput::default(),
        }
    }

    /// Choose where script output goes.
    pub fn with_output(mut self, output: ScriptOutput) -> Self {
        self.output = output;
        self
    }

    /// The workspace a script of `kind` for `package` runs in.
    pub fn workspace(&self, package: &PackageName, kind: ScriptKind) -> PathBuf {
        script_workspace(&self.script_root, package, kind)
    }

    /// Run `script` for `package` and wait for it.
    ///
    /// Returns the workspace the script ran in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScriptFailure`] if the script cannot be started,
    /// exits non-zero or is killed by a signal, and [`Error::Io`] if the
    /// workspace cannot be prepared.
    pub fn run(&self, script: &Script, package: &PackageName) -> Result<PathBuf> {
        let workspace = self.workspace(package, script.kind);
        prepare_workspace(&workspace)?;

        let script_path = workspace.join(&script.file_name);
        fs::write(&script_path, &script.payload)
            .and_then(|()| fs::set_permissions(&script_path, fs::Permissions::from_mode(0o755)))
            .map_err(|e| Error::io("failed to write script", &script_path, e))?;

        let failure = |reason: String| Error::ScriptFailure {
            package: package.clone(),
            kind: script.kind,
            reason,
        };

        let (program, extra_arg) = interpreter(&script.payload).map_err(failure)?;
        tracing::debug!(
            "running {} for {package} via {} in {}",
            script.kind,
            program.display(),
            workspace.display()
        );

        let mut cmd = Command::new(&program);
        if let Some(arg) = extra_arg {
            cmd.arg(arg);
        }
        let status = cmd
            .arg(&script_path)
            .current_dir(&workspace)
            .env("PKG_MGR_PACKAGE", package.as_str())
            .env("PKG_MGR_SCRIPT", script.kind.as_str())
            .env("PKG_MGR_ROOT", &self.system_root)
            .env("PKG_MGR_WORKSPACE", &workspace)
            .stdin(Stdio::null())
            .stdout(self.output.stdio())
            .stderr(self.output.stdio())
            .status()
            .map_err(|e| failure(format!("could not start {}: {e}", program.display())))?;

        check_status(status).map_err(failure)?;
        tracing::debug!("{} for {package} succeeded", script.kind);
        Ok(workspace)
    }
}

/// Remove whatever a previous run left and recreate the directory.
fn prepare_workspace(workspace: &Path) -> Result<()> {
    let cleared = match fs::symlink_metadata(workspace) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(workspace),
        Ok(_) => fs::remove_file(workspace),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    };
    cleared
        .and_then(|()| fs::create_dir_all(workspace))
        .map_err(|e| Error::io("failed to prepare script workspace", workspace, e))
}

/// Work out how to invoke a script body.
fn interpreter(payload: &[u8]) -> std::result::Result<(PathBuf, Option<String>), String> {
    let Some(rest) = payload.strip_prefix(b"#!") else {
        return Ok((PathBuf::from(DEFAULT_SHELL), None));
    };

    let line = rest.split(|b| *b == b'\n').next().unwrap_or_default();
    let line = std::str::from_utf8(line)
        .map_err(|_| "interpreter line is not valid UTF-8".to_string())?
        .trim();

    let (program, arg) = match line.split_once(char::is_whitespace) {
        Some((program, arg)) => (program, Some(arg.trim())),
        None => (line, None),
    };
    if program.is_empty() {
        return Err("interpreter line names no program".to_string());
    }

    Ok((
        PathBuf::from(program),
        arg.filter(|a| !a.is_empty()).map(str::to_string),
    ))
}

fn check_status(status: ExitStatus) -> std::result::Result<(), String> {
    match (status.code(), status.signal()) {
        (Some(0), _) => Ok(()),
        (Some(code), _) => Err(format!("exited with status {code}")),
        (None, Some(signal)) => Err(format!("killed by signal {signal}")),
        (None, None) => Err(format!("terminated abnormally ({status})")),
    }
}
