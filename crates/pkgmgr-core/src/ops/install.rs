//! Package installation.
//!
//! 1. Resolve the archive in the library and read every member.
//! 2. Split lifecycle scripts from regular members (archive order kept).
//! 3. Run `pre-install` before touching the system root.
//! 4. Materialize regular members in order, collecting their absolute paths.
//! 5. Run `post-install`.
//! 6. Replace the index record with the collected paths.
//!
//! A record is only written once every step has succeeded. Nothing is rolled
//! back on failure: files written before a failing member or a failing
//! `post-install` stay where they are.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use pkgmgr_schema::{PackageName, ScriptKind};

use crate::error::{Error, Result};
use crate::index::IndexStore;
use crate::io::{ArchiveMember, MemberKind, read_members};
use crate::library;
use crate::ops::Context;
use crate::script::{Script, ScriptRunner, Scripts};

/// Outcome of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Installed package.
    pub package: PackageName,
    /// Archive it was installed from.
    pub archive: PathBuf,
    /// Paths now owned by the package, as recorded in the index.
    pub paths: Vec<PathBuf>,
}

/// Install one package from the library.
///
/// # Errors
///
/// Any [`Error`]; see the module docs for which steps leave what behind.
pub fn install(ctx: &Context, name: &PackageName) -> Result<InstallReport> {
    let archive = library::resolve(&ctx.layout.library_dir, name)?;
    install_archive(ctx, name, &archive)
}

/// Install several packages left to right, stopping at the first failure.
///
/// Every name is resolved before anything is installed, so a typo in the
/// last name does not leave the first ones half-done.
///
/// # Errors
///
/// The first error encountered.
pub fn install_all(ctx: &Context, names: &[PackageName]) -> Result<Vec<InstallReport>> {
    let resolved = names
        .iter()
        .map(|name| library::resolve(&ctx.layout.library_dir, name).map(|path| (name, path)))
        .collect::<Result<Vec<_>>>()?;

    resolved
        .into_iter()
        .map(|(name, archive)| install_archive(ctx, name, &archive))
        .collect()
}

/// Install `name` from an explicit archive path.
///
/// # Errors
///
/// Same as [`install`], minus [`Error::PackageNotFound`].
pub fn install_archive(ctx: &Context, name: &PackageName, archive: &Path) -> Result<InstallReport> {
    let system_root = ctx.system_root()?;
    let index = IndexStore::open(&ctx.layout.index_dir)?;
    let _lock = index.lock(name)?;

    ctx.reporter.installing(name);
    tracing::info!("installing {name} from {}", archive.display());

    let result = run_install(ctx, &index, &system_root, name, archive);
    match &result {
        Ok(paths) => ctx
            .reporter
            .done(name, &format!("installed {} paths", paths.len())),
        Err(e) => ctx.reporter.failed(name, &e.to_string()),
    }

    Ok(InstallReport {
        package: name.clone(),
        archive: archive.to_path_buf(),
        paths: result?,
    })
}

fn run_install(
    ctx: &Context,
    index: &IndexStore,
    system_root: &Path,
    name: &PackageName,
    archive: &Path,
) -> Result<Vec<PathBuf>> {
    let (scripts, members) = partition(read_members(archive)?);
    tracing::debug!("{name}: {} regular members", members.len());

    let runner = ctx.script_runner(system_root);
    run_hook(ctx, &runner, &scripts, ScriptKind::PreInstall, name)?;

    let paths = materialize(system_root, archive, &members)?;

    run_hook(ctx, &runner, &scripts, ScriptKind::PostInstall, name)?;

    index.write(name, &paths)?;
    Ok(paths)
}

/// Split scripts from regular members, keeping archive order for the latter.
pub(crate) fn partition(members: Vec<ArchiveMember>) -> (Scripts, Vec<ArchiveMember>) {
    let mut scripts = Scripts::default();
    let mut regular = Vec::with_capacity(members.len());
    for member in members {
        match Script::from_member(member) {
            Ok(script) => {
                scripts.insert(script);
            }
            Err(member) => regular.push(member),
        }
    }
    (scripts, regular)
}

/// Run the script of `kind`, if the package has one.
pub(crate) fn run_hook(
    ctx: &Context,
    runner: &ScriptRunner,
    scripts: &Scripts,
    kind: ScriptKind,
    name: &PackageName,
) -> Result<()> {
    let Some(script) = scripts.get(kind) else {
        return Ok(());
    };
    ctx.reporter.script(name, kind);
    runner.run(script, name)?;
    Ok(())
}

/// Write every regular member under `root`; returns the owned paths.
fn materialize(root: &Path, archive: &Path, members: &[ArchiveMember]) -> Result<Vec<PathBuf>> {
    let mut owned = Vec::with_capacity(members.len());
    let mut seen = HashSet::new();
    // Directories this install created, with the mode to give them once
    // their contents are in place.
    let mut created_dirs = Vec::new();

    for member in members {
        let target = root.join(&member.path);
        if let Some(parent) = target.parent() {
            ensure_contained(root, parent).map_err(|reason| Error::ArchiveCorrupt {
                path: archive.to_path_buf(),
                reason,
            })?;
            fs::create_dir_all(parent).map_err(|e| Error::install(parent, e))?;
        }

        match &member.kind {
            MemberKind::Directory => match ensure_dir(&target)? {
                DirState::Created => created_dirs.push((target.clone(), member.mode)),
                DirState::Existing => {}
                // The link belongs to the host, so uninstall must never remove it.
                DirState::Symlinked => {
                    tracing::debug!("{} is a symlink to a directory, not owned", target.display());
                    continue;
                }
            },
            MemberKind::File => write_file(&target, &member.payload, member.mode)?,
            MemberKind::Symlink(link) => write_symlink(&target, link)?,
            MemberKind::Script(_) => continue,
        }

        if fs::symlink_metadata(&target).is_err() {
            return Err(Error::io(
                "installed path is missing",
                target,
                io::Error::from(ErrorKind::NotFound),
            ));
        }
        tracing::trace!("installed {}", target.display());

        if seen.insert(target.clone()) {
            owned.push(target);
        }
    }

    // Deepest first, so a read-only parent never blocks a child's chmod.
    for (dir, mode) in created_dirs.iter().rev() {
        fs::set_permissions(dir, fs::Permissions::from_mode(*mode))
            .map_err(|e| Error::install(dir, e))?;
    }

    Ok(owned)
}

/// Refuse to write through a symlink that leads out of `root`.
///
/// Checks the deepest ancestor of `dir` that already exists, which covers
/// both links already on disk and links placed by earlier members.
fn ensure_contained(root: &Path, dir: &Path) -> std::result::Result<(), String> {
    let mut existing = dir;
    while fs::symlink_metadata(existing).is_err() {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => return Ok(()),
        }
    }

    match fs::canonicalize(existing) {
        Ok(resolved) if resolved.starts_with(root) => Ok(()),
        Ok(resolved) => Err(format!(
            "{} resolves to {}, outside the system root",
            dir.display(),
            resolved.display()
        )),
        // Dangling link: create_dir_all will report it.
        Err(_) => Ok(()),
    }
}

/// How a directory member was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirState {
    Created,
    Existing,
    /// A pre-existing symlink to a directory, e.g. `lib -> usr/lib`.
    Symlinked,
}

/// Make sure `path` is a directory.
fn ensure_dir(path: &Path) -> Result<DirState> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(DirState::Existing),
        Ok(meta) if meta.file_type().is_symlink() && path.is_dir() => Ok(DirState::Symlinked),
        Ok(_) => Err(Error::io(
            "cannot create directory over existing file",
            path,
            io::Error::from(ErrorKind::AlreadyExists),
        )),
        Err(e) if e.kind() == ErrorKind::NotFound => fs::create_dir(path)
            .map(|()| DirState::Created)
            .map_err(|e| Error::install(path, e)),
        Err(e) => Err(Error::install(path, e)),
    }
}

/// Unlink whatever non-directory sits at `path`.
///
/// Replacing rather than truncating means a read-only file from an earlier
/// install can be overwritten, and an existing symlink is never followed.
fn clear_target(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Err(Error::io(
            "cannot replace directory",
            path,
            io::Error::from(ErrorKind::IsADirectory),
        )),
        Ok(_) => fs::remove_file(path).map_err(|e| Error::install(path, e)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::install(path, e)),
    }
}

fn write_file(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    clear_target(path)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(path)
        .map_err(|e| Error::install(path, e))?;
    file.write_all(contents)
        .map_err(|e| Error::install(path, e))?;

    // The open mode is filtered through the umask; restore the archive's bits.
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| Error::install(path, e))
}

fn write_symlink(path: &Path, link: &Path) -> Result<()> {
    clear_target(path)?;
    std::os::unix::fs::symlink(link, path).map_err(|e| Error::install(path, e))
}
