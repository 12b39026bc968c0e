//! Package removal.
//!
//! Removes exactly the paths in the package's index record, deepest first,
//! then deletes the record. Lifecycle scripts come from the package's archive
//! if it is still in the library.

use std::cmp::Reverse;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use pkgmgr_schema::{IndexRecord, PackageName, ScriptKind};

use crate::error::{Error, Result};
use crate::index::IndexStore;
use crate::io::read_members;
use crate::library;
use crate::ops::Context;
use crate::ops::install::{partition, run_hook};
use crate::script::Scripts;

/// Outcome of a successful uninstall.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallReport {
    /// Paths that were deleted.
    pub removed: Vec<PathBuf>,
    /// Recorded paths that were already gone.
    pub absent: Vec<PathBuf>,
    /// Directories left behind because they still hold untracked content.
    pub kept: Vec<PathBuf>,
}

/// Uninstall one package.
///
/// # Errors
///
/// - [`Error::NotInstalled`] if there is no record.
/// - [`Error::IndexCorrupt`] if the record names a path outside the system
///   root.
/// - [`Error::ArchiveCorrupt`] if the archive is present but unreadable;
///   nothing has been removed at that point.
/// - [`Error::UninstallPermissionDenied`] or [`Error::ScriptFailure`]; the
///   record is left in place so the uninstall can be retried.
pub fn uninstall(ctx: &Context, name: &PackageName) -> Result<UninstallReport> {
    let system_root = ctx.system_root()?;
    let index = IndexStore::open(&ctx.layout.index_dir)?;
    let _lock = index.lock(name)?;

    let record = index.read(name)?;
    ctx.reporter.removing(name);
    tracing::info!("uninstalling {name} ({} owned paths)", record.paths().len());

    let result = run_uninstall(ctx, &index, &system_root, name, &record);
    match &result {
        Ok(report) => ctx
            .reporter
            .done(name, &format!("removed {} paths", report.removed.len())),
        Err(e) => ctx.reporter.failed(name, &e.to_string()),
    }
    result
}

fn run_uninstall(
    ctx: &Context,
    index: &IndexStore,
    system_root: &Path,
    name: &PackageName,
    record: &IndexRecord,
) -> Result<UninstallReport> {
    let record_path = index.record_path(name);
    for path in record.paths() {
        check_owned(system_root, path).map_err(|reason| Error::index_corrupt(&record_path, reason))?;
    }

    let scripts = load_scripts(ctx, name)?;
    let runner = ctx.script_runner(system_root);

    run_hook(ctx, &runner, &scripts, ScriptKind::PreUninstall, name)?;
    let report = remove_paths(record.paths())?;
    run_hook(ctx, &runner, &scripts, ScriptKind::PostUninstall, name)?;

    index.remove(name)?;
    Ok(report)
}

/// A recorded path must be strictly inside the system root.
fn check_owned(system_root: &Path, path: &Path) -> std::result::Result<(), String> {
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(format!("path {} contains '..'", path.display()));
    }
    if path == system_root || !path.starts_with(system_root) {
        return Err(format!(
            "path {} is not inside the system root {}",
            path.display(),
            system_root.display()
        ));
    }
    Ok(())
}

fn load_scripts(ctx: &Context, name: &PackageName) -> Result<Scripts> {
    let Some(archive) = library::find(&ctx.layout.library_dir, name) else {
        let msg = format!("archive for {name} is no longer in the library; skipping its scripts");
        tracing::warn!("{msg}");
        ctx.reporter.warning(&msg);
        return Ok(Scripts::default());
    };

    let (scripts, _) = partition(read_members(&archive)?);
    Ok(scripts)
}

/// Remove paths deepest first; equal depths in reverse record order.
fn remove_paths(paths: &[PathBuf]) -> Result<UninstallReport> {
    let mut ordered: Vec<(usize, &PathBuf)> = paths.iter().enumerate().collect();
    ordered.sort_by_key(|(idx, path)| Reverse((path.components().count(), *idx)));

    let mut report = UninstallReport::default();
    for (_, path) in ordered {
        match remove_path(path)? {
            Removal::Removed => report.removed.push(path.clone()),
            Removal::Absent => report.absent.push(path.clone()),
            Removal::Kept => report.kept.push(path.clone()),
        }
    }
    Ok(report)
}

enum Removal {
    Removed,
    Absent,
    Kept,
}

fn remove_path(path: &Path) -> Result<Removal> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("{} already absent", path.display());
            return Ok(Removal::Absent);
        }
        Err(e) => return Err(Error::uninstall(path, e)),
    };

    let removed = if meta.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };

    match removed {
        Ok(()) => {
            tracing::trace!("removed {}", path.display());
            Ok(Removal::Removed)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Removal::Absent),
        Err(e) if e.kind() == ErrorKind::DirectoryNotEmpty => {
            tracing::warn!(
                "leaving {} in place: it still holds files not owned by this package",
                path.display()
            );
            Ok(Removal::Kept)
        }
        Err(e) => Err(Error::uninstall(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::install::install;
    use crate::testutil::{Fixture, TarEntry};

    fn name(s: &str) -> PackageName {
        PackageName::new(s).unwrap()
    }

    fn tool_package(fx: &Fixture) {
        fx.package(
            "tool",
            &[
                TarEntry::Dir("usr"),
                TarEntry::Dir("usr/bin"),
                TarEntry::File("usr/bin/tool", b"bin", 0o755),
                TarEntry::Link("usr/bin/t", "tool"),
            ],
        );
    }

    #[test]
    fn test_uninstall_removes_everything_owned() {
        let fx = Fixture::new();
        tool_package(&fx);
        let ctx = fx.context();
        install(&ctx, &name("tool")).unwrap();

        let report = uninstall(&ctx, &name("tool")).unwrap();
        assert_eq!(
            report.removed,
            vec![
                fx.root().join("usr/bin/t"),
                fx.root().join("usr/bin/tool"),
                fx.root().join("usr/bin"),
                fx.root().join("usr"),
            ]
        );
        assert!(!fx.root().join("usr").exists());
        assert!(!fx.layout.index_dir.join("tool").exists());

        let err = uninstall(&ctx, &name("tool")).unwrap_err();
        assert!(matches!(err, Error::NotInstalled { .. }));
    }

    #[test]
    fn test_untracked_content_survives() {
        let fx = Fixture::new();
        tool_package(&fx);
        let ctx = fx.context();
        install(&ctx, &name("tool")).unwrap();
        fs::write(fx.root().join("usr/bin/mine"), b"keep me").unwrap();

        let report = uninstall(&ctx, &name("tool")).unwrap();
        assert_eq!(
            report.kept,
            vec![fx.root().join("usr/bin"), fx.root().join("usr")]
        );
        assert!(fx.root().join("usr/bin/mine").exists());
        assert!(!fx.root().join("usr/bin/tool").exists());
    }

    #[test]
    fn test_already_absent_paths_are_fine() {
        let fx = Fixture::new();
        tool_package(&fx);
        let ctx = fx.context();
        install(&ctx, &name("tool")).unwrap();
        fs::remove_file(fx.root().join("usr/bin/tool")).unwrap();

        let report = uninstall(&ctx, &name("tool")).unwrap();
        assert_eq!(report.absent, vec![fx.root().join("usr/bin/tool")]);
    }

    #[test]
    fn test_scripts_run_around_removal() {
        let fx = Fixture::new();
        fx.package(
            "hooked",
            &[
                TarEntry::File("data", b"x", 0o644),
                TarEntry::File(
                    "pre-uninstall.sh",
                    b"test -e \"$PKG_MGR_ROOT/data\" && touch saw-data\n",
                    0o755,
                ),
                TarEntry::File(
                    "post-uninstall.sh",
                    b"test ! -e \"$PKG_MGR_ROOT/data\" && touch saw-gone\n",
                    0o755,
                ),
            ],
        );
        let ctx = fx.context();
        install(&ctx, &name("hooked")).unwrap();
        uninstall(&ctx, &name("hooked")).unwrap();

        let scripts = &fx.layout.script_root;
        assert!(scripts.join("hooked-pre-uninstall/saw-data").exists());
        assert!(scripts.join("hooked-post-uninstall/saw-gone").exists());
    }

    #[test]
    fn test_failed_post_uninstall_keeps_record() {
        let fx = Fixture::new();
        fx.package(
            "sticky",
            &[
                TarEntry::File("data", b"x", 0o644),
                TarEntry::File("post-uninstall", b"exit 1\n", 0o755),
            ],
        );
        let ctx = fx.context();
        install(&ctx, &name("sticky")).unwrap();

        let err = uninstall(&ctx, &name("sticky")).unwrap_err();
        assert!(matches!(err, Error::ScriptFailure { .. }));
        assert!(!fx.root().join("data").exists());
        assert!(fx.layout.index_dir.join("sticky").exists());
    }

    #[test]
    fn test_missing_archive_skips_scripts() {
        let fx = Fixture::new();
        let archive = fx.package(
            "gone",
            &[
                TarEntry::File("data", b"x", 0o644),
                TarEntry::File("pre-uninstall", b"exit 1\n", 0o755),
            ],
        );
        let ctx = fx.context();
        install(&ctx, &name("gone")).unwrap();
        fs::remove_file(archive).unwrap();

        uninstall(&ctx, &name("gone")).unwrap();
        assert!(!fx.root().join("data").exists());
    }

    #[test]
    fn test_corrupt_archive_removes_nothing() {
        let fx = Fixture::new();
        let archive = fx.package("junk", &[TarEntry::File("data", b"x", 0o644)]);
        let ctx = fx.context();
        install(&ctx, &name("junk")).unwrap();
        fs::write(archive, vec![0x42; 1024]).unwrap();

        let err = uninstall(&ctx, &name("junk")).unwrap_err();
        assert!(matches!(err, Error::ArchiveCorrupt { .. }));
        assert!(fx.root().join("data").exists());
        assert!(fx.layout.index_dir.join("junk").exists());
    }

    #[test]
    fn test_record_outside_root_is_rejected() {
        let fx = Fixture::new();
        let outside = tempfile::NamedTempFile::new().unwrap();
        let index = IndexStore::open(&fx.layout.index_dir).unwrap();
        index
            .write(&name("evil"), &[outside.path().to_path_buf()])
            .unwrap();

        let err = uninstall(&fx.context(), &name("evil")).unwrap_err();
        assert!(matches!(err, Error::IndexCorrupt { .. }));
        assert!(outside.path().exists());
    }

    #[test]
    fn test_followed_only_uninstalls_trivially() {
        let fx = Fixture::new();
        let index = IndexStore::open(&fx.layout.index_dir).unwrap();
        index.write_followed_only(&name("dep")).unwrap();

        let report = uninstall(&fx.context(), &name("dep")).unwrap();
        assert_eq!(report, UninstallReport::default());
        assert!(!index.contains(&name("dep")));
    }

    #[test]
    fn test_host_directory_symlink_survives() {
        let fx = Fixture::new();
        let root = fx.root();
        fs::create_dir_all(root.join("usr/lib")).unwrap();
        fs::write(root.join("usr/lib/libc.so"), b"system").unwrap();
        std::os::unix::fs::symlink("usr/lib", root.join("lib")).unwrap();
        fx.package(
            "p",
            &[
                TarEntry::Dir("lib"),
                TarEntry::File("lib/libp.so", b"mine", 0o644),
            ],
        );
        let ctx = fx.context();

        let installed = install(&ctx, &name("p")).unwrap();
        assert_eq!(installed.paths, vec![root.join("lib/libp.so")]);

        let report = uninstall(&ctx, &name("p")).unwrap();
        assert_eq!(report.removed, vec![root.join("lib/libp.so")]);
        assert!(
            fs::symlink_metadata(root.join("lib"))
                .unwrap()
                .file_type()
                .is_symlink()
        );
        assert!(root.join("usr/lib/libc.so").exists());
        assert!(!root.join("usr/lib/libp.so").exists());
    }

    #[test]
    fn test_unreadable_path_keeps_record() {
        let fx = Fixture::new();
        let root = fx.root();
        fs::write(root.join("plain"), b"not a directory").unwrap();
        let index = IndexStore::open(&fx.layout.index_dir).unwrap();
        index
            .write(&name("odd"), &[root.join("plain/child")])
            .unwrap();

        let err = uninstall(&fx.context(), &name("odd")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "{err}");
        assert!(index.contains(&name("odd")));
        assert!(root.join("plain").is_file());
    }

    #[test]
    fn test_removal_order() {
        let fx = Fixture::new();
        let root = fx.root();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/f"), b"").unwrap();
        fs::write(root.join("a/g"), b"").unwrap();

        let paths = vec![
            root.join("a"),
            root.join("a/b"),
            root.join("a/g"),
            root.join("a/b/f"),
        ];
        let report = remove_paths(&paths).unwrap();
        assert_eq!(
            report.removed,
            vec![
                root.join("a/b/f"),
                root.join("a/g"),
                root.join("a/b"),
                root.join("a"),
            ]
        );
    }
}
