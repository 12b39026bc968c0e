use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Scratch system root, library and index, plus an empty global config so
/// the host's `/etc/pkg-mgr.conf` never leaks into a test.
struct TestContext {
    temp_dir: TempDir,
    root: PathBuf,
    library: PathBuf,
    index: PathBuf,
    scripts: PathBuf,
    global_config: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().canonicalize().expect("canonical temp dir");
        let root = base.join("root");
        let library = base.join("pkgs");
        let index = base.join("installed");
        let scripts = base.join("scripts");
        for dir in [&root, &library, &index, &scripts] {
            fs::create_dir_all(dir).expect("failed to create dir");
        }

        let global_config = base.join("global.conf");
        fs::write(
            &global_config,
            format!("scriptWorkspaceRoot={}\n", scripts.display()),
        )
        .expect("failed to write global config");

        let ctx = Self {
            temp_dir,
            root,
            library,
            index,
            scripts,
            global_config,
        };
        ctx.write_package(
            "test0",
            &[("test0.txt", Some(&b"zero\n"[..]), 0o644)],
        );
        ctx.write_package(
            "test3",
            &[
                ("usr", None, 0o755),
                ("usr/bin", None, 0o755),
                ("usr/bin/test3", Some(&b"#!/bin/sh\necho test3\n"[..]), 0o755),
                ("etc", None, 0o755),
                ("etc/test3.conf", Some(&b"x=1\n"[..]), 0o644),
                ("post-install.sh", Some(&b"echo done > marker\n"[..]), 0o755),
            ],
        );
        ctx
    }

    /// Members are `(path, contents, mode)`; `None` contents is a directory.
    fn write_package(&self, name: &str, members: &[(&str, Option<&[u8]>, u32)]) {
        let file = fs::File::create(self.library.join(format!("{name}.tar"))).unwrap();
        let mut builder = tar::Builder::new(file);
        for (path, contents, mode) in members {
            let mut header = tar::Header::new_gnu();
            header.set_mode(*mode);
            match contents {
                Some(data) => {
                    header.set_size(data.len() as u64);
                    builder.append_data(&mut header, path, *data).unwrap();
                }
                None => {
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_size(0);
                    builder.append_data(&mut header, path, io::empty()).unwrap();
                }
            }
        }
        builder.into_inner().unwrap();
    }

    fn cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_pkg-mgr");
        let mut cmd = Command::new(bin_path);
        cmd.env("HOME", self.temp_dir.path())
            .env("XDG_CONFIG_HOME", self.temp_dir.path().join("config"))
            .env_remove("RUST_LOG")
            .env_remove("PKG_MGR_USER_CONFIG")
            .env("PKG_MGR_GLOBAL_CONFIG", &self.global_config);
        cmd
    }

    /// A command with `-s`, `-l` and `-i` pointing at the scratch dirs.
    fn pkg_mgr(&self, mode: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.arg(format!("-m{mode}"))
            .arg("-s")
            .arg(&self.root)
            .arg("-l")
            .arg(&self.library)
            .arg("-i")
            .arg(&self.index);
        cmd
    }

    fn run(&self, mode: &str, args: &[&str]) -> Output {
        self.pkg_mgr(mode)
            .args(args)
            .output()
            .expect("failed to run pkg-mgr")
    }
}

fn code(output: &Output) -> i32 {
    output.status.code().expect("pkg-mgr was killed by a signal")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn exists_all(root: &Path, paths: &[&str]) -> bool {
    paths.iter().all(|p| root.join(p).exists())
}

const TEST3_PATHS: [&str; 5] = [
    "usr",
    "usr/bin",
    "usr/bin/test3",
    "etc",
    "etc/test3.conf",
];

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.cmd().arg("--help").output().expect("failed to run pkg-mgr");
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_install_and_uninstall_test3() {
    let ctx = TestContext::new();

    let output = ctx.run("i", &["-v", "4", "test3"]);
    assert_eq!(code(&output), 0, "{output:?}");
    assert!(exists_all(&ctx.root, &TEST3_PATHS));
    assert!(!ctx.root.join("post-install.sh").exists());
    assert!(ctx.index.join("test3").is_file());

    let workspace = ctx.scripts.join("test3-post-install");
    assert!(workspace.join("post-install.sh").is_file());
    assert!(workspace.join("marker").is_file());

    let output = ctx.run("u", &["test3"]);
    assert_eq!(code(&output), 0, "{output:?}");
    assert!(TEST3_PATHS.iter().all(|p| !ctx.root.join(p).exists()));
    assert!(!ctx.index.join("test3").exists());

    // Nothing left to uninstall.
    assert_eq!(code(&ctx.run("u", &["test3"])), 16);
}

#[test]
fn test_follow_and_unfollow() {
    let ctx = TestContext::new();

    assert_eq!(code(&ctx.run("f", &["test0"])), 0);
    let record = ctx.index.join("test0");
    assert!(record.is_file());
    assert_eq!(fs::read(&record).unwrap(), b"");
    assert!(!ctx.root.join("test0.txt").exists());

    let listed = ctx.run("li", &[]);
    assert_eq!(code(&listed), 0);
    assert_eq!(stdout(&listed).lines().collect::<Vec<_>>(), vec!["test0"]);

    assert_eq!(code(&ctx.run("uf", &["test0"])), 0);
    assert!(!record.exists());
    assert_eq!(code(&ctx.run("uf", &["test0"])), 16);
}

#[test]
fn test_long_mode_names() {
    let ctx = TestContext::new();
    let output = ctx
        .cmd()
        .args(["--mode", "list-all", "--package-library"])
        .arg(&ctx.library)
        .output()
        .expect("failed to run pkg-mgr");
    assert_eq!(code(&output), 0, "{output:?}");
    assert_eq!(
        stdout(&output).lines().collect::<Vec<_>>(),
        vec!["test0", "test3"]
    );
}

#[test]
fn test_exit_codes() {
    let ctx = TestContext::new();

    assert_eq!(code(&ctx.run("i", &["ghost"])), 10);
    assert_eq!(code(&ctx.run("i", &[".hidden"])), 18);
    assert_eq!(code(&ctx.run("i", &[])), 2);
    assert_eq!(code(&ctx.run("la", &["extra"])), 2);

    fs::write(ctx.library.join("junk.tar"), vec![0x33; 1024]).unwrap();
    assert_eq!(code(&ctx.run("i", &["junk"])), 12);

    ctx.write_package("fails", &[("pre-install", Some(&b"exit 4\n"[..]), 0o755)]);
    assert_eq!(code(&ctx.run("i", &["fails"])), 15);
    assert!(!ctx.index.join("fails").exists());

    let output = ctx
        .cmd()
        .args(["-mi", "-s"])
        .arg(ctx.root.join("missing"))
        .arg("-l")
        .arg(&ctx.library)
        .arg("-i")
        .arg(&ctx.index)
        .arg("test0")
        .output()
        .unwrap();
    assert_eq!(code(&output), 19);
}

#[test]
fn test_missing_explicit_config() {
    let ctx = TestContext::new();
    let output = ctx
        .pkg_mgr("li")
        .arg("-u")
        .arg(ctx.temp_dir.path().join("nope.conf"))
        .output()
        .unwrap();
    assert_eq!(code(&output), 3);
}

#[test]
fn test_config_file_supplies_directories() {
    let ctx = TestContext::new();
    let user_config = ctx.temp_dir.path().join("user.conf");
    fs::write(
        &user_config,
        format!(
            "# scratch layout\nsystemRoot={}\npackageLibraryPath={}\ninstalledPkgPath={}\nverbosity=0\n",
            ctx.root.display(),
            ctx.library.display(),
            ctx.index.display()
        ),
    )
    .unwrap();

    let output = ctx
        .cmd()
        .arg("-mi")
        .arg("-u")
        .arg(&user_config)
        .arg("test0")
        .output()
        .unwrap();
    assert_eq!(code(&output), 0, "{output:?}");
    assert!(ctx.root.join("test0.txt").is_file());
    // verbosity=0 from the config silences everything.
    assert!(output.stdout.is_empty());
    assert!(output.stderr.is_empty());
}

#[test]
fn test_first_failure_stops_the_run() {
    let ctx = TestContext::new();
    assert_eq!(code(&ctx.run("i", &["test0"])), 0);

    let output = ctx.run("u", &["test0", "test3", "ghost"]);
    assert_eq!(code(&output), 16);
    assert!(!ctx.root.join("test0.txt").exists());
}
