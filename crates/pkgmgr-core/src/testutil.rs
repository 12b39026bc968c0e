//! Fixture helpers shared by the unit tests.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tar::{Builder, EntryType, Header};
use tempfile::TempDir;

use crate::ops::Context;
use crate::paths::Layout;
use crate::reporter::NullReporter;
use crate::script::ScriptOutput;

/// One entry of a synthesized archive.
pub(crate) enum TarEntry<'a> {
    Dir(&'a str),
    DirMode(&'a str, u32),
    File(&'a str, &'a [u8], u32),
    Link(&'a str, &'a str),
    /// Regular file whose header name is written verbatim, bypassing the
    /// builder's own path checks.
    RawFile(&'a str, &'a [u8]),
}

fn append<W: Write>(builder: &mut Builder<W>, entry: &TarEntry<'_>) {
    let mut header = Header::new_gnu();
    match *entry {
        TarEntry::Dir(path) => append(builder, &TarEntry::DirMode(path, 0o755)),
        TarEntry::DirMode(path, mode) => {
            header.set_entry_type(EntryType::Directory);
            header.set_mode(mode);
            header.set_size(0);
            builder.append_data(&mut header, path, io::empty()).unwrap();
        }
        TarEntry::File(path, data, mode) => {
            header.set_entry_type(EntryType::Regular);
            header.set_mode(mode);
            header.set_size(data.len() as u64);
            builder.append_data(&mut header, path, data).unwrap();
        }
        TarEntry::Link(path, target) => {
            header.set_entry_type(EntryType::Symlink);
            header.set_mode(0o777);
            header.set_size(0);
            builder.append_link(&mut header, path, target).unwrap();
        }
        TarEntry::RawFile(path, data) => {
            header.set_entry_type(EntryType::Regular);
            header.set_mode(0o644);
            header.set_size(data.len() as u64);
            let name = &mut header.as_old_mut().name;
            name[..path.len()].copy_from_slice(path.as_bytes());
            header.set_cksum();
            builder.append(&header, data).unwrap();
        }
    }
}

fn build<W: Write>(writer: W, entries: &[TarEntry<'_>]) -> W {
    let mut builder = Builder::new(writer);
    for entry in entries {
        append(&mut builder, entry);
    }
    builder.into_inner().unwrap()
}

pub(crate) fn write_tar(path: &Path, entries: &[TarEntry<'_>]) {
    build(File::create(path).unwrap(), entries);
}

pub(crate) fn write_tar_gz(path: &Path, entries: &[TarEntry<'_>]) {
    let encoder = flate2::write::GzEncoder::new(
        File::create(path).unwrap(),
        flate2::Compression::default(),
    );
    build(encoder, entries).finish().unwrap();
}

pub(crate) fn write_tar_zst(path: &Path, entries: &[TarEntry<'_>]) {
    let encoder = zstd::stream::write::Encoder::new(File::create(path).unwrap(), 0).unwrap();
    build(encoder, entries).finish().unwrap();
}

/// Scratch system root, library, index and script root.
pub(crate) struct Fixture {
    _tmp: TempDir,
    pub(crate) layout: Layout,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().canonicalize().unwrap();
        let layout = Layout::new(base.join("root"), base.join("pkgs"), base.join("installed"))
            .with_script_root(base.join("scripts"));
        for dir in [
            &layout.system_root,
            &layout.library_dir,
            &layout.index_dir,
            &layout.script_root,
        ] {
            std::fs::create_dir_all(dir).unwrap();
        }
        Self { _tmp: tmp, layout }
    }

    /// Write `<library>/<name>.tar`.
    pub(crate) fn package(&self, name: &str, entries: &[TarEntry<'_>]) -> PathBuf {
        let path = self.layout.library_dir.join(format!("{name}.tar"));
        write_tar(&path, entries);
        path
    }

    pub(crate) fn root(&self) -> &Path {
        &self.layout.system_root
    }

    pub(crate) fn context(&self) -> Context {
        Context::new(self.layout.clone(), Arc::new(NullReporter))
            .with_script_output(ScriptOutput::Discard)
    }
}
