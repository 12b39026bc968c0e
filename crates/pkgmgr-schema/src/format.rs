//! Package archive container formats.

use std::path::Path;

/// Container format of a package archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Uncompressed tar archive (`.tar`).
    Tar,
    /// Gzip-compressed tar archive (`.tar.gz` / `.tgz`).
    TarGz,
    /// Zstandard-compressed tar archive (`.tar.zst` / `.tzst`).
    TarZst,
}

impl ArchiveFormat {
    /// Recognized extensions, in library lookup order.
    ///
    /// A package named `foo` resolves to the first of `foo.tar`, `foo.tar.gz`,
    /// `foo.tgz`, `foo.tar.zst`, `foo.tzst` that exists.
    pub const EXTENSIONS: [(&'static str, Self); 5] = [
        (".tar", Self::Tar),
        (".tar.gz", Self::TarGz),
        (".tgz", Self::TarGz),
        (".tar.zst", Self::TarZst),
        (".tzst", Self::TarZst),
    ];

    /// Detect the format from a file name, returning the package name part.
    ///
    /// ```
    /// use pkgmgr_schema::ArchiveFormat;
    ///
    /// assert_eq!(
    ///     ArchiveFormat::split_file_name("test0.tar.gz"),
    ///     Some(("test0", ArchiveFormat::TarGz))
    /// );
    /// assert_eq!(ArchiveFormat::split_file_name("README.md"), None);
    /// ```
    pub fn split_file_name(file_name: &str) -> Option<(&str, Self)> {
        // Longest suffix first so `.tar.gz` is not mistaken for a bare `.gz`.
        let mut candidates = Self::EXTENSIONS;
        candidates.sort_by_key(|(ext, _)| std::cmp::Reverse(ext.len()));

        candidates.into_iter().find_map(|(ext, format)| {
            file_name
                .strip_suffix(ext)
                .filter(|stem| !stem.is_empty())
                .map(|stem| (stem, format))
        })
    }

    /// Detect the format of an archive path from its extension.
    pub fn detect(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        Self::split_file_name(file_name).map(|(_, format)| format)
    }
}
