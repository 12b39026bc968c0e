//! IO modules - reading package archives

pub mod archive;

pub use archive::{ArchiveMember, MemberKind, PackageArchive, read_members};
