//! Shared types and on-disk formats for pkg-mgr.
//!
//! Everything in here is pure data: no filesystem access, no process
//! spawning. The engine in `pkgmgr-core` and the command-line front end both
//! build on these types.

pub mod format;
pub mod record;
pub mod types;

// Re-exports
pub use format::ArchiveFormat;
pub use record::{IndexRecord, RecordError};
pub use types::*;

/// Prefix of every file in the index directory that is not a record
/// (lock files, in-flight temporary records).
pub const HIDDEN_PREFIX: char = '.';
