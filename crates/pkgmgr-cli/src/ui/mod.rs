//! Terminal output.
//!
//! - [`theme`] - icons shared by every status line
//! - [`output`] - the [`Reporter`](pkgmgr_core::Reporter) commands hand to the engine

pub mod output;
pub mod theme;

pub use output::Output;
pub use theme::Icons;
