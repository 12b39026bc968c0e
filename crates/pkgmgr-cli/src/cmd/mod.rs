//! One module per mode.

pub mod follow;
pub mod install;
pub mod list;
pub mod uninstall;
