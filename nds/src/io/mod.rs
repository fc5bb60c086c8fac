//! I/O helpers for driver commands.

pub mod config;
pub mod layout;
pub mod process;
pub mod submitter;
pub mod template;
pub mod toolchain;
