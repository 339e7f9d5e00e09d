//! Platform toolchain integration.

pub mod macos;
