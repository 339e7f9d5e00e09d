//! Filesystem and process helpers shared by the bundler.

pub mod fs;
pub mod process;
