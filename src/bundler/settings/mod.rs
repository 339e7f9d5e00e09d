//! Configuration structures for packaging runs.
//!
//! Strategy order and the variant list are fixed; everything else a run
//! needs (paths, names, depths, toolchain) is carried by [`Settings`].

mod builder;
mod core;
mod variant;

pub use builder::SettingsBuilder;
pub use self::core::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_HEADER_DIRS, SearchDepths, Settings};
pub use variant::PlatformVariant;
