//! macOS toolchain integration.
//!
//! - [`xcodebuild`] - per-variant framework builds
//! - [`xcframework`] - merging inputs into the unified `.xcframework`

pub mod xcframework;
pub mod xcodebuild;
