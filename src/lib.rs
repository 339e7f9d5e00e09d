//! Packages a vendored SDK submodule into a unified `.xcframework`
//!
//! This library provides the packaging pipeline used by the
//! `kodegen_bundler_xcframework` binary:
//! - discovery of buildable projects, prebuilt frameworks and raw libraries
//! - per-variant `xcodebuild archive` builds for macOS and Mac Catalyst
//! - wrapping with `xcodebuild -create-xcframework`
//! - a diagnostic report when nothing can be packaged
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
