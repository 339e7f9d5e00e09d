//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap,
//! with validation and conversion into bundler [`Settings`].

use crate::bundler::{Settings, SettingsBuilder};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Format of the run summary.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// A single JSON document on stdout
    Json,
}

/// Packages a vendored SDK submodule into a unified .xcframework
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_xcframework",
    version,
    about = "Packages a vendored SDK submodule into a unified .xcframework",
    long_about = "Packages a vendored SDK submodule into a unified .xcframework.

Strategies, in priority order:
  1. build from source      *.xcodeproj archived for macOS and Mac Catalyst
  2. wrap prebuilt framework *.framework wrapped as-is
  3. wrap raw library       *.a / *.dylib plus the directory holding <SDK>.h

Usage:
  kodegen_bundler_xcframework --sdk-name Sdk
  kodegen_bundler_xcframework --sdk-name Sdk --submodule third_party/sdk --output Frameworks/Sdk.xcframework

Exit code 0 = a well-formed bundle exists at the output path (built now or already present).
Exit code 1 = no strategy succeeded; a diagnostic report is printed.
Exit code 2 = invalid arguments or an environment error."
)]
pub struct Args {
    /// SDK name; drives default paths, header name and scheme
    #[arg(long, value_name = "NAME")]
    pub sdk_name: String,

    /// Project root that default paths are relative to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub project_root: PathBuf,

    /// SDK submodule root [default: <project-root>/vendor/<NAME>]
    #[arg(long, value_name = "DIR")]
    pub submodule: Option<PathBuf>,

    /// Unified bundle location [default: <project-root>/Frameworks/<NAME>.xcframework]
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Scratch directory for variant builds [default: <project-root>/build/<NAME>]
    #[arg(long, value_name = "DIR")]
    pub build_root: Option<PathBuf>,

    /// Xcode scheme to archive [default: the project's name]
    #[arg(long, value_name = "SCHEME")]
    pub scheme: Option<String>,

    /// Public header file name [default: <NAME>.h]
    #[arg(long, value_name = "FILE")]
    pub header: Option<String>,

    /// Conventional header directory relative to the submodule (repeatable)
    /// [default: sdk, include, sdk/macos]
    #[arg(long = "header-dir", value_name = "DIR")]
    pub header_dirs: Vec<PathBuf>,

    /// xcodebuild program
    #[arg(long, env = "XCODEBUILD", value_name = "PATH", default_value = "xcodebuild")]
    pub xcodebuild: PathBuf,

    /// Timeout for each xcodebuild invocation, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 1800)]
    pub timeout_secs: u64,

    /// Summary format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        let name = self.sdk_name.trim();
        if name.is_empty() {
            return Err("SDK name cannot be empty".to_string());
        }
        if name.contains(['/', '\\']) {
            return Err(format!("SDK name must not contain path separators: {name}"));
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be at least one second".to_string());
        }
        if let Some(header) = &self.header {
            if header.contains(['/', '\\']) {
                return Err(format!(
                    "Header must be a file name, not a path: {header}"
                ));
            }
        }
        if let Some(dir) = self.header_dirs.iter().find(|d| d.is_absolute()) {
            return Err(format!(
                "Header directories are relative to the submodule: {}",
                dir.display()
            ));
        }
        Ok(())
    }

    /// Builds bundler settings, resolving defaults against `project_root`.
    pub fn to_settings(&self, project_root: &Path) -> crate::bundler::Result<Settings> {
        let name = self.sdk_name.trim();
        let resolve = |explicit: &Option<PathBuf>, default: PathBuf| match explicit {
            Some(path) => project_root.join(path),
            None => project_root.join(default),
        };

        let mut builder = SettingsBuilder::new(name)
            .submodule_root(resolve(&self.submodule, Path::new("vendor").join(name)))
            .output_path(resolve(
                &self.output,
                Path::new("Frameworks").join(format!("{name}.xcframework")),
            ))
            .build_root(resolve(&self.build_root, Path::new("build").join(name)))
            .xcodebuild(&self.xcodebuild)
            .command_timeout(Duration::from_secs(self.timeout_secs));

        if let Some(scheme) = &self.scheme {
            builder = builder.scheme(scheme.clone());
        }
        if let Some(header) = &self.header {
            builder = builder.header_name(header.clone());
        }
        if !self.header_dirs.is_empty() {
            builder = builder.header_dirs(self.header_dirs.clone());
        }

        builder.build()
    }
}
