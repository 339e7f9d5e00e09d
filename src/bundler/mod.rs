//! Packaging a vendored SDK submodule into a unified `.xcframework`.
//!
//! The submodule may arrive in one of several states: a full Xcode project,
//! a prebuilt single-platform `.framework`, or a bare library with headers.
//! [`Bundler`] inspects it, picks the highest-fidelity strategy available,
//! and either leaves exactly one well-formed bundle at the output path or
//! returns a [`DiagnosticReport`] saying what was searched and what was
//! missing.
//!
//! # Strategies
//!
//! | Priority | Strategy | Inputs | Slices |
//! |----------|----------|--------|--------|
//! | 1 | Build from source | `*.xcodeproj` | one per built [`PlatformVariant`] |
//! | 2 | Wrap prebuilt framework | `*.framework` | one |
//! | 3 | Wrap raw library | `*.a` / `*.dylib` + header directory | one |
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_xcframework::bundler::{Bundler, SettingsBuilder, SystemRunner};
//!
//! # async fn example() -> kodegen_bundler_xcframework::bundler::Result<()> {
//! let settings = SettingsBuilder::new("Sdk")
//!     .submodule_root("vendor/Sdk")
//!     .output_path("Frameworks/Sdk.xcframework")
//!     .build_root("build/Sdk")
//!     .build()?;
//! let runner = SystemRunner::new(settings.command_timeout());
//! let outcome = Bundler::new(settings, runner).bundle().await?;
//! std::process::exit(outcome.exit_code());
//! # }
//! ```

#![warn(missing_docs)]

mod builder;
pub mod discovery;
pub mod error;
pub mod platform;
mod settings;
pub mod utils;

pub use builder::{
    AttemptOutcome, Bundler, DiagnosticReport, OutputLock, PackagedBundle, PipelineOutcome,
    PipelineState, ReportContext, Strategy, StrategyAttempt, calculate_sha256, diagnostics,
    report, tool_detection,
};
pub use discovery::{
    Candidate, CandidateKind, DiscoveryMiss, HeaderDirectory, HeaderResolver, NamePattern,
    SearchLog, SearchRecord,
};
pub use error::{Error, Result};
pub use platform::macos::{
    xcframework::{UnifiedBundle, WrapFailure, WrapMode, XcframeworkWrapper},
    xcodebuild::{BuildFailure, DISTRIBUTION_BUILD_SETTINGS, XcodeBuilder},
};
pub use settings::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_HEADER_DIRS, PlatformVariant, SearchDepths, Settings,
    SettingsBuilder,
};
pub use utils::process::{CommandRunner, Invocation, ProcessOutput, SystemRunner};
