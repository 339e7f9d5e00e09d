//! Pipeline orchestration and coordination.
//!
//! This module provides the main [`Bundler`] pipeline that drives discovery,
//! per-variant builds and wrapping to produce the unified `.xcframework`.
//!
//! # Overview
//!
//! The pipeline:
//! 1. Returns immediately if a well-formed bundle already exists
//! 2. Takes the advisory output lock
//! 3. Tries each [`Strategy`] in priority order
//! 4. Returns a [`PackagedBundle`] or a [`DiagnosticReport`]
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA-256 digest of the produced bundle
//! - [`diagnostics`] - Exhaustion report
//! - [`lock`] - Advisory lock around the output path
//! - [`orchestrator`] - Main [`Bundler`] state machine
//! - [`tool_detection`] - Toolchain availability checking

mod checksum;
pub mod diagnostics;
mod lock;
mod orchestrator;
pub mod tool_detection;

pub use checksum::calculate_sha256;
pub use diagnostics::{DiagnosticReport, ReportContext, report};
pub use lock::OutputLock;
pub use orchestrator::{
    AttemptOutcome, Bundler, PackagedBundle, PipelineOutcome, PipelineState, Strategy,
    StrategyAttempt,
};
