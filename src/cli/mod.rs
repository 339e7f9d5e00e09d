//! Command line interface for the xcframework packager.
//!
//! This module wires parsed arguments to the [`Bundler`](crate::bundler::Bundler)
//! pipeline and prints the run summary.

mod args;
mod output;

pub use args::{Args, OutputFormat};
pub use output::OutputManager;

use crate::bundler::{Bundler, SystemRunner, tool_detection};
use crate::error::{CliError, Result};
use anyhow::Context as _;

/// Runs one packaging pass and returns the process exit code.
///
/// `Ok(0)` when a well-formed bundle is at the output path, `Ok(1)` when
/// every strategy was exhausted. Errors are infrastructure failures.
pub async fn run(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let project_root = std::path::absolute(&args.project_root).with_context(|| {
        format!(
            "resolving project root {}",
            args.project_root.display()
        )
    })?;
    if !project_root.is_dir() {
        return Err(CliError::InvalidArguments {
            reason: format!("project root {} is not a directory", project_root.display()),
        }
        .into());
    }

    let settings = args.to_settings(&project_root)?;
    log::info!(
        "Packaging {} from {} into {}",
        settings.sdk_name(),
        settings.submodule_root().display(),
        settings.output_path().display()
    );
    tool_detection::check_toolchain(settings.xcodebuild());

    let runner = SystemRunner::new(settings.command_timeout());
    let outcome = Bundler::new(settings, runner).bundle().await?;

    OutputManager::new(args.format).outcome(&outcome)?;
    Ok(outcome.exit_code())
}

/// Parse arguments without executing (for testing)
pub fn parse_args() -> Args {
    Args::parse_args()
}
