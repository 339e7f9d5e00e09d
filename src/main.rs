//! Kodegen Bundler XCFramework - packages a vendored SDK into a unified .xcframework.
//!
//! Exit codes: 0 when a bundle is at the output path, 1 when every strategy
//! was exhausted, 2 on invalid arguments or environment errors.

use kodegen_bundler_xcframework::cli;
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = cli::parse_args();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    // Run CLI and get exit code
    let exit_code = match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {}", suggestion);
            }
            2
        }
    };

    process::exit(exit_code);
}
