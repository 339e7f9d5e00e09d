//! External tool detection.

use std::path::{Path, PathBuf};

/// Resolves `program` to an executable path.
///
/// Bare names are looked up on `PATH`; paths are checked as given. Returns
/// `None` when the program cannot be found.
pub fn resolve_program(program: &Path) -> Option<PathBuf> {
    match which::which(program) {
        Ok(path) => {
            log::debug!("Found {} at: {}", program.display(), path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{} not found: {}", program.display(), e);
            None
        }
    }
}

/// Logs whether the toolchain is usable before the pipeline starts.
///
/// A missing toolchain is not fatal: discovery still runs, and the
/// exhaustion report names the missing program.
pub fn check_toolchain(program: &Path) -> Option<PathBuf> {
    let resolved = resolve_program(program);
    match &resolved {
        Some(path) => log::info!("✓ toolchain available: {}", path.display()),
        None => log::warn!(
            "{} not found. Build and wrap strategies will fail; \
             install Xcode command line tools or pass --xcodebuild.",
            program.display()
        ),
    }
    resolved
}
