//! Per-variant framework builds with `xcodebuild archive`.
//!
//! Each variant gets its own directory under the build root:
//!
//! ```text
//! <build_root>/<variant>/<Scheme>.xcarchive
//! <build_root>/<variant>/DerivedData
//! ```
//!
//! The directory is recreated before every build, and nothing is written to
//! the project itself.

use crate::bundler::{
    discovery::{self, NamePattern},
    settings::{PlatformVariant, Settings},
    utils::{
        fs,
        process::{CommandRunner, Invocation},
    },
};
use std::path::{Path, PathBuf};

/// Build settings every variant is archived with.
///
/// `SKIP_INSTALL=NO` keeps the framework in the archive's `Products`;
/// the others make the output redistributable.
pub const DISTRIBUTION_BUILD_SETTINGS: [&str; 3] = [
    "SKIP_INSTALL=NO",
    "BUILD_LIBRARY_FOR_DISTRIBUTION=YES",
    "GCC_DYNAMIC_NO_PIC=NO",
];

/// How deep to look for the built framework inside `<archive>/Products`.
const PRODUCT_SEARCH_DEPTH: usize = 4;

/// A variant that did not produce a framework.
///
/// Never fatal to the pipeline on its own.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{variant} build failed: {reason}")]
pub struct BuildFailure {
    /// Variant that failed.
    pub variant: PlatformVariant,
    /// Short description.
    pub reason: String,
    /// Toolchain exit code, when it ran to completion.
    pub exit_code: Option<i32>,
    /// Captured toolchain output.
    pub output: String,
}

impl BuildFailure {
    fn new(variant: PlatformVariant, reason: impl Into<String>) -> Self {
        Self {
            variant,
            reason: reason.into(),
            exit_code: None,
            output: String::new(),
        }
    }
}

/// Archives a project for one [`PlatformVariant`] at a time.
pub struct XcodeBuilder<'a, R> {
    runner: &'a R,
    settings: &'a Settings,
}

impl<'a, R: CommandRunner> XcodeBuilder<'a, R> {
    /// Creates a builder running the toolchain through `runner`.
    pub fn new(runner: &'a R, settings: &'a Settings) -> Self {
        Self { runner, settings }
    }

    /// Directory a variant's build writes to.
    pub fn variant_root(output_root: &Path, variant: PlatformVariant) -> PathBuf {
        output_root.join(variant.slug())
    }

    /// The archive command for `variant`.
    pub fn archive_invocation(
        &self,
        project: &Path,
        variant: PlatformVariant,
        output_root: &Path,
    ) -> Invocation {
        let scheme = self.settings.scheme_for(project);
        let variant_root = Self::variant_root(output_root, variant);

        let mut invocation = Invocation::new(self.settings.xcodebuild())
            .arg("archive")
            .arg("-project")
            .arg(project)
            .arg("-scheme")
            .arg(&scheme)
            .arg("-destination")
            .arg(variant.destination())
            .arg("-archivePath")
            .arg(variant_root.join(format!("{scheme}.xcarchive")))
            .arg("-derivedDataPath")
            .arg(variant_root.join("DerivedData"))
            .args(DISTRIBUTION_BUILD_SETTINGS);

        if let Some(dir) = project.parent() {
            invocation = invocation.current_dir(dir);
        }
        invocation
    }

    /// Builds `project` for `variant`, returning the built framework.
    ///
    /// # Errors
    ///
    /// Any failure (stale output that cannot be cleared, toolchain that cannot
    /// start, non-zero exit, archive without a framework) is a
    /// [`BuildFailure`] carrying whatever the toolchain printed.
    pub async fn build(
        &self,
        project: &Path,
        variant: PlatformVariant,
        output_root: &Path,
    ) -> Result<PathBuf, BuildFailure> {
        let variant_root = Self::variant_root(output_root, variant);
        fs::create_dir_all(&variant_root, true)
            .await
            .map_err(|e| BuildFailure::new(variant, format!("preparing build directory: {e}")))?;

        let invocation = self.archive_invocation(project, variant, output_root);
        log::info!(
            "Building {} ({}) from {}",
            variant,
            variant.role(),
            project.display()
        );

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| BuildFailure::new(variant, e.to_string()))?;

        if !output.success() {
            let reason = match output.exit_code {
                Some(code) => format!("xcodebuild exited with status {code}"),
                None => "xcodebuild was terminated by a signal".to_string(),
            };
            return Err(BuildFailure {
                variant,
                reason,
                exit_code: output.exit_code,
                output: output.combined(),
            });
        }

        let products = variant_root
            .join(format!("{}.xcarchive", self.settings.scheme_for(project)))
            .join("Products");
        let pattern = NamePattern::new("*.framework")
            .map_err(|e| BuildFailure::new(variant, e.to_string()))?;

        match discovery::probe::find(&products, &[pattern], PRODUCT_SEARCH_DEPTH) {
            Some(framework) => {
                log::info!("✓ Built {} framework: {}", variant, framework.display());
                Ok(framework)
            }
            None => Err(BuildFailure {
                variant,
                reason: format!("archive has no framework under {}", products.display()),
                exit_code: output.exit_code,
                output: output.combined(),
            }),
        }
    }
}
