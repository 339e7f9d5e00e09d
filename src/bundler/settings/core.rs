//! Core Settings struct and implementations.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Conventional header directories tried when a bounded search misses,
/// relative to the submodule root.
pub const DEFAULT_HEADER_DIRS: [&str; 3] = ["sdk", "include", "sdk/macos"];

/// Default timeout applied to every toolchain invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(1800);

/// Maximum directory depths used by each probe.
///
/// Depth is counted from the searched root: its direct children are at
/// depth 1.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SearchDepths {
    /// Search for a buildable `*.xcodeproj`.
    pub project: usize,
    /// Search for a prebuilt `*.framework`.
    pub prebuilt_bundle: usize,
    /// Search for a raw `*.a` / `*.dylib`.
    pub library: usize,
    /// Search for the public header.
    pub header: usize,
    /// Depth of the tree listing printed on failure.
    pub listing: usize,
}

impl Default for SearchDepths {
    fn default() -> Self {
        Self {
            project: 3,
            prebuilt_bundle: 4,
            library: 4,
            header: 5,
            listing: 3,
        }
    }
}

/// Main settings for a packaging run.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder). All paths are
/// absolute once built.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_xcframework::bundler::SettingsBuilder;
///
/// # fn example() -> kodegen_bundler_xcframework::bundler::Result<()> {
/// let settings = SettingsBuilder::new("Sdk")
///     .submodule_root("vendor/Sdk")
///     .output_path("Frameworks/Sdk.xcframework")
///     .build_root("build/Sdk")
///     .build()?;
/// assert_eq!(settings.header_name(), "Sdk.h");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Settings {
    /// Name of the SDK being packaged.
    sdk_name: String,

    /// Root of the vendored submodule. Read-only.
    submodule_root: PathBuf,

    /// Well-known location of the unified `.xcframework`.
    output_path: PathBuf,

    /// Scratch directory for archives and derived data.
    build_root: PathBuf,

    /// Explicit scheme; falls back to the project's file stem.
    scheme: Option<String>,

    /// File name of the SDK's public header.
    header_name: String,

    /// Conventional header directories, relative to the submodule root.
    header_dirs: Vec<PathBuf>,

    depths: SearchDepths,

    /// Program used for both archiving and `-create-xcframework`.
    xcodebuild: PathBuf,

    command_timeout: Duration,
}

impl Settings {
    /// Returns the SDK name.
    pub fn sdk_name(&self) -> &str {
        &self.sdk_name
    }

    /// Returns the submodule root.
    pub fn submodule_root(&self) -> &Path {
        &self.submodule_root
    }

    /// Returns the well-known output path of the unified bundle.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Returns the directory that per-variant builds write under.
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Returns the scheme to build for `project`.
    ///
    /// Uses the configured scheme if any, otherwise the project's file stem
    /// (`Foo.xcodeproj` builds scheme `Foo`).
    pub fn scheme_for(&self, project: &Path) -> String {
        if let Some(scheme) = &self.scheme {
            return scheme.clone();
        }
        project
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.sdk_name.clone())
    }

    /// Returns the public header's file name.
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// Returns the conventional header directories, relative to the submodule root.
    pub fn header_dirs(&self) -> &[PathBuf] {
        &self.header_dirs
    }

    /// Returns the probe depths.
    pub fn depths(&self) -> SearchDepths {
        self.depths
    }

    /// Returns the toolchain program.
    pub fn xcodebuild(&self) -> &Path {
        &self.xcodebuild
    }

    /// Returns the per-invocation timeout.
    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        sdk_name: String,
        submodule_root: PathBuf,
        output_path: PathBuf,
        build_root: PathBuf,
        scheme: Option<String>,
        header_name: String,
        header_dirs: Vec<PathBuf>,
        depths: SearchDepths,
        xcodebuild: PathBuf,
        command_timeout: Duration,
    ) -> Self {
        Self {
            sdk_name,
            submodule_root,
            output_path,
            build_root,
            scheme,
            header_name,
            header_dirs,
            depths,
            xcodebuild,
            command_timeout,
        }
    }
}
