//! Builder for constructing Settings.

use super::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_HEADER_DIRS, SearchDepths, Settings};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Builder for constructing [`Settings`].
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
///     .scheme("Sdk-macOS")
///     .header_dirs(vec!["include".into()])
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct SettingsBuilder {
    sdk_name: String,
    submodule_root: Option<PathBuf>,
    output_path: Option<PathBuf>,
    build_root: Option<PathBuf>,
    scheme: Option<String>,
    header_name: Option<String>,
    header_dirs: Option<Vec<PathBuf>>,
    depths: SearchDepths,
    xcodebuild: Option<PathBuf>,
    command_timeout: Duration,
}

impl SettingsBuilder {
    /// Creates a new settings builder for the named SDK.
    pub fn new(sdk_name: impl Into<String>) -> Self {
        Self {
            sdk_name: sdk_name.into(),
            submodule_root: None,
            output_path: None,
            build_root: None,
            scheme: None,
            header_name: None,
            header_dirs: None,
            depths: SearchDepths::default(),
            xcodebuild: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Sets the submodule root.
    ///
    /// # Required
    pub fn submodule_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.submodule_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the well-known output path of the unified bundle.
    ///
    /// # Required
    pub fn output_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the scratch directory for variant builds.
    ///
    /// # Required
    pub fn build_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.build_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets an explicit build scheme.
    ///
    /// Default: the discovered project's file stem
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Sets the public header's file name.
    ///
    /// Default: `<sdk_name>.h`
    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = Some(name.into());
        self
    }

    /// Sets the conventional header directories, relative to the submodule root.
    ///
    /// Default: [`DEFAULT_HEADER_DIRS`]
    pub fn header_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.header_dirs = Some(dirs);
        self
    }

    /// Sets the probe depths.
    pub fn depths(mut self, depths: SearchDepths) -> Self {
        self.depths = depths;
        self
    }

    /// Sets the toolchain program.
    ///
    /// Default: `xcodebuild`, resolved through `PATH` at invocation time
    pub fn xcodebuild<P: AsRef<Path>>(mut self, program: P) -> Self {
        self.xcodebuild = Some(program.as_ref().to_path_buf());
        self
    }

    /// Sets the per-invocation timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a required path is missing, the SDK name is empty,
    /// or a path cannot be made absolute.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::{Context, ErrorExt};

        if self.sdk_name.trim().is_empty() {
            crate::bail!("sdk name must not be empty");
        }

        let absolute = |path: PathBuf| -> crate::bundler::Result<PathBuf> {
            Ok(path
                .absolutize()
                .fs_context("resolving absolute path", &path)?
                .into_owned())
        };

        let submodule_root = absolute(self.submodule_root.context("submodule_root is required")?)?;
        let output_path = absolute(self.output_path.context("output_path is required")?)?;
        let build_root = absolute(self.build_root.context("build_root is required")?)?;

        for (label, path) in [("output path", &output_path), ("build root", &build_root)] {
            if path.starts_with(&submodule_root) {
                crate::bail!(
                    "{} {} must not live inside the submodule root {}",
                    label,
                    path.display(),
                    submodule_root.display()
                );
            }
        }

        let header_name = self
            .header_name
            .unwrap_or_else(|| format!("{}.h", self.sdk_name));
        let header_dirs = self
            .header_dirs
            .unwrap_or_else(|| DEFAULT_HEADER_DIRS.iter().map(PathBuf::from).collect());

        Ok(Settings::new(
            self.sdk_name,
            submodule_root,
            output_path,
            build_root,
            self.scheme,
            header_name,
            header_dirs,
            self.depths,
            self.xcodebuild.unwrap_or_else(|| PathBuf::from("xcodebuild")),
            self.command_timeout,
        ))
    }
}
