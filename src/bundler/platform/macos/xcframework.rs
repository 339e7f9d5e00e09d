//! Assembling the unified `.xcframework` with `xcodebuild -create-xcframework`.
//!
//! Every mode writes to the settings' output path. The caller clears that
//! path first; on failure any partial output is removed again so a malformed
//! bundle never stays at the well-known location.

use crate::bundler::{
    discovery::{HeaderDirectory, is_linkable_binary},
    settings::Settings,
    utils::{
        fs,
        process::{CommandRunner, Invocation},
    },
};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Which wrapping mode was used.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    /// One or more frameworks built from source.
    BuiltVariants,
    /// A single prebuilt framework, as-is.
    SingleBundle,
    /// A raw library plus its header directory.
    LibraryAndHeaders,
}

impl fmt::Display for WrapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BuiltVariants => "built variants",
            Self::SingleBundle => "single framework",
            Self::LibraryAndHeaders => "library and headers",
        })
    }
}

/// The merge tool rejected its inputs or produced nothing usable.
#[derive(Clone, Debug, thiserror::Error)]
#[error("wrapping {mode} failed: {reason}")]
pub struct WrapFailure {
    /// Mode that failed.
    pub mode: WrapMode,
    /// Short description.
    pub reason: String,
    /// Captured merge-tool output, when it ran.
    pub output: Option<String>,
}

impl WrapFailure {
    fn new(mode: WrapMode, reason: impl Into<String>) -> Self {
        Self {
            mode,
            reason: reason.into(),
            output: None,
        }
    }
}

/// A well-formed `.xcframework` at the output path.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct UnifiedBundle {
    /// Location of the bundle.
    pub path: PathBuf,
    /// Slice directory names (library identifiers), sorted.
    pub slices: Vec<String>,
}

impl UnifiedBundle {
    /// Inspects `path`, returning the bundle only if it is well-formed:
    /// a directory with an `Info.plist` and at least one slice directory.
    pub fn inspect(path: &Path) -> Option<Self> {
        if !path.is_dir() || !path.join("Info.plist").is_file() {
            return None;
        }

        let mut slices: Vec<String> = std::fs::read_dir(path)
            .ok()?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with('_') && !name.starts_with('.'))
            .collect();

        if slices.is_empty() {
            return None;
        }
        slices.sort();

        Some(Self {
            path: path.to_path_buf(),
            slices,
        })
    }
}

/// Produces the unified bundle from already-built inputs.
pub struct XcframeworkWrapper<'a, R> {
    runner: &'a R,
    settings: &'a Settings,
}

impl<'a, R: CommandRunner> XcframeworkWrapper<'a, R> {
    /// Creates a wrapper running the merge tool through `runner`.
    pub fn new(runner: &'a R, settings: &'a Settings) -> Self {
        Self { runner, settings }
    }

    /// Merges one framework per built variant.
    pub async fn from_built_variants(
        &self,
        frameworks: &[PathBuf],
    ) -> Result<UnifiedBundle, WrapFailure> {
        if frameworks.is_empty() {
            return Err(WrapFailure::new(
                WrapMode::BuiltVariants,
                "no built frameworks to merge",
            ));
        }

        let mut inputs = Vec::with_capacity(frameworks.len() * 2);
        for framework in frameworks {
            inputs.push(OsString::from("-framework"));
            inputs.push(framework.clone().into_os_string());
        }
        self.create(WrapMode::BuiltVariants, inputs).await
    }

    /// Wraps one prebuilt framework as a single-slice bundle.
    pub async fn from_single_bundle(&self, framework: &Path) -> Result<UnifiedBundle, WrapFailure> {
        let inputs = vec![OsString::from("-framework"), framework.as_os_str().to_owned()];
        self.create(WrapMode::SingleBundle, inputs).await
    }

    /// Synthesizes a bundle from a raw library and its headers.
    pub async fn from_library_and_headers(
        &self,
        library: &Path,
        headers: &HeaderDirectory,
    ) -> Result<UnifiedBundle, WrapFailure> {
        if !is_linkable_binary(library) {
            return Err(WrapFailure::new(
                WrapMode::LibraryAndHeaders,
                format!(
                    "{} is neither a Mach-O image nor a static archive",
                    library.display()
                ),
            ));
        }
        if !headers.header().is_file() {
            return Err(WrapFailure::new(
                WrapMode::LibraryAndHeaders,
                format!("header {} is missing", headers.header().display()),
            ));
        }

        let inputs = vec![
            OsString::from("-library"),
            library.as_os_str().to_owned(),
            OsString::from("-headers"),
            headers.path().as_os_str().to_owned(),
        ];
        self.create(WrapMode::LibraryAndHeaders, inputs).await
    }

    /// The merge command for `inputs`.
    pub fn create_invocation(&self, inputs: Vec<OsString>) -> Invocation {
        Invocation::new(self.settings.xcodebuild())
            .arg("-create-xcframework")
            .args(inputs)
            .arg("-output")
            .arg(self.settings.output_path())
    }

    async fn create(
        &self,
        mode: WrapMode,
        inputs: Vec<OsString>,
    ) -> Result<UnifiedBundle, WrapFailure> {
        let output_path = self.settings.output_path();
        fs::ensure_parent(output_path)
            .await
            .map_err(|e| WrapFailure::new(mode, e.to_string()))?;

        let invocation = self.create_invocation(inputs);
        log::info!("Creating xcframework from {}", mode);

        let result = match self.runner.run(&invocation).await {
            Err(e) => Err(WrapFailure::new(mode, e.to_string())),
            Ok(output) if !output.success() => Err(WrapFailure {
                mode,
                reason: match output.exit_code {
                    Some(code) => format!("xcodebuild -create-xcframework exited with status {code}"),
                    None => "xcodebuild -create-xcframework was terminated by a signal".to_string(),
                },
                output: Some(output.combined()),
            }),
            Ok(output) => UnifiedBundle::inspect(output_path).ok_or_else(|| WrapFailure {
                mode,
                reason: format!(
                    "{} is not a well-formed xcframework after merging",
                    output_path.display()
                ),
                output: Some(output.combined()),
            }),
        };

        if result.is_err() {
            if let Err(e) = fs::remove_path(output_path).await {
                log::warn!("Could not remove partial output: {}", e);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::SettingsBuilder;
    use crate::bundler::discovery::{HeaderResolver, SearchLog};
    use crate::bundler::utils::process::fake::{FakeRunner, exit};

    fn settings(root: &Path) -> Settings {
        SettingsBuilder::new("Sdk")
            .submodule_root(root.join("vendor/Sdk"))
            .output_path(root.join("Frameworks/Sdk.xcframework"))
            .build_root(root.join("build"))
            .build()
            .unwrap()
    }

    fn write_bundle(output: &Path, slices: &[&str]) {
        for slice in slices {
            std::fs::create_dir_all(output.join(slice)).unwrap();
        }
        std::fs::write(output.join("Info.plist"), b"<plist/>").unwrap();
    }

    #[test]
    fn inspect_requires_plist_and_a_slice() {
        let temp = tempfile::tempdir().unwrap();
        let out = temp.path().join("Sdk.xcframework");
        assert!(UnifiedBundle::inspect(&out).is_none());

        std::fs::create_dir_all(out.join("_CodeSignature")).unwrap();
        std::fs::write(out.join("Info.plist"), b"<plist/>").unwrap();
        assert!(UnifiedBundle::inspect(&out).is_none());

        std::fs::create_dir_all(out.join("macos-arm64_x86_64")).unwrap();
        std::fs::create_dir_all(out.join("ios-arm64_x86_64-maccatalyst")).unwrap();
        let bundle = UnifiedBundle::inspect(&out).unwrap();
        assert_eq!(
            bundle.slices,
            vec!["ios-arm64_x86_64-maccatalyst", "macos-arm64_x86_64"]
        );
    }

    #[tokio::test]
    async fn merges_every_built_framework() {
        let temp = tempfile::tempdir().unwrap();
        let settings = settings(temp.path());
        let runner = FakeRunner::new(|inv| {
            write_bundle(
                Path::new(inv.value_of("-output").unwrap()),
                &["macos-arm64_x86_64", "ios-arm64_x86_64-maccatalyst"],
            );
            Ok(exit(0, ""))
        });
        let wrapper = XcframeworkWrapper::new(&runner, &settings);

        let frameworks = vec![
            temp.path().join("build/macos/Sdk.framework"),
            temp.path().join("build/maccatalyst/Sdk.framework"),
        ];
        let bundle = wrapper.from_built_variants(&frameworks).await.unwrap();

        assert_eq!(bundle.slices.len(), 2);
        let call = &runner.calls()[0];
        assert_eq!(call.args[0], "-create-xcframework");
        assert_eq!(call.args.iter().filter(|a| *a == "-framework").count(), 2);
    }

    #[tokio::test]
    async fn empty_variant_set_is_rejected_without_running_tool() {
        let temp = tempfile::tempdir().unwrap();
        let settings = settings(temp.path());
        let runner = FakeRunner::new(|_| Ok(exit(0, "")));
        let wrapper = XcframeworkWrapper::new(&runner, &settings);

        let failure = wrapper.from_built_variants(&[]).await.unwrap_err();
        assert_eq!(failure.mode, WrapMode::BuiltVariants);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn rejected_merge_leaves_no_output() {
        let temp = tempfile::tempdir().unwrap();
        let settings = settings(temp.path());
        let runner = FakeRunner::new(|inv| {
            // Half-written output before the tool gives up.
            std::fs::create_dir_all(Path::new(inv.value_of("-output").unwrap()))?;
            Ok(exit(1, "error: binaries with multiple platforms are not supported"))
        });
        let wrapper = XcframeworkWrapper::new(&runner, &settings);

        let failure = wrapper
            .from_single_bundle(&temp.path().join("vendor/Sdk/Sdk.framework"))
            .await
            .unwrap_err();

        assert!(failure.output.unwrap().contains("multiple platforms"));
        assert!(!settings.output_path().exists());
    }

    #[tokio::test]
    async fn malformed_success_is_a_failure() {
        let temp = tempfile::tempdir().unwrap();
        let settings = settings(temp.path());
        let runner = FakeRunner::new(|inv| {
            std::fs::create_dir_all(Path::new(inv.value_of("-output").unwrap()))?;
            Ok(exit(0, ""))
        });
        let wrapper = XcframeworkWrapper::new(&runner, &settings);

        let failure = wrapper
            .from_single_bundle(&temp.path().join("vendor/Sdk/Sdk.framework"))
            .await
            .unwrap_err();
        assert!(failure.reason.contains("not a well-formed"));
        assert!(!settings.output_path().exists());
    }

    #[tokio::test]
    async fn library_mode_passes_header_directory() {
        let temp = tempfile::tempdir().unwrap();
        let settings = settings(temp.path());
        let root = temp.path().join("vendor/Sdk");
        std::fs::create_dir_all(root.join("include")).unwrap();
        std::fs::write(root.join("include/Sdk.h"), b"#pragma once\n").unwrap();
        std::fs::write(root.join("libSdk.a"), b"!<arch>\n________").unwrap();

        let dirs = vec![PathBuf::from("include")];
        let headers = HeaderResolver::new("Sdk.h", &dirs, 5)
            .resolve(&root, &mut SearchLog::new())
            .unwrap()
            .unwrap();

        let runner = FakeRunner::new(|inv| {
            write_bundle(Path::new(inv.value_of("-output").unwrap()), &["macos-arm64"]);
            Ok(exit(0, ""))
        });
        let wrapper = XcframeworkWrapper::new(&runner, &settings);
        wrapper
            .from_library_and_headers(&root.join("libSdk.a"), &headers)
            .await
            .unwrap();

        let call = &runner.calls()[0];
        assert_eq!(Path::new(call.value_of("-headers").unwrap()), root.join("include"));
        assert_eq!(Path::new(call.value_of("-library").unwrap()), root.join("libSdk.a"));
    }

    #[tokio::test]
    async fn unrecognised_library_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let settings = settings(temp.path());
        let root = temp.path().join("vendor/Sdk");
        std::fs::create_dir_all(root.join("include")).unwrap();
        std::fs::write(root.join("include/Sdk.h"), b"#pragma once\n").unwrap();
        std::fs::write(root.join("libSdk.a"), b"placeholder text file").unwrap();

        let dirs = vec![PathBuf::from("include")];
        let headers = HeaderResolver::new("Sdk.h", &dirs, 5)
            .resolve(&root, &mut SearchLog::new())
            .unwrap()
            .unwrap();

        let runner = FakeRunner::new(|_| Ok(exit(0, "")));
        let wrapper = XcframeworkWrapper::new(&runner, &settings);
        let failure = wrapper
            .from_library_and_headers(&root.join("libSdk.a"), &headers)
            .await
            .unwrap_err();

        assert_eq!(failure.mode, WrapMode::LibraryAndHeaders);
        assert!(runner.calls().is_empty());
    }
}
