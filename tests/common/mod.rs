//! Shared helpers for integration tests.
//!
//! [`ScriptedRunner`] stands in for `xcodebuild`: archive calls create the
//! framework inside the archive, merge calls write a bundle with one slice
//! per input. Failures are scripted per variant or for the merge step.

#![allow(dead_code)]

use kodegen_bundler_xcframework::bundler::{
    CommandRunner, Invocation, PlatformVariant, ProcessOutput, Result, Settings, SettingsBuilder,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Scripted toolchain double. Clones share the call log.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    calls: Arc<Mutex<Vec<Invocation>>>,
    failing_variants: Vec<PlatformVariant>,
    merge_fails: bool,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive builds for `variant` exit non-zero.
    pub fn failing(mut self, variant: PlatformVariant) -> Self {
        self.failing_variants.push(variant);
        self
    }

    /// `-create-xcframework` leaves partial output and exits non-zero.
    pub fn failing_merge(mut self) -> Self {
        self.merge_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn archive_calls(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| call.args.first().is_some_and(|a| a == "archive"))
            .collect()
    }

    pub fn merge_calls(&self) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| call.has_arg("-create-xcframework"))
            .collect()
    }

    fn archive(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput> {
        let destination = invocation.value_of("-destination").unwrap_or_default();
        let variant = PlatformVariant::ALL
            .into_iter()
            .find(|v| destination == v.destination())
            .expect("archive call carries a known destination");

        if self.failing_variants.contains(&variant) {
            return Ok(exit(
                65,
                &format!("error: unable to build for {variant}\n** ARCHIVE FAILED **"),
            ));
        }

        let archive = PathBuf::from(invocation.value_of("-archivePath").unwrap_or_default());
        let scheme = invocation
            .value_of("-scheme")
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let framework = archive
            .join("Products/Library/Frameworks")
            .join(format!("{scheme}.framework"));
        std::fs::create_dir_all(&framework)?;
        std::fs::write(framework.join(&scheme), b"\xcf\xfa\xed\xfe")?;
        Ok(exit(0, "** ARCHIVE SUCCEEDED **"))
    }

    fn merge(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput> {
        let output = PathBuf::from(invocation.value_of("-output").unwrap_or_default());
        assert!(
            !output.exists(),
            "output must be cleared before the merge tool runs"
        );
        std::fs::create_dir_all(&output)?;
        std::fs::write(output.join("Info.plist"), b"<plist/>")?;

        if self.merge_fails {
            return Ok(exit(70, "error: binaries with multiple platforms are not supported"));
        }

        let mut inputs = invocation.args.iter();
        while let Some(arg) = inputs.next() {
            if arg != "-framework" && arg != "-library" {
                continue;
            }
            let input = inputs.next().map(PathBuf::from).unwrap_or_default();
            let slice = if input.to_string_lossy().contains("maccatalyst") {
                "ios-arm64_x86_64-maccatalyst"
            } else {
                "macos-arm64_x86_64"
            };
            std::fs::create_dir_all(output.join(slice))?;
        }
        Ok(exit(0, &format!("xcframework successfully written out to: {}", output.display())))
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        let output = if invocation.has_arg("-create-xcframework") {
            self.merge(invocation)?
        } else {
            self.archive(invocation)?
        };
        Ok(output)
    }
}

pub fn exit(code: i32, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        exit_code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Settings rooted in `root`, with `root/vendor/Sdk` as the submodule.
pub fn settings(root: &Path) -> Settings {
    SettingsBuilder::new("Sdk")
        .submodule_root(root.join("vendor/Sdk"))
        .output_path(root.join("Frameworks/Sdk.xcframework"))
        .build_root(root.join("build/Sdk"))
        .xcodebuild("/nonexistent/xcodebuild")
        .build()
        .unwrap()
}

pub fn submodule(root: &Path) -> PathBuf {
    let dir = root.join("vendor/Sdk");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn touch(path: &Path, contents: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// A well-formed bundle written by hand.
pub fn write_bundle(path: &Path, slices: &[&str]) {
    touch(&path.join("Info.plist"), b"<plist/>");
    for slice in slices {
        std::fs::create_dir_all(path.join(slice)).unwrap();
    }
}
