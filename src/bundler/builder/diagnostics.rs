//! Failure report for an exhausted run.
//!
//! Building the report has no side effects beyond reading the submodule
//! tree for the listing. Identical inputs render identical text.

use super::orchestrator::{AttemptOutcome, StrategyAttempt};
use crate::bundler::discovery::SearchRecord;
use crate::bundler::utils::process::tail_lines;
use std::fmt;
use std::path::{Path, PathBuf};

/// Lines of toolchain output kept per failure.
pub const OUTPUT_TAIL_LINES: usize = 20;

/// Entries listed before the tree listing is cut short.
const MAX_LISTING_ENTRIES: usize = 200;

/// One strategy's line in the report.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct AttemptSummary {
    /// Strategy name.
    pub strategy: String,
    /// Outcome, e.g. `skipped: no raw library found under ...`.
    pub outcome: String,
}

/// Supporting evidence from a failed toolchain or merge-tool run.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct ToolFailure {
    /// What failed (`macos build`, `wrapping single framework`).
    pub subject: String,
    /// Why.
    pub reason: String,
    /// Tail of the captured output.
    pub output_tail: String,
}

/// Structured report produced when no strategy yields a bundle.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct DiagnosticReport {
    /// Submodule root that was searched.
    pub submodule_root: PathBuf,
    /// Every strategy, in priority order.
    pub attempts: Vec<AttemptSummary>,
    /// Every probe made, in order.
    pub searches: Vec<SearchRecord>,
    /// Name of the public header looked for.
    pub header_name: String,
    /// Where the header was found, if anywhere.
    pub header: Option<PathBuf>,
    /// Toolchain program, as resolved on this machine.
    pub toolchain: Option<PathBuf>,
    /// Build and merge failures, with output tails.
    pub tool_failures: Vec<ToolFailure>,
    /// Sorted, indented listing of the submodule root.
    pub listing: Vec<String>,
}

/// Inputs to [`report`] beyond the required three.
#[derive(Clone, Copy, Debug)]
pub struct ReportContext<'a> {
    /// Every probe made during the run.
    pub searches: &'a [SearchRecord],
    /// Public header file name.
    pub header_name: &'a str,
    /// Resolved toolchain program.
    pub toolchain: Option<&'a Path>,
    /// Depth of the tree listing.
    pub listing_depth: usize,
}

/// Builds the exhaustion report.
pub fn report(
    search_root: &Path,
    attempts: &[StrategyAttempt],
    found_header: Option<&Path>,
    context: ReportContext<'_>,
) -> DiagnosticReport {
    let mut tool_failures = Vec::new();
    for attempt in attempts {
        for failure in &attempt.build_failures {
            tool_failures.push(ToolFailure {
                subject: format!("{} build", failure.variant),
                reason: failure.reason.clone(),
                output_tail: tail_lines(&failure.output, OUTPUT_TAIL_LINES),
            });
        }
        if let AttemptOutcome::WrapFailed(failure) = &attempt.outcome {
            tool_failures.push(ToolFailure {
                subject: format!("wrapping {}", failure.mode),
                reason: failure.reason.clone(),
                output_tail: failure
                    .output
                    .as_deref()
                    .map(|out| tail_lines(out, OUTPUT_TAIL_LINES))
                    .unwrap_or_default(),
            });
        }
    }

    DiagnosticReport {
        submodule_root: search_root.to_path_buf(),
        attempts: attempts
            .iter()
            .map(|attempt| AttemptSummary {
                strategy: attempt.strategy.to_string(),
                outcome: attempt.outcome.to_string(),
            })
            .collect(),
        searches: context.searches.to_vec(),
        header_name: context.header_name.to_string(),
        header: found_header.map(Path::to_path_buf),
        toolchain: context.toolchain.map(Path::to_path_buf),
        tool_failures,
        listing: list_tree(search_root, context.listing_depth),
    }
}

/// Indented listing of `root`, directories suffixed with `/`.
fn list_tree(root: &Path, max_depth: usize) -> Vec<String> {
    if !root.is_dir() {
        return vec!["(submodule root does not exist or is not a directory)".to_string()];
    }

    let entries: Vec<_> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .collect();

    if entries.is_empty() {
        return vec!["(empty)".to_string()];
    }

    let mut lines: Vec<String> = entries
        .iter()
        .take(MAX_LISTING_ENTRIES)
        .map(|entry| {
            let indent = "  ".repeat(entry.depth() - 1);
            let suffix = if entry.file_type().is_dir() { "/" } else { "" };
            format!("{indent}{}{suffix}", entry.file_name().to_string_lossy())
        })
        .collect();
    if entries.len() > MAX_LISTING_ENTRIES {
        lines.push(format!(
            "... {} more entries",
            entries.len() - MAX_LISTING_ENTRIES
        ));
    }
    lines
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "xcframework packaging failed: no strategy produced a bundle")?;
        writeln!(f, "submodule root: {}", self.submodule_root.display())?;

        writeln!(f, "\nstrategies (in priority order):")?;
        for (i, attempt) in self.attempts.iter().enumerate() {
            writeln!(f, "  {}. {}: {}", i + 1, attempt.strategy, attempt.outcome)?;
        }

        writeln!(f, "\nsearched:")?;
        for search in &self.searches {
            let found = match &search.found {
                Some(path) => path.display().to_string(),
                None => "nothing".to_string(),
            };
            writeln!(
                f,
                "  {} [{}] under {} (depth {}): {}",
                search.target,
                search.patterns.join(", "),
                search.root.display(),
                search.max_depth,
                found
            )?;
        }

        match &self.header {
            Some(path) => writeln!(f, "\npublic header {}: found at {}", self.header_name, path.display())?,
            None => writeln!(f, "\npublic header {}: never located", self.header_name)?,
        }

        match &self.toolchain {
            Some(path) => writeln!(f, "toolchain: {}", path.display())?,
            None => writeln!(f, "toolchain: xcodebuild not found on PATH")?,
        }

        if !self.tool_failures.is_empty() {
            writeln!(f, "\ntool output:")?;
            for failure in &self.tool_failures {
                writeln!(f, "  {}: {}", failure.subject, failure.reason)?;
                for line in failure.output_tail.lines() {
                    writeln!(f, "    | {line}")?;
                }
            }
        }

        writeln!(f, "\nsubmodule contents:")?;
        for line in &self.listing {
            writeln!(f, "  {line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::builder::orchestrator::Strategy;
    use crate::bundler::discovery::DiscoveryMiss;
    use crate::bundler::platform::macos::xcodebuild::BuildFailure;
    use crate::bundler::settings::PlatformVariant;

    fn context<'a>(searches: &'a [SearchRecord]) -> ReportContext<'a> {
        ReportContext {
            searches,
            header_name: "Sdk.h",
            toolchain: None,
            listing_depth: 3,
        }
    }

    #[test]
    fn lists_strategies_and_missing_header() {
        let temp = tempfile::tempdir().unwrap();
        let attempts = vec![
            StrategyAttempt::skipped(
                Strategy::BuildFromSource,
                vec![DiscoveryMiss::new("buildable project", temp.path())],
            ),
            StrategyAttempt::skipped(
                Strategy::WrapPrebuiltBundle,
                vec![DiscoveryMiss::new("prebuilt framework", temp.path())],
            ),
            StrategyAttempt::skipped(
                Strategy::WrapRawLibrary,
                vec![
                    DiscoveryMiss::new("raw library", temp.path()),
                    DiscoveryMiss::new("public header Sdk.h", temp.path()),
                ],
            ),
        ];

        let text = report(temp.path(), &attempts, None, context(&[])).to_string();
        assert!(text.contains("1. build from source: skipped"));
        assert!(text.contains("2. wrap prebuilt framework: skipped"));
        assert!(text.contains("3. wrap raw library: skipped"));
        assert!(text.contains("public header Sdk.h: never located"));
        assert!(text.contains("(empty)"));
    }

    #[test]
    fn listing_is_sorted_bounded_and_stable() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("b/c/d/e")).unwrap();
        std::fs::write(temp.path().join("a.txt"), b"").unwrap();
        std::fs::write(temp.path().join("b/z.h"), b"").unwrap();

        let first = report(temp.path(), &[], None, context(&[]));
        let second = report(temp.path(), &[], None, context(&[]));
        assert_eq!(first, second);
        assert_eq!(first.listing, vec!["a.txt", "b/", "  c/", "    d/", "  z.h"]);
    }

    #[test]
    fn build_output_is_included_as_evidence() {
        let temp = tempfile::tempdir().unwrap();
        let noisy: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        let attempts = vec![StrategyAttempt {
            strategy: Strategy::BuildFromSource,
            outcome: AttemptOutcome::NoVariantBuilt,
            build_failures: vec![BuildFailure {
                variant: PlatformVariant::MacCatalyst,
                reason: "xcodebuild exited with status 65".into(),
                exit_code: Some(65),
                output: noisy,
            }],
        }];

        let report = report(temp.path(), &attempts, None, context(&[]));
        assert_eq!(report.tool_failures.len(), 1);
        assert!(report.tool_failures[0].output_tail.starts_with("line 11"));

        let text = report.to_string();
        assert!(text.contains("maccatalyst build: xcodebuild exited with status 65"));
        assert!(text.contains("    | line 30"));
        assert!(!text.contains("    | line 10\n"));
    }
}
