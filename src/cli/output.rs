//! Run summary output.
//!
//! Success goes to stdout. In text mode the exhaustion report goes to
//! stderr; in JSON mode every outcome is one document on stdout.

use super::args::OutputFormat;
use crate::bundler::{DiagnosticReport, PackagedBundle, PipelineOutcome};
use serde_json::json;
use std::fmt::Write as _;
use std::io::{self, Write};

/// Writes run outcomes in the selected format.
#[derive(Clone, Copy, Debug)]
pub struct OutputManager {
    format: OutputFormat,
}

impl OutputManager {
    /// Create new output manager
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints the outcome to stdout or stderr.
    pub fn outcome(&self, outcome: &PipelineOutcome) -> crate::error::Result<()> {
        let rendered = self.render(outcome)?;
        match (self.format, outcome) {
            (OutputFormat::Text, PipelineOutcome::Exhausted(_)) => {
                io::stderr().lock().write_all(rendered.as_bytes())?
            }
            _ => io::stdout().lock().write_all(rendered.as_bytes())?,
        }
        Ok(())
    }

    /// Renders the outcome without printing it.
    pub fn render(&self, outcome: &PipelineOutcome) -> crate::error::Result<String> {
        match self.format {
            OutputFormat::Text => Ok(match outcome {
                PipelineOutcome::Done(packaged) => summary_text(packaged),
                PipelineOutcome::Exhausted(report) => report.to_string(),
            }),
            OutputFormat::Json => {
                let document = match outcome {
                    PipelineOutcome::Done(packaged) => done_json(packaged),
                    PipelineOutcome::Exhausted(report) => exhausted_json(report),
                };
                let mut text = serde_json::to_string_pretty(&document)?;
                text.push('\n');
                Ok(text)
            }
        }
    }
}

fn summary_text(packaged: &PackagedBundle) -> String {
    let strategy = packaged
        .produced_by
        .map(|s| s.to_string())
        .unwrap_or_else(|| "already present".to_string());

    let mut text = String::new();
    let _ = writeln!(text, "✓ {}", packaged.bundle.path.display());
    let _ = writeln!(text, "  strategy: {strategy}");
    let _ = writeln!(text, "  slices:   {}", packaged.bundle.slices.join(", "));
    if !packaged.skipped_variants.is_empty() {
        let skipped: Vec<String> = packaged
            .skipped_variants
            .iter()
            .map(ToString::to_string)
            .collect();
        let _ = writeln!(text, "  skipped:  {}", skipped.join(", "));
    }
    let _ = writeln!(text, "  sha256:   {}", packaged.checksum);
    text
}

fn done_json(packaged: &PackagedBundle) -> serde_json::Value {
    json!({
        "status": "done",
        "path": packaged.bundle.path,
        "strategy": packaged.produced_by,
        "slices": packaged.bundle.slices,
        "skipped_variants": packaged.skipped_variants,
        "sha256": packaged.checksum,
    })
}

fn exhausted_json(report: &DiagnosticReport) -> serde_json::Value {
    json!({
        "status": "exhausted",
        "report": report,
    })
}
