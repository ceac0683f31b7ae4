//! Progress reporting for pipeline phases.
//!
//! The CLI hands the pipeline an `IndicatifReporter`; library callers and
//! tests use `NoopReporter`.

use indicatif::{ProgressBar, ProgressStyle};

/// Trait for reporting progress of the three pipeline phases.
pub trait ProgressReporter: Send + Sync {
    /// Begin a phase over a known number of candidate nodes.
    fn begin_phase(&self, phase: &str, total: u64);

    /// One candidate node handled (processed or skipped).
    fn advance(&self);

    /// Mark the current phase as finished.
    fn finish_phase(&self);
}

/// No-op reporter for library callers that don't need progress output.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn begin_phase(&self, _phase: &str, _total: u64) {}
    fn advance(&self) {}
    fn finish_phase(&self) {}
}

/// Reporter backed by `indicatif` progress bars for CLI use.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn begin_phase(&self, phase: &str, total: u64) {
        self.bar.set_length(total);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        );
        self.bar.set_message(phase.to_string());
        self.bar.reset();
    }

    fn advance(&self) {
        self.bar.inc(1);
    }

    fn finish_phase(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reporter_is_silent() {
        let reporter = NoopReporter;
        reporter.begin_phase("methods", 10);
        reporter.advance();
        reporter.finish_phase();
    }

    #[test]
    fn indicatif_reporter_lifecycle() {
        let reporter = IndicatifReporter::new();
        reporter.begin_phase("files", 2);
        reporter.advance();
        reporter.advance();
        reporter.finish_phase();
    }
}
