//! Terminal output for batch runs.

use crate::batch::{BatchSummary, FileOutcome, FileReport, SkipReason};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;

/// Receives batch events as they happen.
///
/// Every method has an empty default so observers only implement what they
/// display.
pub trait BatchObserver {
    /// Conversion is about to start for `queued` files.
    fn batch_started(&mut self, _queued: usize) {}

    /// File number `position` (0-based, among queued files) started.
    fn file_started(&mut self, _position: usize, _input: &Path) {}

    /// Progress of the current file, `0.0..=100.0`.
    fn file_progress(&mut self, _percent: f64) {}

    fn file_finished(&mut self, _report: &FileReport) {}

    /// A file was skipped before reaching the converter.
    fn file_skipped(&mut self, _report: &FileReport) {}

    fn batch_finished(&mut self, _summary: &BatchSummary) {}
}

/// Batch progress across all queued files.
pub fn overall_percent(finished: usize, file_percent: f64, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let pct = (finished as f64 + file_percent.clamp(0.0, 100.0) / 100.0) / total as f64 * 100.0;
    pct.min(100.0)
}

/// The closing line of every run.
///
/// Counts only files with a supported extension; anything else found while
/// walking a directory is mentioned once at the end.
pub fn summary_line(summary: &BatchSummary) -> String {
    let ignored = summary.total - summary.candidates();
    let skipped = summary.skipped - ignored;

    let mut line = if summary.planned > 0 {
        format!(
            "Dry run: {} file(s) planned, {} skipped",
            summary.planned, skipped
        )
    } else {
        let mut line = format!(
            "Done! {}/{} files converted",
            summary.converted,
            summary.candidates()
        );
        if skipped > 0 || summary.failed > 0 {
            line.push_str(&format!(" ({} skipped, {} failed)", skipped, summary.failed));
        }
        line
    };
    if ignored > 0 {
        line.push_str(&format!("; {} unsupported file(s) ignored", ignored));
    }
    line
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Progress bars on stdout: one for the batch, one for the current file.
pub struct TerminalReporter {
    multi: MultiProgress,
    overall: Option<ProgressBar>,
    current: Option<ProgressBar>,
    queued: usize,
    finished: usize,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stdout()),
            overall: None,
            current: None,
            queued: 0,
            finished: 0,
        }
    }

    fn overall_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{prefix:>8.bold} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}% {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
    }

    fn file_style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:>8} [{wide_bar:.green}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }

    fn println(&self, line: String) {
        self.multi.suspend(|| println!("{}", line));
    }

    fn set_overall(&self, file_percent: f64) {
        if let Some(ref bar) = self.overall {
            let pct = overall_percent(self.finished, file_percent, self.queued);
            bar.set_position(pct.round() as u64);
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchObserver for TerminalReporter {
    fn batch_started(&mut self, queued: usize) {
        self.queued = queued;
        self.finished = 0;
        if queued == 0 {
            return;
        }
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(Self::overall_style());
        bar.set_prefix("Overall");
        bar.set_message(format!("0/{}", queued));
        self.overall = Some(bar);
    }

    fn file_started(&mut self, position: usize, input: &Path) {
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(Self::file_style());
        bar.set_prefix(format!("{}/{}", position + 1, self.queued));
        bar.set_message(file_name(input));
        self.current = Some(bar);
    }

    fn file_progress(&mut self, percent: f64) {
        if let Some(ref bar) = self.current {
            bar.set_position(percent.clamp(0.0, 100.0).round() as u64);
        }
        self.set_overall(percent);
    }

    fn file_finished(&mut self, report: &FileReport) {
        if let Some(bar) = self.current.take() {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
        self.finished += 1;
        self.set_overall(0.0);
        if let Some(ref bar) = self.overall {
            bar.set_message(format!("{}/{}", self.finished, self.queued));
        }

        let name = report.input.display();
        match &report.outcome {
            FileOutcome::Converted { output } => {
                self.println(format!("✓ {} -> {}", name, output.display()))
            }
            FileOutcome::Planned { command } => {
                self.println(format!("{}\n  {}", name, command))
            }
            FileOutcome::Skipped(reason) => {
                self.println(format!("- {} skipped: {}", name, reason))
            }
            FileOutcome::Failed(msg) => self.println(format!("✗ {} failed: {}", name, msg)),
        }
    }

    fn file_skipped(&mut self, report: &FileReport) {
        // Unsupported files only show up in the totals.
        if let FileOutcome::Skipped(ref reason) = report.outcome {
            if *reason != SkipReason::UnsupportedExtension {
                self.println(format!("- {} skipped: {}", report.input.display(), reason));
            }
        }
    }

    fn batch_finished(&mut self, summary: &BatchSummary) {
        if let Some(bar) = self.overall.take() {
            bar.finish_and_clear();
        }
        println!("{}", summary_line(summary));
    }
}

/// Prints only failures and the summary line.
#[derive(Debug, Default)]
pub struct QuietReporter;

impl BatchObserver for QuietReporter {
    fn file_finished(&mut self, report: &FileReport) {
        if let FileOutcome::Failed(ref msg) = report.outcome {
            eprintln!("{} failed: {}", report.input.display(), msg);
        }
    }

    fn batch_finished(&mut self, summary: &BatchSummary) {
        println!("{}", summary_line(summary));
    }
}
