//! Sequential batch conversion.

mod discovery;

pub use discovery::{discover, BatchItem, DiscoveryOptions, SkipReason, OUTPUT_EXTENSION};

use crate::config::Config;
use crate::report::BatchObserver;
use anyhow::Result;
use convid_av::probe::probe_with_ffprobe;
use convid_av::tools::get_tool_path;
use convid_av::{MediaInfo, Transcoder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

/// Per-file conversion failure.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The file could not be probed, or has nothing to convert.
    #[error("{0}")]
    Unreadable(String),

    #[error("{0}")]
    Failed(String),
}

/// Converts one file. The runner only talks to this trait.
pub trait Converter {
    /// The command that would run for `input`, without running it.
    fn describe(&self, input: &Path, output: &Path) -> Result<String, ConvertError>;

    /// Convert `input` to `output`, reporting percentages to `progress`.
    fn convert(
        &self,
        input: &Path,
        output: &Path,
        progress: &mut dyn FnMut(f64),
    ) -> Result<PathBuf, ConvertError>;
}

impl<T: Converter + ?Sized> Converter for &T {
    fn describe(&self, input: &Path, output: &Path) -> Result<String, ConvertError> {
        (**self).describe(input, output)
    }

    fn convert(
        &self,
        input: &Path,
        output: &Path,
        progress: &mut dyn FnMut(f64),
    ) -> Result<PathBuf, ConvertError> {
        (**self).convert(input, output, progress)
    }
}

/// Probe, plan and transcode with ffprobe and ffmpeg.
pub struct FfmpegConverter {
    ffprobe: PathBuf,
    transcoder: Transcoder,
}

impl FfmpegConverter {
    pub fn new(ffprobe: PathBuf, transcoder: Transcoder) -> Self {
        Self { ffprobe, transcoder }
    }

    /// Resolve both tools from config or `PATH`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let ffmpeg = get_tool_path("ffmpeg", config.tools.ffmpeg_path.as_deref())?;
        let ffprobe = get_tool_path("ffprobe", config.tools.ffprobe_path.as_deref())?;
        Ok(Self::new(
            ffprobe,
            Transcoder::new(ffmpeg, config.policy.clone()),
        ))
    }

    fn probe(&self, input: &Path) -> Result<MediaInfo, ConvertError> {
        let info = probe_with_ffprobe(&self.ffprobe, input).map_err(|e| {
            if e.is_source_problem() {
                ConvertError::Unreadable(e.to_string())
            } else {
                ConvertError::Failed(e.to_string())
            }
        })?;
        if info.video_tracks.is_empty() {
            return Err(ConvertError::Unreadable("no video stream".to_string()));
        }
        Ok(info)
    }
}

impl Converter for FfmpegConverter {
    fn describe(&self, input: &Path, output: &Path) -> Result<String, ConvertError> {
        let info = self.probe(input)?;
        Ok(self.transcoder.command_for(&info, output).to_string())
    }

    fn convert(
        &self,
        input: &Path,
        output: &Path,
        progress: &mut dyn FnMut(f64),
    ) -> Result<PathBuf, ConvertError> {
        let info = self.probe(input)?;
        self.transcoder
            .transcode(&info, output, progress)
            .map_err(|e| ConvertError::Failed(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Replace existing outputs.
    pub overwrite: bool,
    /// Describe each conversion instead of running it.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Converted { output: PathBuf },
    Planned { command: String },
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub outcome: FileOutcome,
}

/// What a batch did.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Files discovered.
    pub total: usize,
    /// Files handed to the converter.
    pub attempted: usize,
    pub converted: usize,
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
    pub reports: Vec<FileReport>,
}

impl BatchSummary {
    fn record(&mut self, report: FileReport) {
        match report.outcome {
            FileOutcome::Converted { .. } => self.converted += 1,
            FileOutcome::Planned { .. } => self.planned += 1,
            FileOutcome::Skipped(_) => self.skipped += 1,
            FileOutcome::Failed(_) => self.failed += 1,
        }
        self.reports.push(report);
    }

    /// Files skipped for `reason`.
    pub fn skipped_for(&self, reason: &SkipReason) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(&r.outcome, FileOutcome::Skipped(s) if s == reason))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Files with a supported extension, converted or not.
    pub fn candidates(&self) -> usize {
        self.total - self.skipped_for(&SkipReason::UnsupportedExtension)
    }
}

/// Runs a list of batch items one at a time.
pub struct BatchRunner {
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(options: BatchOptions) -> Self {
        Self { options }
    }

    /// Process every item.
    ///
    /// `make_converter` is only called when at least one file needs
    /// converting, so a batch with nothing to do never looks for tools. Its
    /// error is the only one returned; per-file failures are recorded in the
    /// summary.
    pub fn run<C, F>(
        &self,
        items: Vec<BatchItem>,
        make_converter: F,
        observer: &mut dyn BatchObserver,
    ) -> Result<BatchSummary>
    where
        C: Converter,
        F: FnOnce() -> Result<C>,
    {
        let mut summary = BatchSummary {
            total: items.len(),
            ..Default::default()
        };

        // Two inputs can map to one output (clip.avi and clip.mkv). The first
        // one claims it.
        let mut claimed = HashSet::new();
        let mut queue = Vec::new();
        for item in items {
            match item {
                BatchItem::Skipped { input, reason } => {
                    self.skip(&mut summary, observer, input, reason);
                }
                BatchItem::Eligible { input, output } => {
                    let taken = !self.options.overwrite
                        && (output.exists() || !claimed.insert(output.clone()));
                    if taken {
                        self.skip(&mut summary, observer, input, SkipReason::OutputExists);
                    } else {
                        queue.push((input, output));
                    }
                }
            }
        }

        if queue.is_empty() {
            observer.batch_finished(&summary);
            return Ok(summary);
        }

        let converter = make_converter()?;
        observer.batch_started(queue.len());

        for (position, (input, output)) in queue.into_iter().enumerate() {
            // Something else may have written the output since the batch started.
            if !self.options.overwrite && output.exists() {
                info!("Skipping {:?}, output already exists", input);
                let report = FileReport {
                    input,
                    outcome: FileOutcome::Skipped(SkipReason::OutputExists),
                };
                observer.file_finished(&report);
                summary.record(report);
                continue;
            }

            summary.attempted += 1;
            observer.file_started(position, &input);

            let result = if self.options.dry_run {
                converter
                    .describe(&input, &output)
                    .map(|command| FileOutcome::Planned { command })
            } else {
                converter
                    .convert(&input, &output, &mut |pct: f64| observer.file_progress(pct))
                    .map(|output| FileOutcome::Converted { output })
            };

            let outcome = match result {
                Ok(outcome) => {
                    if let FileOutcome::Converted { ref output } = outcome {
                        info!("Converted {:?} -> {:?}", input, output);
                    }
                    outcome
                }
                Err(ConvertError::Unreadable(msg)) => {
                    warn!("Skipping {:?}: {}", input, msg);
                    FileOutcome::Skipped(SkipReason::Unreadable(msg))
                }
                Err(ConvertError::Failed(msg)) => {
                    error!("Conversion failed for {:?}: {}", input, msg);
                    FileOutcome::Failed(msg)
                }
            };

            let report = FileReport { input, outcome };
            observer.file_finished(&report);
            summary.record(report);
        }

        observer.batch_finished(&summary);
        Ok(summary)
    }

    fn skip(
        &self,
        summary: &mut BatchSummary,
        observer: &mut dyn BatchObserver,
        input: PathBuf,
        reason: SkipReason,
    ) {
        if reason == SkipReason::OutputExists {
            info!("Skipping {:?}, output already exists", input);
        }
        let report = FileReport {
            input,
            outcome: FileOutcome::Skipped(reason),
        };
        observer.file_skipped(&report);
        summary.record(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::QuietReporter;
    use std::cell::RefCell;

    /// Converter that records calls and writes an empty output.
    #[derive(Default)]
    struct Recording {
        calls: RefCell<Vec<PathBuf>>,
    }

    impl Converter for Recording {
        fn describe(&self, input: &Path, output: &Path) -> Result<String, ConvertError> {
            Ok(format!("ffmpeg -i {} {}", input.display(), output.display()))
        }

        fn convert(
            &self,
            input: &Path,
            output: &Path,
            progress: &mut dyn FnMut(f64),
        ) -> Result<PathBuf, ConvertError> {
            self.calls.borrow_mut().push(input.to_path_buf());
            progress(100.0);
            Ok(output.to_path_buf())
        }
    }

    fn eligible(name: &str) -> BatchItem {
        BatchItem::Eligible {
            input: PathBuf::from(format!("/nonexistent/{}.avi", name)),
            output: PathBuf::from(format!("/nonexistent/{}.mp4", name)),
        }
    }

    #[test]
    fn test_dry_run_does_not_convert() {
        let converter = Recording::default();
        let runner = BatchRunner::new(BatchOptions {
            dry_run: true,
            ..Default::default()
        });
        let summary = runner
            .run(vec![eligible("a")], || Ok(&converter), &mut QuietReporter)
            .unwrap();

        assert!(converter.calls.borrow().is_empty());
        assert_eq!(summary.planned, 1);
        assert_eq!(summary.attempted, 1);
        assert!(matches!(
            &summary.reports[0].outcome,
            FileOutcome::Planned { command } if command.contains("a.avi")
        ));
    }

    #[test]
    fn test_summary_counts() {
        let converter = Recording::default();
        let runner = BatchRunner::new(BatchOptions::default());
        let items = vec![
            eligible("a"),
            BatchItem::Skipped {
                input: PathBuf::from("notes.txt"),
                reason: SkipReason::UnsupportedExtension,
            },
            eligible("b"),
        ];
        let summary = runner
            .run(items, || Ok(&converter), &mut QuietReporter)
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.converted, 2);
        assert_eq!(summary.skipped_for(&SkipReason::UnsupportedExtension), 1);
        assert!(!summary.has_failures());
    }

    #[test]
    fn test_converter_not_needed_without_work() {
        let items = vec![BatchItem::Skipped {
            input: PathBuf::from("notes.txt"),
            reason: SkipReason::UnsupportedExtension,
        }];
        let summary = BatchRunner::new(BatchOptions::default())
            .run(
                items,
                || -> Result<Recording> { anyhow::bail!("ffmpeg not found") },
                &mut QuietReporter,
            )
            .unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.attempted, 0);
    }

    /// Writes `other` as a side effect of converting, like a second process
    /// working in the same folder.
    struct Interloper {
        other: PathBuf,
        calls: RefCell<Vec<PathBuf>>,
    }

    impl Converter for Interloper {
        fn describe(&self, input: &Path, _output: &Path) -> Result<String, ConvertError> {
            Ok(input.display().to_string())
        }

        fn convert(
            &self,
            input: &Path,
            output: &Path,
            _progress: &mut dyn FnMut(f64),
        ) -> Result<PathBuf, ConvertError> {
            self.calls.borrow_mut().push(input.to_path_buf());
            std::fs::write(output, b"").unwrap();
            std::fs::write(&self.other, b"").unwrap();
            Ok(output.to_path_buf())
        }
    }

    #[test]
    fn test_output_created_mid_batch_is_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let items = vec![
            BatchItem::Eligible {
                input: dir.path().join("a.avi"),
                output: dir.path().join("a.mp4"),
            },
            BatchItem::Eligible {
                input: dir.path().join("b.avi"),
                output: dir.path().join("b.mp4"),
            },
        ];
        let converter = Interloper {
            other: dir.path().join("b.mp4"),
            calls: RefCell::default(),
        };

        let summary = BatchRunner::new(BatchOptions::default())
            .run(items, || Ok(&converter), &mut QuietReporter)
            .unwrap();

        assert_eq!(*converter.calls.borrow(), vec![dir.path().join("a.avi")]);
        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.skipped_for(&SkipReason::OutputExists), 1);
    }

    #[test]
    fn test_missing_converter_is_fatal_with_work() {
        let result = BatchRunner::new(BatchOptions::default()).run(
            vec![eligible("a")],
            || -> Result<Recording> { anyhow::bail!("ffmpeg not found") },
            &mut QuietReporter,
        );
        assert!(result.is_err());
    }
}
