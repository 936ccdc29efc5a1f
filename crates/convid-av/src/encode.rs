//! Running ffmpeg.

use crate::command::{build_transcode_command, TranscodeCommand};
use crate::policy::EncodingPolicy;
use crate::probe::MediaInfo;
use crate::progress::ProgressParser;
use crate::{Error, Result, Workspace};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

/// Number of stderr lines kept for error messages.
const STDERR_TAIL_LINES: usize = 20;

/// Runs ffmpeg transcodes with a fixed binary and policy.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg: PathBuf,
    policy: EncodingPolicy,
}

impl Transcoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, policy: EncodingPolicy) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            policy,
        }
    }

    /// The command that would transcode `info` to `destination`.
    pub fn command_for(&self, info: &MediaInfo, destination: &Path) -> TranscodeCommand {
        build_transcode_command(&self.ffmpeg, info, &self.policy, destination)
    }

    /// Transcode `info.file_path` to `destination` through a workspace.
    ///
    /// `progress` receives percentages in `0.0..=100.0`.
    pub fn transcode(
        &self,
        info: &MediaInfo,
        destination: &Path,
        progress: &mut dyn FnMut(f64),
    ) -> Result<PathBuf> {
        let workspace = Workspace::for_destination(destination)?;
        let command = self.command_for(info, destination).with_output(workspace.output());

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Transcoding {:?} -> {:?} ({})",
            info.file_path,
            destination,
            command.plan
        );
        #[cfg(feature = "tracing")]
        tracing::debug!("ffmpeg command: {}", command);

        match self.run(&command, info.duration, progress) {
            Ok(()) => workspace.finalize(),
            Err(e) => {
                workspace.cleanup();
                Err(e)
            }
        }
    }

    /// Run a prepared command, blocking until ffmpeg exits.
    pub fn run(
        &self,
        command: &TranscodeCommand,
        duration: Option<Duration>,
        progress: &mut dyn FnMut(f64),
    ) -> Result<()> {
        let tool = command
            .program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| command.program.to_string_lossy().to_string());

        let mut child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::from_spawn(&tool, e))?;

        // Drain stderr concurrently so a chatty ffmpeg never blocks on a full pipe.
        let stderr = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buf);
            }
            buf
        });

        let mut parser = ProgressParser::new(duration);
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break,
                };
                if let Some(pct) = parser.feed_line(&line) {
                    progress(pct);
                }
            }
        }

        let status = child.wait()?;
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(Error::tool_failed(
                tool,
                format!("exited with {}: {}", status, stderr_tail(&stderr)),
            ));
        }

        if !parser.is_finished() {
            progress(100.0);
        }

        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::select_plan;
    use std::ffi::OsString;

    fn shell(script: &str) -> TranscodeCommand {
        let plan = select_plan(&MediaInfo {
            file_path: PathBuf::from("in.avi"),
            file_size: 0,
            container: String::new(),
            duration: None,
            video_tracks: vec![],
            audio_tracks: vec![],
        }
        .source_probe());
        TranscodeCommand {
            program: PathBuf::from("sh"),
            args: vec![OsString::from("-c"), OsString::from(script)],
            input: PathBuf::from("in.avi"),
            output: PathBuf::from("out.mp4"),
            has_audio: false,
            plan,
        }
    }

    fn transcoder() -> Transcoder {
        Transcoder::new("ffmpeg", EncodingPolicy::default())
    }

    #[test]
    fn test_stderr_tail() {
        let text = (0..30).map(|i| format!("line {}\n", i)).collect::<String>();
        let tail = stderr_tail(&text);
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_progress() {
        let cmd = shell(
            "echo out_time_us=5000000; echo progress=continue; \
             echo out_time_us=10000000; echo progress=end",
        );
        let mut seen = Vec::new();
        transcoder()
            .run(&cmd, Some(Duration::from_secs(10)), &mut |p| seen.push(p))
            .unwrap();
        assert_eq!(seen, vec![50.0, 100.0, 100.0]);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_completes_without_progress_end() {
        let cmd = shell("true");
        let mut seen = Vec::new();
        transcoder().run(&cmd, None, &mut |p| seen.push(p)).unwrap();
        assert_eq!(seen, vec![100.0]);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_failure_includes_stderr() {
        let cmd = shell("echo 'Invalid data found when processing input' >&2; exit 1");
        let err = transcoder().run(&cmd, None, &mut |_| {}).unwrap_err();
        match err {
            Error::ToolFailed { tool, message } => {
                assert_eq!(tool, "sh");
                assert!(message.contains("Invalid data found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_run_missing_binary() {
        let mut cmd = shell("true");
        cmd.program = PathBuf::from("nonexistent_ffmpeg_12345");
        let err = transcoder().run(&cmd, None, &mut |_| {}).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }
}
