//! ffmpeg command construction.
//!
//! Every video and audio stream of the source is mapped into the MP4. Each
//! stream is either copied or re-encoded according to the encoding policy;
//! subtitle and data streams are dropped since MP4 cannot carry most of them.

use crate::policy::{output_channels, EncodingPlan, EncodingPolicy};
use crate::probe::MediaInfo;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A fully built ffmpeg invocation.
#[derive(Debug, Clone)]
pub struct TranscodeCommand {
    /// ffmpeg binary.
    pub program: PathBuf,
    /// Arguments, including input and output paths.
    pub args: Vec<OsString>,
    /// Source file.
    pub input: PathBuf,
    /// File ffmpeg writes to.
    pub output: PathBuf,
    /// Whether any audio stream was mapped.
    pub has_audio: bool,
    /// Plan for the primary streams, for reporting.
    pub plan: EncodingPlan,
}

impl TranscodeCommand {
    /// Arguments as lossy UTF-8 strings.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Build a `std::process::Command` ready to spawn.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Same invocation writing to a different output path.
    pub fn with_output(mut self, output: &Path) -> Self {
        if let Some(last) = self.args.last_mut() {
            *last = output.as_os_str().to_os_string();
        }
        self.output = output.to_path_buf();
        self
    }
}

impl fmt::Display for TranscodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(self.program.as_os_str()))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:+=,@%".contains(c));
    if plain {
        s.into_owned()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

#[derive(Default)]
struct ArgList(Vec<OsString>);

impl ArgList {
    fn push(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.0.push(arg.as_ref().to_os_string());
        self
    }

    fn extend<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self.push(arg);
        }
        self
    }
}

/// Build the ffmpeg command transcoding `info.file_path` into `output`.
pub fn build_transcode_command(
    ffmpeg: &Path,
    info: &MediaInfo,
    policy: &EncodingPolicy,
    output: &Path,
) -> TranscodeCommand {
    let mut args = ArgList::default();
    args.extend(["-hide_banner", "-nostdin", "-y", "-i"])
        .push(&info.file_path);

    for (n, video) in info.video_tracks.iter().enumerate() {
        args.extend(["-map".to_string(), format!("0:{}", video.index)]);
        if policy.video.should_copy(&video.codec) {
            args.extend([format!("-c:v:{}", n), "copy".to_string()]);
        } else {
            let settings = policy.video.settings(&video.codec, video.width, video.height);
            args.extend([
                format!("-c:v:{}", n),
                "libx264".to_string(),
                format!("-crf:v:{}", n),
                settings.crf.to_string(),
                format!("-preset:v:{}", n),
                settings.preset.to_string(),
            ]);
        }
    }

    for (n, audio) in info.audio_tracks.iter().enumerate() {
        args.extend(["-map".to_string(), format!("0:{}", audio.index)]);
        if policy
            .audio
            .should_copy(&audio.codec, audio.bit_rate, audio.channels)
        {
            args.extend([format!("-c:a:{}", n), "copy".to_string()]);
        } else {
            let kbps = policy
                .audio
                .target_kbps(&audio.codec, audio.bit_rate, audio.channels);
            args.extend([
                format!("-c:a:{}", n),
                "aac".to_string(),
                format!("-profile:a:{}", n),
                "aac_low".to_string(),
                format!("-b:a:{}", n),
                format!("{}k", kbps),
                format!("-ac:a:{}", n),
                output_channels(audio.channels).to_string(),
            ]);
        }
    }

    let has_audio = info.has_audio();
    if !has_audio {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            "No audio streams found in {:?}; output will be video-only",
            info.file_path
        );
    }

    args.extend([
        "-movflags",
        "+faststart",
        "-progress",
        "pipe:1",
        "-nostats",
        "-v",
        "error",
    ])
    .push(output);

    TranscodeCommand {
        program: ffmpeg.to_path_buf(),
        args: args.0,
        input: info.file_path.clone(),
        output: output.to_path_buf(),
        has_audio,
        plan: policy.select_plan(&info.source_probe()),
    }
}
