//! Encoding policy selection.
//!
//! Turns probed source metadata into encoder parameters through two static
//! lookup tables: video CRF/preset keyed by resolution tier and codec
//! family, and AAC-LC bitrate keyed by codec family and channel count.
//! Selection never fails; unrecognised codecs get the fallback settings.
//!
//! ```
//! use convid_av::policy::{select_plan, SourceProbe};
//!
//! let probe = SourceProbe {
//!     video_codec: "mpeg4".into(),
//!     video_bitrate: Some(1_200_000),
//!     width: 720,
//!     height: 480,
//!     frame_rate: 29.97,
//!     audio_codec: "mp3".into(),
//!     audio_bitrate: Some(128_000),
//!     audio_channels: 2,
//! };
//! let plan = select_plan(&probe);
//! assert_eq!(plan.video_crf, 18);
//! assert_eq!(plan.audio_bitrate_kbps, 102);
//! ```

mod audio;
mod video;

pub use audio::{AudioCodecFamily, AudioPolicy, ChannelClass, ChannelTable, FamilyScale};
pub use video::{ResolutionTier, TierRow, VideoCodecFamily, VideoPolicy, VideoSettings, MAX_CRF};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// x264 speed/efficiency presets, fastest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    Medium,
    Slow,
    Slower,
    Veryslow,
    Placebo,
}

impl Preset {
    /// Name as passed to `-preset`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Ultrafast => "ultrafast",
            Preset::Superfast => "superfast",
            Preset::Veryfast => "veryfast",
            Preset::Faster => "faster",
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
            Preset::Slower => "slower",
            Preset::Veryslow => "veryslow",
            Preset::Placebo => "placebo",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ultrafast" => Ok(Preset::Ultrafast),
            "superfast" => Ok(Preset::Superfast),
            "veryfast" => Ok(Preset::Veryfast),
            "faster" => Ok(Preset::Faster),
            "fast" => Ok(Preset::Fast),
            "medium" => Ok(Preset::Medium),
            "slow" => Ok(Preset::Slow),
            "slower" => Ok(Preset::Slower),
            "veryslow" => Ok(Preset::Veryslow),
            "placebo" => Ok(Preset::Placebo),
            other => Err(Error::InvalidInput(format!("unknown preset: {}", other))),
        }
    }
}

/// Probed metadata of a source's primary video and audio streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProbe {
    pub video_codec: String,
    /// Bits per second.
    pub video_bitrate: Option<u64>,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub audio_codec: String,
    /// Bits per second.
    pub audio_bitrate: Option<u64>,
    pub audio_channels: u32,
}

/// Encoder parameters chosen for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingPlan {
    pub video_crf: u8,
    pub video_preset: Preset,
    pub audio_bitrate_kbps: u32,
    pub audio_channels: u32,
    /// The video stream is passed through instead of encoded.
    pub copy_video: bool,
    /// The audio stream is passed through instead of encoded.
    pub copy_audio: bool,
}

impl fmt::Display for EncodingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.copy_video {
            write!(f, "video: copy")?;
        } else {
            write!(
                f,
                "video: libx264 crf {} preset {}",
                self.video_crf, self.video_preset
            )?;
        }
        if self.copy_audio {
            write!(f, ", audio: copy")
        } else {
            write!(
                f,
                ", audio: aac {}k {}ch",
                self.audio_bitrate_kbps, self.audio_channels
            )
        }
    }
}

/// The complete, configurable lookup policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingPolicy {
    pub video: VideoPolicy,
    pub audio: AudioPolicy,
}

impl EncodingPolicy {
    /// Select encoder parameters for a source.
    pub fn select_plan(&self, probe: &SourceProbe) -> EncodingPlan {
        let video = self
            .video
            .settings(&probe.video_codec, probe.width, probe.height);

        EncodingPlan {
            video_crf: video.crf,
            video_preset: video.preset,
            audio_bitrate_kbps: self.audio.target_kbps(
                &probe.audio_codec,
                probe.audio_bitrate,
                probe.audio_channels,
            ),
            audio_channels: output_channels(probe.audio_channels),
            copy_video: self.video.should_copy(&probe.video_codec),
            copy_audio: self.audio.should_copy(
                &probe.audio_codec,
                probe.audio_bitrate,
                probe.audio_channels,
            ),
        }
    }

    /// The conservative plan used when neither codec is recognised.
    pub fn fallback_plan(&self, audio_channels: u32) -> EncodingPlan {
        let class = ChannelClass::from_count(audio_channels);
        EncodingPlan {
            video_crf: self.video.fallback.crf,
            video_preset: self.video.fallback.preset,
            audio_bitrate_kbps: self.audio.default_kbps.get(class),
            audio_channels: output_channels(audio_channels),
            copy_video: false,
            copy_audio: false,
        }
    }

    /// Validate both tables.
    pub fn validate(&self) -> Result<()> {
        self.video.validate()?;
        self.audio.validate()
    }
}

/// Channel count written to the output; unknown counts become stereo.
pub fn output_channels(source_channels: u32) -> u32 {
    if source_channels == 0 {
        2
    } else {
        source_channels
    }
}

/// Select encoder parameters using the default policy.
pub fn select_plan(probe: &SourceProbe) -> EncodingPlan {
    EncodingPolicy::default().select_plan(probe)
}
