//! Video CRF/preset table keyed by resolution tier and codec family.

use super::Preset;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Highest CRF libx264 accepts for 8-bit output.
pub const MAX_CRF: u8 = 51;

/// Resolution bucket used as the first table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionTier {
    /// Below 1280x720.
    Sd,
    /// 720p up to (but excluding) 4K.
    Hd,
    /// 3840x2160 and above.
    Uhd,
}

impl ResolutionTier {
    /// Classify a frame size. Either dimension reaching a threshold is enough,
    /// so letterboxed and portrait sources land in the expected tier.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width >= 3840 || height >= 2160 {
            ResolutionTier::Uhd
        } else if width >= 1280 || height >= 720 {
            ResolutionTier::Hd
        } else {
            ResolutionTier::Sd
        }
    }
}

/// How much compression headroom a source codec leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodecFamily {
    /// Modern codecs: re-encoding tolerates a higher CRF.
    Efficient,
    /// Older codecs whose artifacts need a lower CRF safety margin.
    Legacy,
    /// Anything not in the tables.
    Unknown,
}

const EFFICIENT_VIDEO: &[&str] = &["h264", "hevc", "vp9", "av1"];

const LEGACY_VIDEO: &[&str] = &[
    "mpeg1video",
    "mpeg2video",
    "mpeg4",
    "msmpeg4v1",
    "msmpeg4v2",
    "msmpeg4v3",
    "wmv1",
    "wmv2",
    "wmv3",
    "vc1",
    "h263",
    "flv1",
    "vp6",
    "vp6f",
    "vp8",
    "theora",
    "rv10",
    "rv20",
    "rv30",
    "rv40",
    "mjpeg",
    "dvvideo",
    "prores",
    "cinepak",
];

impl VideoCodecFamily {
    /// Classify an ffprobe codec name (case-insensitive).
    pub fn classify(codec: &str) -> Self {
        let codec = codec.trim().to_lowercase();
        if EFFICIENT_VIDEO.contains(&codec.as_str()) {
            VideoCodecFamily::Efficient
        } else if LEGACY_VIDEO.contains(&codec.as_str()) {
            VideoCodecFamily::Legacy
        } else {
            VideoCodecFamily::Unknown
        }
    }
}

/// Encoder settings for one table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSettings {
    pub crf: u8,
    pub preset: Preset,
}

impl VideoSettings {
    pub const fn new(crf: u8, preset: Preset) -> Self {
        Self { crf, preset }
    }
}

/// One resolution tier's row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRow {
    pub efficient: VideoSettings,
    pub legacy: VideoSettings,
}

/// Video half of the encoding policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoPolicy {
    pub sd: TierRow,
    pub hd: TierRow,
    pub uhd: TierRow,
    /// Used when the source codec is not recognised.
    pub fallback: VideoSettings,
    /// Pass H.264 video through untouched instead of re-encoding it.
    pub copy_h264: bool,
}

impl Default for VideoPolicy {
    fn default() -> Self {
        Self {
            sd: TierRow {
                efficient: VideoSettings::new(20, Preset::Slow),
                legacy: VideoSettings::new(18, Preset::Slow),
            },
            hd: TierRow {
                efficient: VideoSettings::new(21, Preset::Slow),
                legacy: VideoSettings::new(19, Preset::Slow),
            },
            uhd: TierRow {
                efficient: VideoSettings::new(22, Preset::Medium),
                legacy: VideoSettings::new(20, Preset::Medium),
            },
            fallback: VideoSettings::new(18, Preset::Slow),
            copy_h264: true,
        }
    }
}

impl VideoPolicy {
    /// Look up the encoder settings for a video stream.
    pub fn settings(&self, codec: &str, width: u32, height: u32) -> VideoSettings {
        let row = match ResolutionTier::from_dimensions(width, height) {
            ResolutionTier::Sd => &self.sd,
            ResolutionTier::Hd => &self.hd,
            ResolutionTier::Uhd => &self.uhd,
        };

        match VideoCodecFamily::classify(codec) {
            VideoCodecFamily::Efficient => row.efficient,
            VideoCodecFamily::Legacy => row.legacy,
            VideoCodecFamily::Unknown => self.fallback,
        }
    }

    /// Whether the stream can be copied into the MP4 as-is.
    pub fn should_copy(&self, codec: &str) -> bool {
        self.copy_h264 && codec.trim().eq_ignore_ascii_case("h264")
    }

    /// Reject CRF values libx264 would refuse.
    pub fn validate(&self) -> Result<()> {
        let cells = [
            ("sd.efficient", self.sd.efficient),
            ("sd.legacy", self.sd.legacy),
            ("hd.efficient", self.hd.efficient),
            ("hd.legacy", self.hd.legacy),
            ("uhd.efficient", self.uhd.efficient),
            ("uhd.legacy", self.uhd.legacy),
            ("fallback", self.fallback),
        ];
        for (name, cell) in cells {
            if cell.crf > MAX_CRF {
                return Err(Error::InvalidInput(format!(
                    "video policy {}: crf {} exceeds {}",
                    name, cell.crf, MAX_CRF
                )));
            }
        }
        Ok(())
    }
}
