//! AAC-LC target bitrate table keyed by source codec family and channel count.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Channel-count bucket used for the per-layout limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelClass {
    Mono,
    Stereo,
    Surround,
}

impl ChannelClass {
    /// Classify a channel count. Zero (unknown) is treated as stereo.
    pub fn from_count(channels: u32) -> Self {
        match channels {
            1 => ChannelClass::Mono,
            0 | 2 => ChannelClass::Stereo,
            _ => ChannelClass::Surround,
        }
    }
}

/// Source audio codec grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCodecFamily {
    /// Modern lossy codecs; AAC needs about the same bitrate.
    Efficient,
    /// Older lossy codecs; AAC matches them with less.
    LegacyLossy,
    /// Lossless or PCM sources.
    Lossless,
    /// Anything not in the tables.
    Unknown,
}

const EFFICIENT_AUDIO: &[&str] = &["aac", "opus", "vorbis"];

const LEGACY_LOSSY_AUDIO: &[&str] = &[
    "mp3", "mp2", "wmav1", "wmav2", "wma", "wma2", "ac3", "eac3", "dts", "atrac3", "cook",
];

const LOSSLESS_AUDIO: &[&str] = &["flac", "alac", "mlp", "truehd"];

impl AudioCodecFamily {
    /// Classify an ffprobe codec name (case-insensitive).
    pub fn classify(codec: &str) -> Self {
        let codec = codec.trim().to_lowercase();
        if EFFICIENT_AUDIO.contains(&codec.as_str()) {
            AudioCodecFamily::Efficient
        } else if LEGACY_LOSSY_AUDIO.contains(&codec.as_str()) {
            AudioCodecFamily::LegacyLossy
        } else if LOSSLESS_AUDIO.contains(&codec.as_str()) || codec.starts_with("pcm_") {
            AudioCodecFamily::Lossless
        } else {
            AudioCodecFamily::Unknown
        }
    }

    fn is_lossy(self) -> bool {
        matches!(self, AudioCodecFamily::Efficient | AudioCodecFamily::LegacyLossy)
    }
}

/// A kbps value per channel class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTable {
    pub mono: u32,
    pub stereo: u32,
    pub surround: u32,
}

impl ChannelTable {
    pub fn get(&self, class: ChannelClass) -> u32 {
        match class {
            ChannelClass::Mono => self.mono,
            ChannelClass::Stereo => self.stereo,
            ChannelClass::Surround => self.surround,
        }
    }
}

/// Multiplier applied to the source bitrate per codec family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamilyScale {
    pub efficient: f64,
    pub legacy_lossy: f64,
    pub lossless: f64,
}

/// Audio half of the encoding policy. All bitrates are kbps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioPolicy {
    /// Used when the source bitrate or codec is unknown.
    pub default_kbps: ChannelTable,
    pub floor_kbps: ChannelTable,
    pub ceiling_kbps: ChannelTable,
    pub scale: FamilyScale,
    /// Cap lossy sources at their own bitrate.
    pub never_exceed_lossy_source: bool,
    /// Pass AAC through when it already meets the target.
    pub copy_aac: bool,
}

impl Default for AudioPolicy {
    fn default() -> Self {
        Self {
            default_kbps: ChannelTable {
                mono: 128,
                stereo: 320,
                surround: 512,
            },
            floor_kbps: ChannelTable {
                mono: 32,
                stereo: 64,
                surround: 192,
            },
            ceiling_kbps: ChannelTable {
                mono: 128,
                stereo: 320,
                surround: 512,
            },
            scale: FamilyScale {
                efficient: 1.0,
                legacy_lossy: 0.8,
                lossless: 1.5,
            },
            never_exceed_lossy_source: true,
            copy_aac: true,
        }
    }
}

impl AudioPolicy {
    /// Target AAC-LC bitrate in bits per second.
    pub fn target_bitrate(&self, codec: &str, source_bps: Option<u64>, channels: u32) -> u64 {
        let class = ChannelClass::from_count(channels);
        let fallback = u64::from(self.default_kbps.get(class)) * 1000;

        let source = match source_bps {
            Some(bps) if bps > 0 => bps,
            _ => return fallback,
        };

        let family = AudioCodecFamily::classify(codec);
        let scale = match family {
            AudioCodecFamily::Efficient => self.scale.efficient,
            AudioCodecFamily::LegacyLossy => self.scale.legacy_lossy,
            AudioCodecFamily::Lossless => self.scale.lossless,
            AudioCodecFamily::Unknown => return fallback,
        };

        let floor = u64::from(self.floor_kbps.get(class)) * 1000;
        let ceiling = u64::from(self.ceiling_kbps.get(class)) * 1000;
        let mut target = ((source as f64) * scale) as u64;
        target = target.clamp(floor, ceiling);

        if family.is_lossy() && self.never_exceed_lossy_source {
            target = target.min(source);
        }

        target
    }

    /// Target bitrate rounded down to whole kbps.
    pub fn target_kbps(&self, codec: &str, source_bps: Option<u64>, channels: u32) -> u32 {
        (self.target_bitrate(codec, source_bps, channels) / 1000) as u32
    }

    /// Whether the stream can be copied instead of re-encoded.
    pub fn should_copy(&self, codec: &str, source_bps: Option<u64>, channels: u32) -> bool {
        if !self.copy_aac || !codec.trim().eq_ignore_ascii_case("aac") {
            return false;
        }
        match source_bps {
            Some(bps) if bps > 0 => bps >= self.target_bitrate(codec, source_bps, channels),
            _ => false,
        }
    }

    /// Reject tables whose floor is above the ceiling or whose values are zero.
    pub fn validate(&self) -> Result<()> {
        for class in [ChannelClass::Mono, ChannelClass::Stereo, ChannelClass::Surround] {
            let floor = self.floor_kbps.get(class);
            let ceiling = self.ceiling_kbps.get(class);
            if floor == 0 || floor > ceiling {
                return Err(Error::InvalidInput(format!(
                    "audio policy {:?}: floor {}k must be non-zero and not above ceiling {}k",
                    class, floor, ceiling
                )));
            }
            if self.default_kbps.get(class) == 0 {
                return Err(Error::InvalidInput(format!(
                    "audio policy {:?}: default bitrate must be non-zero",
                    class
                )));
            }
        }

        let scales = [
            self.scale.efficient,
            self.scale.legacy_lossy,
            self.scale.lossless,
        ];
        if scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(Error::InvalidInput(
                "audio policy: scale factors must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
