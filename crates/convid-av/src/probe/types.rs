//! Media information types.

use crate::policy::SourceProbe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path to the media file.
    pub file_path: PathBuf,
    /// File size in bytes.
    pub file_size: u64,
    /// Container format as reported by ffprobe (e.g., "matroska,webm").
    pub container: String,
    /// Duration of the media.
    pub duration: Option<Duration>,
    /// Video tracks in the file.
    pub video_tracks: Vec<VideoTrack>,
    /// Audio tracks in the file.
    pub audio_tracks: Vec<AudioTrack>,
}

/// Information about a video track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoTrack {
    /// Stream index within the container (used for `-map 0:<index>`).
    pub index: u32,
    /// Video codec as named by ffprobe (e.g., "h264", "mpeg4").
    pub codec: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate in FPS.
    pub frame_rate: Option<f64>,
    /// Stream bitrate in bits per second.
    pub bit_rate: Option<u64>,
}

/// Information about an audio track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Stream index within the container.
    pub index: u32,
    /// Audio codec as named by ffprobe (e.g., "aac", "ac3", "pcm_s16le").
    pub codec: String,
    /// Number of channels.
    pub channels: u32,
    /// Sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// Stream bitrate in bits per second.
    pub bit_rate: Option<u64>,
    /// Language code (e.g., "eng", "spa").
    pub language: Option<String>,
}

impl MediaInfo {
    /// Get the primary (first) video track.
    pub fn primary_video(&self) -> Option<&VideoTrack> {
        self.video_tracks.first()
    }

    /// Get the primary (first) audio track.
    pub fn primary_audio(&self) -> Option<&AudioTrack> {
        self.audio_tracks.first()
    }

    /// Whether the file carries any audio.
    pub fn has_audio(&self) -> bool {
        !self.audio_tracks.is_empty()
    }

    /// Summarise the primary streams for the encoding policy.
    ///
    /// Missing streams produce empty codec names (which the policy treats
    /// as unknown) and a stereo channel count.
    pub fn source_probe(&self) -> SourceProbe {
        let video = self.primary_video();
        let audio = self.primary_audio();

        SourceProbe {
            video_codec: video.map(|v| v.codec.clone()).unwrap_or_default(),
            video_bitrate: video.and_then(|v| v.bit_rate),
            width: video.map(|v| v.width).unwrap_or(0),
            height: video.map(|v| v.height).unwrap_or(0),
            frame_rate: video.and_then(|v| v.frame_rate).unwrap_or(0.0),
            audio_codec: audio.map(|a| a.codec.clone()).unwrap_or_default(),
            audio_bitrate: audio.and_then(|a| a.bit_rate),
            audio_channels: audio.map(|a| a.channels).unwrap_or(2),
        }
    }
}
