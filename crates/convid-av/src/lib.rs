//! # convid-av
//!
//! Probing, encoding policy and ffmpeg invocation for convid.
//!
//! This crate provides functionality for:
//! - Probing media files with ffprobe to extract stream metadata
//! - Selecting encoder parameters (CRF, preset, AAC bitrate) from a static policy table
//! - Building the ffmpeg command line for an MP4/H.264/AAC transcode
//! - Running ffmpeg and turning its progress output into percentages
//!
//! ## Features
//!
//! - `tracing` (default) - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use convid_av::{probe, select_plan};
//!
//! let info = probe("/path/to/video.avi")?;
//! let plan = select_plan(&info.source_probe());
//! println!("CRF {} preset {}", plan.video_crf, plan.video_preset);
//! # Ok::<(), convid_av::Error>(())
//! ```

pub mod command;
pub mod encode;
mod error;
pub mod policy;
pub mod probe;
pub mod progress;
pub mod tools;
pub mod workspace;

// Re-exports
pub use command::{build_transcode_command, TranscodeCommand};
pub use encode::Transcoder;
pub use error::{Error, Result};
pub use policy::{select_plan, EncodingPlan, EncodingPolicy, Preset, SourceProbe};
pub use probe::{AudioTrack, MediaInfo, VideoTrack};
pub use progress::ProgressParser;
pub use tools::{check_tool, check_tools, require_tool, ToolInfo};
pub use workspace::Workspace;

/// Probe a media file with the `ffprobe` found on `PATH`.
///
/// # Example
///
/// ```no_run
/// use convid_av::probe;
///
/// let info = probe("/path/to/video.mkv")?;
/// println!("Video codec: {}", info.video_tracks[0].codec);
/// # Ok::<(), convid_av::Error>(())
/// ```
pub fn probe<P: AsRef<std::path::Path>>(path: P) -> Result<MediaInfo> {
    let ffprobe = tools::require_tool("ffprobe")?;
    probe::probe_with_ffprobe(&ffprobe, path.as_ref())
}
