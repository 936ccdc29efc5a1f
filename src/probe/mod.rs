// Re-export probe functionality from convid-av
pub use convid_av::probe::*;
pub use convid_av::tools::{check_tools, get_tool_path, ToolInfo};

use crate::config::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// Probe a media file with the configured (or `PATH`) ffprobe
pub fn probe_file(path: &Path, config: &Config) -> Result<MediaInfo> {
    let ffprobe = get_tool_path("ffprobe", config.tools.ffprobe_path.as_deref())?;
    probe_with_ffprobe(&ffprobe, path).with_context(|| format!("Failed to probe {:?}", path))
}

/// Availability of ffmpeg and ffprobe, honoring configured paths
pub fn check_configured_tools(config: &Config) -> Vec<ToolInfo> {
    check_tools(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    )
}
