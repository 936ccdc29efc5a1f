use convid_av::EncodingPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,

    /// CRF/preset and AAC bitrate tables.
    #[serde(default)]
    pub policy: EncodingPolicy,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// File extensions eligible for conversion (without the leading dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Write outputs here instead of next to each source
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Replace outputs that already exist (including in-place `.mp4` sources)
    #[serde(default)]
    pub overwrite: bool,

    /// Descend into subdirectories (default: true)
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

/// Containers the converter accepts by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "mov", "avi", "mkv", "mpg", "mp4", "wmv", "flv", "webm", "vob", "m4v", "ts", "m2ts", "rm",
    "rmvb", "ogv",
];

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_recursive() -> bool {
    true
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            output_dir: None,
            overwrite: false,
            recursive: default_recursive(),
        }
    }
}
