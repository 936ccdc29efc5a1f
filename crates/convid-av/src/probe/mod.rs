//! Media file probing.
//!
//! Metadata comes from `ffprobe`'s JSON output; nothing here reads the
//! container itself.

mod ffprobe;
mod types;

pub use ffprobe::{parse_ffprobe_json, probe_with_ffprobe};
pub use types::*;
