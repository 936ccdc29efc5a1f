//! Finding the files a batch should convert.

use crate::config::ConversionConfig;
use anyhow::Result;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extension every output gets.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Prefix of the staging directories ffmpeg writes into.
const WORKSPACE_PREFIX: &str = ".convid-";

/// Why a file was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedExtension,
    OutputExists,
    /// Probe failed or the file has no video stream.
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedExtension => write!(f, "unsupported extension"),
            SkipReason::OutputExists => write!(f, "output already exists"),
            SkipReason::Unreadable(msg) => write!(f, "unreadable: {}", msg),
        }
    }
}

/// A discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchItem {
    Eligible { input: PathBuf, output: PathBuf },
    Skipped { input: PathBuf, reason: SkipReason },
}

impl BatchItem {
    pub fn input(&self) -> &Path {
        match self {
            BatchItem::Eligible { input, .. } | BatchItem::Skipped { input, .. } => input,
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, BatchItem::Eligible { .. })
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Lowercase extensions without the dot.
    pub extensions: Vec<String>,
    pub recursive: bool,
    pub output_dir: Option<PathBuf>,
}

impl DiscoveryOptions {
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            recursive: config.recursive,
            output_dir: config.output_dir.clone(),
        }
    }

    /// Case-insensitive extension check.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }

    /// Where the MP4 for `file` goes.
    ///
    /// `root` is the directory argument `file` was found under, if any. Its
    /// relative layout is kept below `output_dir`.
    pub fn output_path(&self, file: &Path, root: Option<&Path>) -> PathBuf {
        let Some(ref output_dir) = self.output_dir else {
            return file.with_extension(OUTPUT_EXTENSION);
        };

        let relative = root
            .and_then(|r| file.strip_prefix(r).ok())
            .map(Path::to_path_buf)
            .or_else(|| file.file_name().map(PathBuf::from))
            .unwrap_or_else(|| file.to_path_buf());

        output_dir.join(relative).with_extension(OUTPUT_EXTENSION)
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::from_config(&ConversionConfig::default())
    }
}

/// Expand `paths` into batch items, in a stable order.
///
/// Files are taken as given, directories are walked. A path reached twice is
/// only listed once.
pub fn discover(paths: &[PathBuf], options: &DiscoveryOptions) -> Result<Vec<BatchItem>> {
    let mut items = Vec::new();
    let mut seen = HashSet::new();

    for path in paths {
        if !path.exists() {
            anyhow::bail!("Input path does not exist: {:?}", path);
        }

        if path.is_file() {
            push_file(&mut items, &mut seen, path, None, options);
            continue;
        }

        debug!("Scanning directory: {:?}", path);
        let max_depth = if options.recursive { usize::MAX } else { 1 };

        for entry in WalkDir::new(path)
            .follow_links(true)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_workspace_dir(e.path(), e.depth()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping {:?}: {}", err.path().unwrap_or(path.as_path()), err);
                    // A broken link to a video still shows up in the summary.
                    if let Some(file) = err.path().filter(|p| options.is_supported(p)) {
                        if seen.insert(file.to_path_buf()) {
                            items.push(BatchItem::Skipped {
                                input: file.to_path_buf(),
                                reason: SkipReason::Unreadable(err.to_string()),
                            });
                        }
                    }
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            push_file(&mut items, &mut seen, entry.path(), Some(path), options);
        }
    }

    Ok(items)
}

fn push_file(
    items: &mut Vec<BatchItem>,
    seen: &mut HashSet<PathBuf>,
    file: &Path,
    root: Option<&Path>,
    options: &DiscoveryOptions,
) {
    if !seen.insert(file.to_path_buf()) {
        return;
    }

    let item = if options.is_supported(file) {
        BatchItem::Eligible {
            input: file.to_path_buf(),
            output: options.output_path(file, root),
        }
    } else {
        debug!("Skipping {:?}: unsupported extension", file);
        BatchItem::Skipped {
            input: file.to_path_buf(),
            reason: SkipReason::UnsupportedExtension,
        }
    };
    items.push(item);
}

fn is_workspace_dir(path: &Path, depth: usize) -> bool {
    depth > 0
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(WORKSPACE_PREFIX))
            .unwrap_or(false)
}
