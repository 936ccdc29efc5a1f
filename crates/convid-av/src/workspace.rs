//! Staging area for transcode output.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Workspace for a single transcode.
///
/// ffmpeg writes into a hidden temporary directory next to the destination,
/// and the result is renamed into place only once the encode succeeded. A
/// failed or interrupted encode therefore never leaves a truncated MP4 at the
/// destination, and the rename stays on one filesystem.
///
/// # Example
///
/// ```no_run
/// use convid_av::Workspace;
///
/// let workspace = Workspace::for_destination("/videos/holiday.mp4")?;
/// // Run ffmpeg writing to workspace.output()
/// workspace.finalize()?;
/// # Ok::<(), convid_av::Error>(())
/// ```
pub struct Workspace {
    temp_dir: TempDir,
    destination: PathBuf,
    output_path: PathBuf,
}

impl Workspace {
    /// Create a workspace whose output will end up at `destination`.
    pub fn for_destination<P: AsRef<Path>>(destination: P) -> Result<Self> {
        let destination = destination.as_ref();

        let file_name = destination
            .file_name()
            .ok_or_else(|| Error::InvalidInput("Invalid destination file path".to_string()))?;

        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| {
            Error::Workspace(format!("Failed to create directory {:?}: {}", parent, e))
        })?;

        let temp_dir = tempfile::Builder::new()
            .prefix(".convid-")
            .tempdir_in(&parent)
            .map_err(|e| Error::Workspace(e.to_string()))?;
        let output_path = temp_dir.path().join(file_name);

        Ok(Self {
            temp_dir,
            destination: destination.to_path_buf(),
            output_path,
        })
    }

    /// Final location of the output.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Path ffmpeg should write to.
    pub fn output(&self) -> &Path {
        &self.output_path
    }

    /// Get the temp directory path.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Move the output to its destination.
    ///
    /// An existing destination (including the source itself for in-place
    /// conversions) is backed up first and restored if the move fails.
    pub fn finalize(self) -> Result<PathBuf> {
        let dest = &self.destination;

        if !self.output_path.exists() {
            return Err(Error::Workspace(format!(
                "Output file does not exist: {:?}",
                self.output_path
            )));
        }

        if dest.exists() {
            let backup = self.temp_dir.path().join(".backup");
            std::fs::rename(dest, &backup).map_err(|e| {
                Error::Workspace(format!("Failed to create backup of existing file: {}", e))
            })?;

            if let Err(e) = std::fs::rename(&self.output_path, dest) {
                let _ = std::fs::rename(&backup, dest);
                return Err(Error::Workspace(format!(
                    "Failed to move output to destination: {}",
                    e
                )));
            }
        } else {
            std::fs::rename(&self.output_path, dest).map_err(|e| {
                Error::Workspace(format!("Failed to move output to destination: {}", e))
            })?;
        }

        Ok(dest.to_path_buf())
    }

    /// Clean up without finalizing (discard output).
    pub fn cleanup(self) {
        drop(self.temp_dir);
    }
}
