use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures while probing a source or running ffmpeg.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// ffmpeg or ffprobe could not be found or started.
    #[error("{tool} not found (is it installed and on PATH?)")]
    ToolNotFound { tool: String },

    /// The tool ran but exited unsuccessfully.
    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("unexpected {tool} output: {message}")]
    ParseError { tool: String, message: String },

    #[error("no such file: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// ffprobe printed something that is not the JSON we asked for.
    #[error("malformed ffprobe JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidInput(String),

    /// Staging directory could not be created or its output moved into place.
    #[error("output staging failed: {0}")]
    Workspace(String),
}

impl Error {
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Whether the error is about the source file rather than the toolchain
    /// or the destination.
    pub fn is_source_problem(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound { .. }
                | Error::ParseError { .. }
                | Error::Json(_)
                | Error::ToolFailed { .. }
        )
    }

    /// Spawning a missing binary becomes `ToolNotFound`.
    pub(crate) fn from_spawn(tool: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::tool_not_found(tool)
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::tool_not_found("ffprobe").to_string(),
            "ffprobe not found (is it installed and on PATH?)"
        );
        assert_eq!(
            Error::tool_failed("ffmpeg", "exit status: 1").to_string(),
            "ffmpeg failed: exit status: 1"
        );
    }

    #[test]
    fn test_spawn_not_found_maps_to_tool() {
        let err = Error::from_spawn(
            "ffmpeg",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, Error::ToolNotFound { ref tool } if tool == "ffmpeg"));
        assert!(!err.is_source_problem());

        let err = Error::from_spawn(
            "ffmpeg",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_source_problems() {
        assert!(Error::file_not_found("/x.avi").is_source_problem());
        assert!(Error::tool_failed("ffprobe", "Invalid data").is_source_problem());
        assert!(!Error::Workspace("disk full".into()).is_source_problem());
    }
}
