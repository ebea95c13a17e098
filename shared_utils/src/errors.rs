use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CutterError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("FFprobe failed: {0}")]
    FFprobeError(String),

    #[error("FFmpeg failed: {0}")]
    FFmpegError(String),

    #[error("Invalid timecode '{input}': {reason}")]
    InvalidTimecode { input: String, reason: String },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Please set in/out points or apply a transformation before exporting.")]
    NoEdits,

    #[error("Unsupported output container '.{0}' (expected mp4, avi, mkv or the input's extension)")]
    UnsupportedContainer(String),

    #[error("Input and output paths are identical: {}", .0.display())]
    PathConflict(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Unknown transform: {0}")]
    UnknownTransform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CutterError {
    pub fn invalid_timecode(input: &str, reason: impl Into<String>) -> Self {
        CutterError::InvalidTimecode {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Errors caused by user input rather than the environment.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            CutterError::InvalidTimecode { .. }
                | CutterError::InvalidRange(_)
                | CutterError::NoEdits
                | CutterError::UnsupportedContainer(_)
                | CutterError::PathConflict(_)
                | CutterError::InvalidPath(_)
                | CutterError::UnknownTransform(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CutterError>;
