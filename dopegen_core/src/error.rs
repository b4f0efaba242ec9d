//! Error types for the annotation pipeline.

use dopegen_env::EnvError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or writing annotations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed line in a camera positions file (1-based line number)
    #[error("Camera file line {line}: {reason}")]
    CameraParse { line: usize, reason: String },

    /// Camera pose could not be inverted
    #[error("Camera pose is not invertible")]
    SingularPose,

    /// File system failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding failure
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding failure
    #[error("Image error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Error reported by the renderer session
    #[error(transparent)]
    Env(#[from] EnvError),
}

impl CoreError {
    /// Creates a camera parse error.
    pub fn camera_parse(line: usize, reason: impl Into<String>) -> Self {
        Self::CameraParse {
            line,
            reason: reason.into(),
        }
    }

    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
