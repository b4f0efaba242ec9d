//! Error types for the dopegen renderer session.

use thiserror::Error;

/// Errors that can occur while talking to the renderer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The render call itself failed
    #[error("Render error: {0}")]
    RenderError(String),

    /// An object index outside the loaded scene was addressed
    #[error("Unknown object index {index} (scene has {count} objects)")]
    UnknownObject { index: usize, count: usize },

    /// Resolution with a zero dimension
    #[error("Invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    /// Render output buffers do not match the declared frame size
    #[error("Buffer size mismatch: expected {expected} elements, got {actual}")]
    BufferSize { expected: usize, actual: usize },
}

impl EnvError {
    /// Creates a render error.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::RenderError(msg.into())
    }
}
