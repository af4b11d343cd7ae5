//! Renderer error types.

use thiserror::Error;

/// Render error types.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A miner reported without the expected fan reading. Fails the
    /// whole render cycle; the previous frame stays on screen.
    #[error("Miner {ip} is missing fan reading {fan}")]
    MissingFan { ip: String, fan: String },
}

/// Result type alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
