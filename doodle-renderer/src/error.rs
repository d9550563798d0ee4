//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rasterizing or exporting a surface.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The pixel buffer could not be allocated (zero or oversized dimensions).
    #[error("Cannot allocate a {width}x{height} surface")]
    Surface {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Image encoding failed.
    #[error("Export failed: {0}")]
    Export(String),
}
