//! Error types for the transport layer.

use std::io;

/// Errors that can occur while encoding or decoding debugger frames.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An I/O error occurred while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The frame exceeds the configured maximum size.
    #[error("frame size {size} exceeds maximum allowed {max}")]
    FrameTooLarge {
        /// The observed frame size.
        size: usize,
        /// The maximum allowed size.
        max: usize,
    },

    /// Failed to serialize the outgoing message to JSON.
    #[error("JSON serialization failed: {0}")]
    JsonSerialize(#[source] serde_json::Error),
}
