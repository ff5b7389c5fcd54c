//! Domain-specific error types for the mirroring pipeline.
//!
//! All fallible operations return `Result<T, TapcastError>`.
//! No panics on invalid input — every error is typed and recoverable.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for tapcast.
#[derive(Debug, Error)]
pub enum TapcastError {
    // ── Transport Errors ─────────────────────────────────────────
    /// A device command exceeded its time budget.
    #[error("device command timed out after {0:?}")]
    TransportTimeout(Duration),

    /// A device command ran but exited with a non-zero status.
    #[error("device command exited with {code:?}: {stderr}")]
    CommandFailed {
        code: Option<i32>,
        stderr: String,
    },

    /// The channel returned no bytes where a payload was expected.
    #[error("device returned an empty payload")]
    EmptyPayload,

    /// The device command binary could not be located.
    #[error("command binary not found: {0}")]
    BinaryNotFound(String),

    /// No device in the ready state is attached to the channel.
    #[error("no device attached to the command channel")]
    DeviceUnavailable,

    /// Device output that should carry a known shape could not be parsed.
    #[error("could not parse {what} from device output: {output:?}")]
    MalformedOutput {
        what: &'static str,
        output: String,
    },

    // ── Pipeline Errors ──────────────────────────────────────────
    /// Bytes were received but are not a valid image container.
    #[error("frame decode failed: {0}")]
    Decode(String),

    /// A zero-sized dimension was passed to a geometry update.
    #[error("invalid geometry: {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    /// The presentation surface rejected an operation.
    #[error("surface error: {0}")]
    Surface(String),

    // ── Environment Errors ───────────────────────────────────────
    /// The OS process layer reported an error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TapcastError {
    /// Whether the error is a transient capture-path condition that the
    /// grabber absorbs into its health counter rather than surfacing.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TapcastError::TransportTimeout(_)
                | TapcastError::CommandFailed { .. }
                | TapcastError::EmptyPayload
                | TapcastError::Decode(_)
                | TapcastError::Io(_)
        )
    }
}
