//! Frame decoding — raw captured bytes into a [`Frame`].
//!
//! The device's capture command emits a standard image container
//! (PNG from `screencap -p`). Decoding normalises whatever arrives
//! to tightly-packed RGBA8.

use std::time::Instant;

use crate::error::TapcastError;
use crate::frame::Frame;

/// Decode raw captured bytes into a [`Frame`].
///
/// Pure and stateless — safe to call concurrently. Fails with
/// [`TapcastError::EmptyPayload`] for empty input and
/// [`TapcastError::Decode`] when the bytes are not a valid image
/// container.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, TapcastError> {
    if bytes.is_empty() {
        return Err(TapcastError::EmptyPayload);
    }

    let image = image::load_from_memory(bytes).map_err(|e| TapcastError::Decode(e.to_string()))?;
    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(Frame {
        width,
        height,
        data: rgba.into_raw(),
        captured_at: Instant::now(),
    })
}

// ── Tests ────────────────────────────────────────────────────────
