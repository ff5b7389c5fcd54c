//! Surface-to-device coordinate mapping.
//!
//! The presentation surface and the device rarely share a resolution;
//! every pointer event must be rescaled before it can drive a touch
//! command. The mapping is owned by the session and recomputed on
//! every surface resize — mapping through stale geometry is a caller
//! bug, not an environment condition.

use crate::error::TapcastError;

// ── ScreenGeometry ───────────────────────────────────────────────

/// Device-resolution-to-surface-size scale mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenGeometry {
    device_width: u32,
    device_height: u32,
    surface_width: u32,
    surface_height: u32,
    scale_x: f64,
    scale_y: f64,
}

impl ScreenGeometry {
    /// Build a mapping from device resolution and surface size.
    ///
    /// Fails with [`TapcastError::InvalidGeometry`] when any dimension
    /// is zero.
    pub fn new(
        device_width: u32,
        device_height: u32,
        surface_width: u32,
        surface_height: u32,
    ) -> Result<Self, TapcastError> {
        if device_width == 0 || device_height == 0 {
            return Err(TapcastError::InvalidGeometry {
                width: device_width,
                height: device_height,
            });
        }
        if surface_width == 0 || surface_height == 0 {
            return Err(TapcastError::InvalidGeometry {
                width: surface_width,
                height: surface_height,
            });
        }

        Ok(Self {
            device_width,
            device_height,
            surface_width,
            surface_height,
            scale_x: device_width as f64 / surface_width as f64,
            scale_y: device_height as f64 / surface_height as f64,
        })
    }

    /// Recompute the scales for a new surface size.
    ///
    /// Must be called on every resize or fullscreen toggle before any
    /// further mapping.
    pub fn update_surface(&mut self, width: u32, height: u32) -> Result<(), TapcastError> {
        *self = Self::new(self.device_width, self.device_height, width, height)?;
        Ok(())
    }

    /// Map surface coordinates to device pixel coordinates
    /// (truncated to integers).
    pub fn map(&self, x: u32, y: u32) -> (u32, u32) {
        (
            (x as f64 * self.scale_x) as u32,
            (y as f64 * self.scale_y) as u32,
        )
    }

    /// Device resolution.
    pub fn device_size(&self) -> (u32, u32) {
        (self.device_width, self.device_height)
    }

    /// Current surface size.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_width, self.surface_height)
    }

    /// `(scale_x, scale_y)` factors.
    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }
}

// ── Tests ────────────────────────────────────────────────────────
