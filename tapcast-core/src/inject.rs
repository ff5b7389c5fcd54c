//! Best-effort delivery of touch gestures to the device.
//!
//! Input is fire-and-forget: a failed send is logged and swallowed,
//! never retried — a missed tap is preferable to a blocked input loop.

use std::time::Duration;

use tracing::warn;

use crate::device::Device;
use crate::error::TapcastError;
use crate::gesture::TouchGesture;

/// Pause between the two taps of a double-tap.
const DOUBLE_TAP_GAP: Duration = Duration::from_millis(60);

// ── TouchInjector ────────────────────────────────────────────────

/// Sends classified gestures through the device command channel.
pub struct TouchInjector {
    device: Device,
}

impl TouchInjector {
    /// Create an injector over the given device handle.
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    /// Deliver a gesture to the device, best-effort.
    ///
    /// Failures are logged at `warn` and otherwise ignored.
    pub async fn send(&self, gesture: TouchGesture) {
        if let Err(err) = self.dispatch(gesture).await {
            warn!(error = %err, gesture = ?gesture, "failed to deliver touch gesture");
        }
    }

    async fn dispatch(&self, gesture: TouchGesture) -> Result<(), TapcastError> {
        match gesture {
            TouchGesture::Tap { x, y } => self.device.tap(x, y).await,
            TouchGesture::DoubleTap { x, y } => {
                self.device.tap(x, y).await?;
                tokio::time::sleep(DOUBLE_TAP_GAP).await;
                self.device.tap(x, y).await
            }
            TouchGesture::Swipe {
                from,
                to,
                duration_ms,
            } => self.device.swipe(from, to, duration_ms).await,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
