//! Typed operations against the remote device.
//!
//! Wraps a [`DeviceChannel`] with the concrete commands the pipeline
//! needs: attachment checks, resolution queries, screen capture, and
//! touch input. All coordinate arguments are device pixels.

use std::sync::Arc;
use std::time::Duration;

use crate::channel::{CommandOutput, DeviceChannel};
use crate::error::TapcastError;

// ── Device ───────────────────────────────────────────────────────

/// Handle to the remote device behind a command channel.
///
/// Cheap to clone — the capture producer and the input path each hold
/// their own copy over the same underlying channel.
#[derive(Clone)]
pub struct Device {
    channel: Arc<dyn DeviceChannel>,
    command_timeout: Duration,
}

impl Device {
    /// Create a device handle.
    ///
    /// `command_timeout` bounds every short command (queries, taps,
    /// swipes); frame capture passes its own budget per call.
    pub fn new(channel: Arc<dyn DeviceChannel>, command_timeout: Duration) -> Self {
        Self {
            channel,
            command_timeout,
        }
    }

    /// Verify that a device in the ready state is attached.
    pub async fn ensure_attached(&self) -> Result<(), TapcastError> {
        let out = self.run_checked(&["devices"]).await?;
        let listing = out.stdout_text();

        // First line is the "List of devices attached" banner; a ready
        // device reports the state "device" in its second column.
        let attached = listing
            .lines()
            .skip(1)
            .any(|line| line.split_whitespace().nth(1) == Some("device"));

        if attached {
            Ok(())
        } else {
            Err(TapcastError::DeviceUnavailable)
        }
    }

    /// Query the device display resolution in pixels.
    pub async fn resolution(&self) -> Result<(u32, u32), TapcastError> {
        let out = self.run_checked(&["shell", "wm", "size"]).await?;
        parse_wm_size(&out.stdout_text())
    }

    /// Capture one raw screen image as PNG bytes.
    ///
    /// `timeout` is the per-attempt capture budget.
    pub async fn screencap(&self, timeout: Duration) -> Result<Vec<u8>, TapcastError> {
        let out = self
            .channel
            .run(&["exec-out", "screencap", "-p"], timeout)
            .await?;
        if !out.success() {
            return Err(TapcastError::CommandFailed {
                code: out.exit_code,
                stderr: out.stderr_text(),
            });
        }
        if out.stdout.is_empty() {
            return Err(TapcastError::EmptyPayload);
        }
        Ok(out.stdout)
    }

    /// Issue a touchscreen tap at `(x, y)`.
    pub async fn tap(&self, x: u32, y: u32) -> Result<(), TapcastError> {
        let (xs, ys) = (x.to_string(), y.to_string());
        self.run_checked(&["shell", "input", "touchscreen", "tap", &xs, &ys])
            .await?;
        Ok(())
    }

    /// Issue a touchscreen swipe between two points with a duration
    /// in milliseconds.
    pub async fn swipe(
        &self,
        from: (u32, u32),
        to: (u32, u32),
        duration_ms: u64,
    ) -> Result<(), TapcastError> {
        let (x1, y1) = (from.0.to_string(), from.1.to_string());
        let (x2, y2) = (to.0.to_string(), to.1.to_string());
        let dur = duration_ms.to_string();
        self.run_checked(&[
            "shell",
            "input",
            "touchscreen",
            "swipe",
            &x1,
            &y1,
            &x2,
            &y2,
            &dur,
        ])
        .await?;
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────

    async fn run_checked(&self, args: &[&str]) -> Result<CommandOutput, TapcastError> {
        let out = self.channel.run(args, self.command_timeout).await?;
        if !out.success() {
            return Err(TapcastError::CommandFailed {
                code: out.exit_code,
                stderr: out.stderr_text(),
            });
        }
        Ok(out)
    }
}

// ── Output parsing ───────────────────────────────────────────────

/// Parse `wm size` output into `(width, height)`.
///
/// The output is `Physical size: 1080x1920`, possibly followed by an
/// `Override size: WxH` line when a different resolution is active;
/// the last reported size wins.
fn parse_wm_size(text: &str) -> Result<(u32, u32), TapcastError> {
    let malformed = || TapcastError::MalformedOutput {
        what: "display resolution",
        output: text.trim().to_string(),
    };

    let token = text.split_whitespace().last().ok_or_else(malformed)?;
    let (w, h) = token.split_once('x').ok_or_else(malformed)?;
    let width = w.parse::<u32>().map_err(|_| malformed())?;
    let height = h.parse::<u32>().map_err(|_| malformed())?;
    Ok((width, height))
}

// ── Tests ────────────────────────────────────────────────────────
