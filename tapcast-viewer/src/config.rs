//! Viewer configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tapcast_core::{GestureConfig, GrabberConfig};

/// Top-level configuration for the viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Device command channel settings.
    pub device: DeviceConfig,
    /// Capture loop tuning.
    pub capture: CaptureConfig,
    /// Gesture classification heuristics.
    pub input: GestureConfig,
    /// Window settings.
    pub display: DisplayConfig,
    /// Render loop behaviour.
    pub session: SessionConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Device command channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Path to the adb binary; empty means "discover on PATH".
    pub adb_path: String,
    /// Budget for short commands (queries, taps, swipes) in ms.
    pub command_timeout_ms: u64,
    /// Resolution assumed when the device query fails.
    pub fallback_width: u32,
    /// Resolution assumed when the device query fails.
    pub fallback_height: u32,
}

/// Capture loop tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frame FIFO capacity before drop-oldest eviction.
    pub buffer_capacity: usize,
    /// Per-attempt capture budget in ms.
    pub capture_timeout_ms: u64,
    /// Consecutive failures before a cooldown pause.
    pub max_failures: u32,
    /// Cooldown pause in ms.
    pub cooldown_ms: u64,
}

/// Window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Initial window height; width follows the device aspect.
    pub window_height: u32,
    /// Window title.
    pub title: String,
}

/// Render loop behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Render ticks per second.
    pub target_fps: usize,
    /// Ticks without a fresh frame before the session reports the
    /// connection as lost.
    pub lost_after_ticks: u32,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (overridden by `RUST_LOG`).
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            capture: CaptureConfig::default(),
            input: GestureConfig::default(),
            display: DisplayConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: String::new(),
            command_timeout_ms: 2000,
            fallback_width: 1080,
            fallback_height: 1920,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 2,
            capture_timeout_ms: 2000,
            max_failures: 3,
            cooldown_ms: 1000,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_height: 800,
            title: "Tapcast".into(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            lost_after_ticks: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────

impl CaptureConfig {
    /// View as the core grabber's configuration.
    pub fn to_grabber_config(&self) -> GrabberConfig {
        GrabberConfig {
            capacity: self.buffer_capacity,
            capture_timeout: Duration::from_millis(self.capture_timeout_ms),
            max_failures: self.max_failures,
            cooldown: Duration::from_millis(self.cooldown_ms),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ViewerConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = ViewerConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("buffer_capacity"));
        assert!(text.contains("double_tap_window_ms"));
        assert!(text.contains("window_height"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = ViewerConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ViewerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.display.window_height, 800);
        assert_eq!(parsed.capture.max_failures, 3);
        assert_eq!(parsed.input.min_drag_px, 5);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let parsed: ViewerConfig = toml::from_str(
            r#"
            [capture]
            buffer_capacity = 4
            "#,
        )
        .unwrap();
        assert_eq!(parsed.capture.buffer_capacity, 4);
        assert_eq!(parsed.capture.max_failures, 3);
        assert_eq!(parsed.session.target_fps, 60);
    }

    #[test]
    fn grabber_config_conversion() {
        let capture = CaptureConfig {
            capture_timeout_ms: 1500,
            ..CaptureConfig::default()
        };
        let grabber = capture.to_grabber_config();
        assert_eq!(grabber.capture_timeout, Duration::from_millis(1500));
        assert_eq!(grabber.capacity, 2);
    }
}
