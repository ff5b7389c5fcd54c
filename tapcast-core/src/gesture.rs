//! Pointer-event classification into device touch gestures.
//!
//! A small state machine (`Idle` ⇄ `Dragging`) watches the raw
//! pointer stream from the presentation surface and emits high-level
//! [`TouchGesture`]s: taps, double-taps, incremental drag swipes, and
//! wheel-simulated scroll swipes. Timing decisions (double-tap
//! windows) use the timestamps carried by the events, so the machine
//! is deterministic under test.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::geometry::ScreenGeometry;

// ── Pointer events ───────────────────────────────────────────────

/// Raw pointer event from the presentation surface, in surface-local
/// coordinates.
#[derive(Debug, Clone, Copy)]
pub enum PointerEvent {
    /// Primary button pressed.
    Down { x: u32, y: u32, at: Instant },
    /// Pointer moved (reported only useful while a button is held).
    Moved { x: u32, y: u32, at: Instant },
    /// Primary button released.
    Up { at: Instant },
    /// Wheel turned; positive delta is "away from the user".
    Wheel { delta: f32, at: Instant },
}

// ── TouchGesture ─────────────────────────────────────────────────

/// A classified high-level touch action, in device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchGesture {
    /// Single tap.
    Tap { x: u32, y: u32 },
    /// Two taps a small interval apart at the same point.
    DoubleTap { x: u32, y: u32 },
    /// Finger travel between two points over a duration.
    Swipe {
        from: (u32, u32),
        to: (u32, u32),
        duration_ms: u64,
    },
}

// ── GestureConfig ────────────────────────────────────────────────

/// Timing and distance heuristics for gesture classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Two downs closer together than this are a double-tap.
    pub double_tap_window_ms: u64,
    /// Moves within this many surface pixels on both axes are jitter.
    pub min_drag_px: u32,
    /// Lower clamp for drag swipe durations.
    pub min_swipe_ms: u64,
    /// Upper clamp for drag swipe durations.
    pub max_swipe_ms: u64,
    /// Fixed duration of wheel-simulated scroll swipes.
    pub wheel_swipe_ms: u64,
    /// Emit a settling swipe when a drag ends (off: release is silent).
    pub emit_drag_end: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_tap_window_ms: 300,
            min_drag_px: 5,
            min_swipe_ms: 100,
            max_swipe_ms: 500,
            wheel_swipe_ms: 250,
            emit_drag_end: false,
        }
    }
}

// ── GestureTranslator ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging,
}

/// Classifies pointer events into [`TouchGesture`]s.
///
/// Single input source — no synchronization. Coordinates are mapped
/// through the caller's current [`ScreenGeometry`], so the geometry
/// must be up to date before events are fed in.
pub struct GestureTranslator {
    config: GestureConfig,
    state: DragState,
    last_x: u32,
    last_y: u32,
    /// Whether the current press has produced at least one swipe.
    dragged: bool,
    last_click: Option<Instant>,
}

impl GestureTranslator {
    /// Create a translator with the given heuristics.
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: DragState::Idle,
            last_x: 0,
            last_y: 0,
            dragged: false,
            last_click: None,
        }
    }

    /// Feed one pointer event; returns the gesture it classifies
    /// into, if any.
    pub fn on_event(
        &mut self,
        event: PointerEvent,
        geometry: &ScreenGeometry,
    ) -> Option<TouchGesture> {
        match event {
            PointerEvent::Down { x, y, at } => self.on_down(x, y, at, geometry),
            PointerEvent::Moved { x, y, .. } => self.on_moved(x, y, geometry),
            PointerEvent::Up { .. } => self.on_up(geometry),
            PointerEvent::Wheel { delta, .. } => self.on_wheel(delta, geometry),
        }
    }

    fn on_down(
        &mut self,
        x: u32,
        y: u32,
        at: Instant,
        geometry: &ScreenGeometry,
    ) -> Option<TouchGesture> {
        let double_tap_window = Duration::from_millis(self.config.double_tap_window_ms);
        let is_double = self
            .last_click
            .is_some_and(|prev| at.duration_since(prev) < double_tap_window);
        self.last_click = Some(at);

        self.state = DragState::Dragging;
        self.dragged = false;
        self.last_x = x;
        self.last_y = y;

        let (dx, dy) = geometry.map(x, y);
        Some(if is_double {
            TouchGesture::DoubleTap { x: dx, y: dy }
        } else {
            TouchGesture::Tap { x: dx, y: dy }
        })
    }

    fn on_moved(&mut self, x: u32, y: u32, geometry: &ScreenGeometry) -> Option<TouchGesture> {
        if self.state != DragState::Dragging {
            return None;
        }

        // Sub-threshold movement on both axes is jitter, not a drag.
        if x.abs_diff(self.last_x) <= self.config.min_drag_px
            && y.abs_diff(self.last_y) <= self.config.min_drag_px
        {
            return None;
        }

        let from = geometry.map(self.last_x, self.last_y);
        let to = geometry.map(x, y);
        self.last_x = x;
        self.last_y = y;
        self.dragged = true;

        Some(TouchGesture::Swipe {
            from,
            to,
            duration_ms: self.swipe_duration(from, to),
        })
    }

    fn on_up(&mut self, geometry: &ScreenGeometry) -> Option<TouchGesture> {
        let ended_drag = self.state == DragState::Dragging && self.dragged;
        self.state = DragState::Idle;

        if ended_drag && self.config.emit_drag_end {
            let point = geometry.map(self.last_x, self.last_y);
            Some(TouchGesture::Swipe {
                from: point,
                to: point,
                duration_ms: self.config.min_swipe_ms,
            })
        } else {
            None
        }
    }

    fn on_wheel(&mut self, delta: f32, geometry: &ScreenGeometry) -> Option<TouchGesture> {
        if delta == 0.0 {
            return None;
        }

        // Canned vertical swipe at the device's horizontal centre,
        // between 40% and 60% of its height. Wheel-up scrolls the view
        // up, which on a touchscreen is a downward finger drag.
        let (device_w, device_h) = geometry.device_size();
        let x = device_w / 2;
        let upper = device_h * 2 / 5;
        let lower = device_h * 3 / 5;
        let (y_from, y_to) = if delta > 0.0 {
            (upper, lower)
        } else {
            (lower, upper)
        };

        Some(TouchGesture::Swipe {
            from: (x, y_from),
            to: (x, y_to),
            duration_ms: self.config.wheel_swipe_ms,
        })
    }

    /// Swipe duration proportional to device-space travel distance,
    /// one millisecond per device pixel, clamped.
    fn swipe_duration(&self, from: (u32, u32), to: (u32, u32)) -> u64 {
        let dx = from.0 as f64 - to.0 as f64;
        let dy = from.1 as f64 - to.1 as f64;
        let distance = (dx * dx + dy * dy).sqrt();
        (distance as u64).clamp(self.config.min_swipe_ms, self.config.max_swipe_ms)
    }
}

// ── Tests ────────────────────────────────────────────────────────
