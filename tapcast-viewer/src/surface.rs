//! Presentation surface — the window the mirror renders into.
//!
//! The session talks to an abstract [`Surface`] so the render loop
//! can be driven by a scripted fake under test. The real surface is a
//! minifb window: frames are converted to the 0RGB `u32` buffer
//! minifb expects and stretched to the window, and input state is
//! polled once per tick into an explicit event queue so pointer
//! events and rendering stay ordered.

use std::time::Instant;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, ScaleMode, Window, WindowOptions};

use tapcast_core::{Frame, TapcastError};

// ── SurfaceEvent ─────────────────────────────────────────────────

/// Event emitted by the presentation surface, in surface-local
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// Primary button pressed.
    PointerDown { x: u32, y: u32, at: Instant },
    /// Pointer moved while the button is held.
    PointerMoved { x: u32, y: u32, at: Instant },
    /// Primary button released.
    PointerUp { at: Instant },
    /// Wheel turned.
    Wheel { delta: f32, at: Instant },
    /// Surface size changed (covers fullscreen transitions).
    Resized { width: u32, height: u32 },
    /// The user asked for a capture restart.
    ReconnectRequested,
    /// The user asked to quit.
    CloseRequested,
}

// ── Surface ──────────────────────────────────────────────────────

/// A render target that can show frames and report pointer activity.
pub trait Surface {
    /// Show a frame, stretched to the current surface size.
    fn present(&mut self, frame: &Frame) -> Result<(), TapcastError>;

    /// Tick the surface without new frame content (keeps the event
    /// pump alive while the capture side is dry).
    fn idle(&mut self);

    /// Drain the events accumulated since the previous poll, in
    /// arrival order.
    fn poll_events(&mut self) -> Vec<SurfaceEvent>;

    /// Current surface size in pixels.
    fn size(&self) -> (u32, u32);

    /// Update the title bar text.
    fn set_title(&mut self, title: &str);
}

// ── MinifbSurface ────────────────────────────────────────────────

/// [`Surface`] backed by a resizable minifb window.
pub struct MinifbSurface {
    window: Window,
    /// Scratch 0x00RRGGBB buffer reused between frames.
    pixels: Vec<u32>,
    size: (u32, u32),
    mouse_down: bool,
}

impl MinifbSurface {
    /// Open the window.
    pub fn create(
        title: &str,
        width: u32,
        height: u32,
        target_fps: usize,
    ) -> Result<Self, TapcastError> {
        let mut window = Window::new(
            title,
            width as usize,
            height as usize,
            WindowOptions {
                resize: true,
                scale_mode: ScaleMode::Stretch,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| TapcastError::Surface(e.to_string()))?;
        window.set_target_fps(target_fps);

        Ok(Self {
            window,
            pixels: Vec::new(),
            size: (width, height),
            mouse_down: false,
        })
    }
}

impl Surface for MinifbSurface {
    fn present(&mut self, frame: &Frame) -> Result<(), TapcastError> {
        self.pixels.clear();
        self.pixels.reserve(frame.width as usize * frame.height as usize);
        for px in frame.data.chunks_exact(4) {
            self.pixels
                .push(((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32);
        }

        self.window
            .update_with_buffer(&self.pixels, frame.width as usize, frame.height as usize)
            .map_err(|e| TapcastError::Surface(e.to_string()))
    }

    fn idle(&mut self) {
        self.window.update();
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();
        let now = Instant::now();

        // Size first: geometry updates must precede pointer mapping.
        let (w, h) = self.window.get_size();
        let current = (w as u32, h as u32);
        if current != self.size {
            self.size = current;
            events.push(SurfaceEvent::Resized {
                width: current.0,
                height: current.1,
            });
        }

        // Pointer transitions derived from the polled button state.
        let down = self.window.get_mouse_down(MouseButton::Left);
        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            let (x, y) = (mx.max(0.0) as u32, my.max(0.0) as u32);
            if down && !self.mouse_down {
                events.push(SurfaceEvent::PointerDown { x, y, at: now });
            } else if down {
                events.push(SurfaceEvent::PointerMoved { x, y, at: now });
            }
        }
        if !down && self.mouse_down {
            events.push(SurfaceEvent::PointerUp { at: now });
        }
        self.mouse_down = down;

        if let Some((_sx, sy)) = self.window.get_scroll_wheel() {
            if sy != 0.0 {
                events.push(SurfaceEvent::Wheel { delta: sy, at: now });
            }
        }

        if self.window.is_key_pressed(Key::R, KeyRepeat::No) {
            events.push(SurfaceEvent::ReconnectRequested);
        }
        if !self.window.is_open()
            || self.window.is_key_pressed(Key::Q, KeyRepeat::No)
            || self.window.is_key_pressed(Key::Escape, KeyRepeat::No)
        {
            events.push(SurfaceEvent::CloseRequested);
        }

        events
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}
