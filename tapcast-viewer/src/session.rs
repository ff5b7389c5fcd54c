//! Session controller — the cooperative render/input loop.
//!
//! Single-threaded and tick-driven: each tick shows the freshest
//! frame the grabber can offer, then drains the surface's event queue
//! in arrival order. The capture producer runs independently in the
//! background; losing it only ever degrades to a stale picture and a
//! "connection lost" indication, recovered through an explicit
//! reconnect.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use tapcast_core::{
    Device, FrameGrabber, GestureTranslator, GrabberConfig, PointerEvent, ScreenGeometry,
    TapcastError, TouchInjector,
};

use crate::config::ViewerConfig;
use crate::surface::{Surface, SurfaceEvent};

// ── FpsCounter ───────────────────────────────────────────────────

/// Rolling frames-per-second estimate over one-second windows.
struct FpsCounter {
    frames: u64,
    since: Instant,
    current: f64,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            since: Instant::now(),
            current: 0.0,
        }
    }

    /// Count `n` new frames; returns `true` when a window closed and
    /// the estimate was refreshed.
    fn record(&mut self, n: u64) -> bool {
        self.frames += n;
        let elapsed = self.since.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.current = self.frames as f64 / elapsed.as_secs_f64();
            self.frames = 0;
            self.since = Instant::now();
            true
        } else {
            false
        }
    }

    fn current(&self) -> f64 {
        self.current
    }
}

// ── SessionController ────────────────────────────────────────────

/// Orchestrates the grabber, the surface, and the input path.
pub struct SessionController<S: Surface> {
    surface: S,
    device: Device,
    grabber: FrameGrabber,
    grabber_config: GrabberConfig,
    geometry: ScreenGeometry,
    translator: GestureTranslator,
    injector: TouchInjector,
    base_title: String,
    lost_after_ticks: u32,
    ticks_without_frames: u32,
    last_produced: u64,
    connection_lost: bool,
    quit: bool,
    fps: FpsCounter,
}

impl<S: Surface> SessionController<S> {
    /// Build the session and launch its capture producer.
    pub fn new(
        surface: S,
        device: Device,
        geometry: ScreenGeometry,
        config: &ViewerConfig,
    ) -> Self {
        let grabber_config = config.capture.to_grabber_config();
        let grabber = FrameGrabber::start(device.clone(), grabber_config.clone());

        Self {
            surface,
            injector: TouchInjector::new(device.clone()),
            device,
            grabber,
            grabber_config,
            geometry,
            translator: GestureTranslator::new(config.input.clone()),
            base_title: config.display.title.clone(),
            lost_after_ticks: config.session.lost_after_ticks,
            ticks_without_frames: 0,
            last_produced: 0,
            connection_lost: false,
            quit: false,
            fps: FpsCounter::new(),
        }
    }

    /// Drive ticks until the surface asks to quit.
    pub async fn run(&mut self) -> Result<(), TapcastError> {
        info!("session started");
        while !self.quit {
            self.tick().await?;
            // Yield briefly so the capture task can make progress.
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        self.grabber.stop();
        info!("session ended");
        Ok(())
    }

    /// One cooperative loop iteration: render, then drain events.
    pub async fn tick(&mut self) -> Result<(), TapcastError> {
        match self.grabber.read() {
            Some(frame) => self.surface.present(&frame)?,
            None => self.surface.idle(),
        }

        self.observe_delivery();

        for event in self.surface.poll_events() {
            self.handle_event(event).await?;
        }
        Ok(())
    }

    /// Whether the session currently reports the device link as lost.
    pub fn connection_lost(&self) -> bool {
        self.connection_lost
    }

    /// Whether a quit has been requested.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Current coordinate mapping.
    pub fn geometry(&self) -> &ScreenGeometry {
        &self.geometry
    }

    // ── Internal ─────────────────────────────────────────────────

    /// Track fresh-frame delivery for loss detection and FPS.
    fn observe_delivery(&mut self) {
        let produced = self.grabber.stats().produced;
        let fresh = produced.saturating_sub(self.last_produced);
        self.last_produced = produced;

        if fresh > 0 {
            self.ticks_without_frames = 0;
            if self.connection_lost {
                self.connection_lost = false;
                info!("frame delivery resumed");
                self.surface.set_title(&self.base_title);
            }
            if self.fps.record(fresh) {
                debug!(fps = self.fps.current(), "render rate");
                let title = format!("{} — {:.1} fps", self.base_title, self.fps.current());
                self.surface.set_title(&title);
            }
        } else {
            self.ticks_without_frames += 1;
            if !self.connection_lost && self.ticks_without_frames >= self.lost_after_ticks {
                self.connection_lost = true;
                warn!(
                    ticks = self.ticks_without_frames,
                    "no frames from the device; connection lost (reconnect to recover)"
                );
                let title = format!("{} — connection lost", self.base_title);
                self.surface.set_title(&title);
            }
        }
    }

    async fn handle_event(&mut self, event: SurfaceEvent) -> Result<(), TapcastError> {
        match event {
            SurfaceEvent::Resized { width, height } => {
                // Minimised surfaces report zero; keep the previous
                // mapping until a real size arrives.
                if width > 0 && height > 0 {
                    self.geometry.update_surface(width, height)?;
                    debug!(width, height, "surface resized");
                }
            }
            SurfaceEvent::ReconnectRequested => self.reconnect().await,
            SurfaceEvent::CloseRequested => self.quit = true,
            SurfaceEvent::PointerDown { x, y, at } => {
                self.pointer(PointerEvent::Down { x, y, at }).await;
            }
            SurfaceEvent::PointerMoved { x, y, at } => {
                self.pointer(PointerEvent::Moved { x, y, at }).await;
            }
            SurfaceEvent::PointerUp { at } => {
                self.pointer(PointerEvent::Up { at }).await;
            }
            SurfaceEvent::Wheel { delta, at } => {
                self.pointer(PointerEvent::Wheel { delta, at }).await;
            }
        }
        Ok(())
    }

    async fn pointer(&mut self, event: PointerEvent) {
        if let Some(gesture) = self.translator.on_event(event, &self.geometry) {
            self.injector.send(gesture).await;
        }
    }

    /// Stop the grabber, re-validate the device link, start fresh.
    async fn reconnect(&mut self) {
        info!("reconnect requested");
        self.grabber.stop();

        match self.device.ensure_attached().await {
            Ok(()) => {
                self.grabber =
                    FrameGrabber::start(self.device.clone(), self.grabber_config.clone());
                self.ticks_without_frames = 0;
                self.last_produced = 0;
                self.connection_lost = false;
                self.surface.set_title(&self.base_title);
                info!("capture restarted");
            }
            Err(err) => {
                warn!(error = %err, "reconnect failed; device still unavailable");
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_counter_waits_for_a_full_window() {
        let mut fps = FpsCounter::new();
        assert!(!fps.record(10));
        assert!(!fps.record(10));
        assert_eq!(fps.current(), 0.0);
    }
}
