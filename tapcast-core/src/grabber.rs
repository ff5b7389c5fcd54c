//! Background frame capture with a bounded, freshest-wins buffer.
//!
//! The grabber owns the capture producer: a tokio task that pulls raw
//! screen images from the device, decodes them, and publishes them
//! through a small drop-oldest FIFO plus a last-known-frame cell. The
//! consumer polls [`FrameGrabber::read`] on its own cadence; neither
//! side ever blocks on the other.
//!
//! Capture errors are absorbed here — timeouts, bad exits, empty
//! payloads, and decode failures all increment a health counter and
//! produce nothing. Only [`FrameGrabber::stop`] ends the loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::decode::decode_frame;
use crate::device::Device;
use crate::error::TapcastError;
use crate::frame::Frame;

// ── GrabberConfig ────────────────────────────────────────────────

/// Tuning knobs for the capture loop.
#[derive(Debug, Clone)]
pub struct GrabberConfig {
    /// FIFO capacity (≥ 1); the oldest frame is dropped when full.
    pub capacity: usize,
    /// Per-attempt capture budget.
    pub capture_timeout: Duration,
    /// Consecutive failures before a cooldown pause.
    pub max_failures: u32,
    /// Pause after the failure threshold is reached.
    pub cooldown: Duration,
}

impl Default for GrabberConfig {
    fn default() -> Self {
        Self {
            capacity: 2,
            capture_timeout: Duration::from_secs(2),
            max_failures: 3,
            cooldown: Duration::from_secs(1),
        }
    }
}

// ── FrameQueue ───────────────────────────────────────────────────

/// Bounded FIFO of decoded frames with drop-oldest eviction.
///
/// Single producer, single consumer. The consumer wants freshness,
/// not completeness: when the queue is full, admitting a new frame
/// evicts the oldest one. Critical sections are pointer swaps only.
pub struct FrameQueue {
    frames: Mutex<VecDeque<Arc<Frame>>>,
    capacity: usize,
}

impl FrameQueue {
    /// Create a queue holding at most `capacity` frames (min 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    /// Admit a frame, evicting the oldest entry when full.
    pub fn push(&self, frame: Arc<Frame>) {
        let mut frames = self.lock();
        if frames.len() == self.capacity {
            frames.pop_front();
        }
        frames.push_back(frame);
    }

    /// Remove and return the oldest buffered frame.
    pub fn pop(&self) -> Option<Arc<Frame>> {
        self.lock().pop_front()
    }

    /// Number of buffered frames.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue holds no frames.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all buffered frames.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // `read()` must never panic: recover the guard even if the other
    // side poisoned the lock.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Arc<Frame>>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── CaptureHealth ────────────────────────────────────────────────

/// Consecutive-failure tracking for the capture loop.
///
/// Mutated only by the producer. Any success resets the counter;
/// reaching the threshold reports it exactly once and resets.
pub struct CaptureHealth {
    consecutive: u32,
    max_failures: u32,
}

impl CaptureHealth {
    /// Create a tracker that trips after `max_failures` (min 1).
    pub fn new(max_failures: u32) -> Self {
        Self {
            consecutive: 0,
            max_failures: max_failures.max(1),
        }
    }

    /// Record a successful capture.
    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Record a failed capture. Returns `true` when the threshold is
    /// reached; the counter resets so the next trip needs another full
    /// run of failures.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive += 1;
        if self.consecutive >= self.max_failures {
            self.consecutive = 0;
            true
        } else {
            false
        }
    }

    /// Current consecutive-failure count.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

// ── GrabberStats ─────────────────────────────────────────────────

/// Monotonic counters exposed to the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrabberStats {
    /// Frames successfully captured and decoded since start.
    pub produced: u64,
    /// Capture attempts that failed since start.
    pub failed: u64,
}

// ── FrameGrabber ─────────────────────────────────────────────────

struct Shared {
    queue: FrameQueue,
    last_frame: Mutex<Option<Arc<Frame>>>,
    running: AtomicBool,
    produced: AtomicU64,
    failed: AtomicU64,
}

impl Shared {
    fn last_frame(&self) -> MutexGuard<'_, Option<Arc<Frame>>> {
        self.last_frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner of the background capture loop.
///
/// `start()` spawns the producer on the tokio runtime; `read()` is a
/// non-blocking poll for the freshest frame; `stop()` halts the loop,
/// terminates any in-flight capture command, and releases buffered
/// frames. Dropping the grabber stops it.
pub struct FrameGrabber {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl FrameGrabber {
    /// Launch the capture loop against `device`.
    pub fn start(device: Device, config: GrabberConfig) -> Self {
        let shared = Arc::new(Shared {
            queue: FrameQueue::new(config.capacity),
            last_frame: Mutex::new(None),
            running: AtomicBool::new(true),
            produced: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        });

        let handle = tokio::spawn(capture_loop(device, Arc::clone(&shared), config));

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Return the freshest available frame without blocking.
    ///
    /// Yields the oldest buffered frame when the FIFO is non-empty,
    /// falls back to the last successfully decoded frame so the display
    /// never goes blank during a momentary gap, and returns `None` only
    /// when nothing has ever been captured (or after `stop()`).
    pub fn read(&self) -> Option<Arc<Frame>> {
        self.shared
            .queue
            .pop()
            .or_else(|| self.shared.last_frame().clone())
    }

    /// Whether the capture loop is still running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Production counters since `start()`.
    pub fn stats(&self) -> GrabberStats {
        GrabberStats {
            produced: self.shared.produced.load(Ordering::SeqCst),
            failed: self.shared.failed.load(Ordering::SeqCst),
        }
    }

    /// Halt the capture loop and release buffered frames.
    ///
    /// The producer task is aborted at its next await point; an
    /// in-flight capture command is killed rather than awaited.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.shared.queue.clear();
        *self.shared.last_frame() = None;
    }
}

impl Drop for FrameGrabber {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Capture loop ─────────────────────────────────────────────────

async fn capture_loop(device: Device, shared: Arc<Shared>, config: GrabberConfig) {
    let mut health = CaptureHealth::new(config.max_failures);
    info!(
        capacity = config.capacity,
        timeout = ?config.capture_timeout,
        "capture loop started"
    );

    while shared.running.load(Ordering::SeqCst) {
        match capture_once(&device, config.capture_timeout).await {
            Ok(frame) => {
                let frame = Arc::new(frame);
                health.record_success();
                shared.produced.fetch_add(1, Ordering::SeqCst);
                *shared.last_frame() = Some(Arc::clone(&frame));
                shared.queue.push(frame);
            }
            Err(err) => {
                shared.failed.fetch_add(1, Ordering::SeqCst);
                if health.record_failure() {
                    warn!(
                        error = %err,
                        threshold = config.max_failures,
                        cooldown = ?config.cooldown,
                        "repeated capture failures, cooling down"
                    );
                    tokio::time::sleep(config.cooldown).await;
                } else {
                    debug!(error = %err, "frame capture failed");
                }
            }
        }
    }

    info!("capture loop stopped");
}

async fn capture_once(device: &Device, timeout: Duration) -> Result<Frame, TapcastError> {
    let bytes = device.screencap(timeout).await?;
    decode_frame(&bytes)
}

// ── Tests ────────────────────────────────────────────────────────
