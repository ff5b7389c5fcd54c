//! # tapcast-core
//!
//! Live-mirroring pipeline for a remote touchscreen device reached
//! through a command-based transport (an `adb`-style subprocess link).
//!
//! ## Architecture
//!
//! ```text
//! DEVICE                                   DESKTOP
//! ┌──────────────────────────┐            ┌───────────────────────┐
//! │ DeviceChannel::run       │  capture   │ FrameGrabber (task)   │
//! │   (screencap → PNG)      │ ─────────► │   decode_frame        │
//! │                          │            │   FrameQueue + last   │
//! │                          │            │     ↓ read()          │
//! │ input tap / swipe        │  ◄──────── │ Session render loop   │
//! └──────────────────────────┘   inject   └───────────────────────┘
//!
//! Pointer events: Surface ─► ScreenGeometry ─► GestureTranslator
//!                 ─► TouchInjector ─► DeviceChannel
//! ```
//!
//! ## Modules
//!
//! | Module     | Purpose                                             |
//! |------------|-----------------------------------------------------|
//! | `channel`  | Subprocess command transport to the device          |
//! | `device`   | Typed device operations (capture, input, queries)   |
//! | `frame`    | Decoded frame representation                        |
//! | `decode`   | Raw capture bytes → [`Frame`]                       |
//! | `grabber`  | Background capture loop with drop-oldest buffering  |
//! | `geometry` | Surface-to-device coordinate mapping                |
//! | `gesture`  | Pointer-event classification into touch gestures    |
//! | `inject`   | Best-effort gesture delivery                        |
//! | `error`    | `TapcastError` — typed, `thiserror`-based hierarchy |

pub mod channel;
pub mod decode;
pub mod device;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod gesture;
pub mod grabber;
pub mod inject;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use channel::{AdbChannel, CommandOutput, DeviceChannel};
pub use decode::decode_frame;
pub use device::Device;
pub use error::TapcastError;
pub use frame::Frame;
pub use geometry::ScreenGeometry;
pub use gesture::{GestureConfig, GestureTranslator, PointerEvent, TouchGesture};
pub use grabber::{CaptureHealth, FrameGrabber, FrameQueue, GrabberConfig, GrabberStats};
pub use inject::TouchInjector;
