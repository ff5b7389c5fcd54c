//! # tapcast-viewer — Device Mirror Window
//!
//! Runs on the desktop. Pulls screen frames from the device through
//! `tapcast-core`'s capture pipeline, renders them into a resizable
//! window, and translates local mouse gestures back into device touch
//! commands.

pub mod config;
pub mod session;
pub mod surface;
