//! Device command channel — the subprocess transport to the device.
//!
//! Every interaction with the device (capture, input injection,
//! resolution queries) goes through [`DeviceChannel::run`]: one named
//! command, captured stdout/stderr, bounded by a hard timeout.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::error::TapcastError;

// ── CommandOutput ────────────────────────────────────────────────

/// Captured result of one device command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Raw stdout bytes.
    pub stdout: Vec<u8>,
    /// Raw stderr bytes.
    pub stderr: Vec<u8>,
    /// Process exit code (`None` when killed by a signal).
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Whether the command exited cleanly.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout as lossy UTF-8 text.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// stderr as lossy UTF-8 text.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

// ── DeviceChannel ────────────────────────────────────────────────

/// Abstract transport executing commands against the remote device.
///
/// Implementations must be cheap to share across tasks; the capture
/// producer and the input path hold the same channel concurrently.
#[async_trait]
pub trait DeviceChannel: Send + Sync {
    /// Run `args` against the device and capture its output.
    ///
    /// Returns [`TapcastError::TransportTimeout`] when the command does
    /// not complete within `timeout`; the spawned process is killed,
    /// never left running.
    async fn run(&self, args: &[&str], timeout: Duration) -> Result<CommandOutput, TapcastError>;
}

// ── AdbChannel ───────────────────────────────────────────────────

/// [`DeviceChannel`] backed by the `adb` binary.
///
/// Each call spawns `adb <args>` with piped stdout/stderr. The child
/// is configured with `kill_on_drop` so a timed-out or cancelled call
/// terminates the process instead of leaving a zombie behind.
pub struct AdbChannel {
    binary: PathBuf,
}

impl AdbChannel {
    /// Create a channel using the given `adb` binary path.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Path of the underlying binary.
    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }
}

#[async_trait]
impl DeviceChannel for AdbChannel {
    async fn run(&self, args: &[&str], timeout: Duration) -> Result<CommandOutput, TapcastError> {
        trace!(?args, "running device command");

        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn()?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| TapcastError::TransportTimeout(timeout))??;

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────
