//! Session controller tests — render loop, loss detection, and
//! input translation over a scripted surface and device channel.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use tapcast_core::{CommandOutput, Device, DeviceChannel, Frame, TapcastError};
use tapcast_viewer::config::ViewerConfig;
use tapcast_viewer::session::SessionController;
use tapcast_viewer::surface::{Surface, SurfaceEvent};

// ── Fake device channel ──────────────────────────────────────────

#[derive(Clone)]
enum CaptureMode {
    /// Capture calls stall briefly, then report a timeout.
    Stall,
    /// Capture calls deliver this image.
    Frame(Vec<u8>),
}

struct FakeChannel {
    mode: Mutex<CaptureMode>,
    inputs: Mutex<Vec<String>>,
}

impl FakeChannel {
    fn new(mode: CaptureMode) -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(mode),
            inputs: Mutex::new(Vec::new()),
        })
    }

    fn set_mode(&self, mode: CaptureMode) {
        *self.mode.lock().unwrap() = mode;
    }

    fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceChannel for FakeChannel {
    async fn run(&self, args: &[&str], _timeout: Duration) -> Result<CommandOutput, TapcastError> {
        let ok = |stdout: Vec<u8>| CommandOutput {
            stdout,
            stderr: Vec::new(),
            exit_code: Some(0),
        };

        match args.first().copied() {
            Some("exec-out") => {
                let mode = self.mode.lock().unwrap().clone();
                match mode {
                    CaptureMode::Stall => {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Err(TapcastError::TransportTimeout(Duration::from_millis(5)))
                    }
                    CaptureMode::Frame(bytes) => {
                        // Real adb capture is genuine async I/O and always
                        // reaches a yield point; the fake must too, or the
                        // capture loop's poll never returns and starves the
                        // single-threaded test runtime.
                        tokio::task::yield_now().await;
                        Ok(ok(bytes))
                    }
                }
            }
            Some("devices") => Ok(ok(
                b"List of devices attached\nemulator-5554\tdevice\n".to_vec(),
            )),
            _ => {
                self.inputs.lock().unwrap().push(args.join(" "));
                Ok(ok(Vec::new()))
            }
        }
    }
}

// ── Fake surface ─────────────────────────────────────────────────

#[derive(Default)]
struct SurfaceState {
    presented: usize,
    idled: usize,
    titles: Vec<String>,
}

struct FakeSurface {
    state: Arc<Mutex<SurfaceState>>,
    script: VecDeque<Vec<SurfaceEvent>>,
    size: (u32, u32),
}

impl FakeSurface {
    fn new(script: Vec<Vec<SurfaceEvent>>) -> (Self, Arc<Mutex<SurfaceState>>) {
        let state = Arc::new(Mutex::new(SurfaceState::default()));
        (
            Self {
                state: Arc::clone(&state),
                script: script.into(),
                size: (400, 711),
            },
            state,
        )
    }
}

impl Surface for FakeSurface {
    fn present(&mut self, _frame: &Frame) -> Result<(), TapcastError> {
        self.state.lock().unwrap().presented += 1;
        Ok(())
    }

    fn idle(&mut self) {
        self.state.lock().unwrap().idled += 1;
    }

    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        self.script.pop_front().unwrap_or_default()
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_title(&mut self, title: &str) {
        self.state.lock().unwrap().titles.push(title.to_string());
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn png_bytes(fill: u8) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([fill, 0, 0, 255]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn test_config() -> ViewerConfig {
    let mut config = ViewerConfig::default();
    config.session.lost_after_ticks = 3;
    config.capture.cooldown_ms = 1;
    config
}

fn session(
    channel: Arc<FakeChannel>,
    surface: FakeSurface,
    config: &ViewerConfig,
) -> SessionController<FakeSurface> {
    let device = Device::new(channel, Duration::from_secs(2));
    let geometry = tapcast_core::ScreenGeometry::new(1080, 1920, 400, 711).unwrap();
    SessionController::new(surface, device, geometry, config)
}

// ── Tests ────────────────────────────────────────────────────────

#[tokio::test]
async fn stalled_capture_surfaces_connection_lost() {
    let channel = FakeChannel::new(CaptureMode::Stall);
    let (surface, state) = FakeSurface::new(Vec::new());
    let config = test_config();
    let mut session = session(channel, surface, &config);

    for _ in 0..3 {
        assert!(!session.connection_lost());
        session.tick().await.unwrap();
    }

    assert!(session.connection_lost());
    assert!(!session.quit_requested());

    let state = state.lock().unwrap();
    assert_eq!(state.presented, 0);
    assert_eq!(state.idled, 3);
    assert!(state.titles.iter().any(|t| t.contains("connection lost")));
}

#[tokio::test]
async fn pointer_events_become_device_input() {
    let base = Instant::now();
    let script = vec![vec![
        SurfaceEvent::PointerDown {
            x: 100,
            y: 100,
            at: base,
        },
        SurfaceEvent::PointerMoved {
            x: 150,
            y: 100,
            at: base,
        },
        SurfaceEvent::PointerUp { at: base },
    ]];

    let channel = FakeChannel::new(CaptureMode::Stall);
    let (surface, _state) = FakeSurface::new(script);
    let config = test_config();
    let mut session = session(channel.clone(), surface, &config);

    session.tick().await.unwrap();

    let inputs = channel.inputs();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0], "shell input touchscreen tap 270 270");
    assert!(inputs[1].starts_with("shell input touchscreen swipe 270 270 405 270"));
}

#[tokio::test]
async fn resize_rescales_pointer_mapping() {
    let base = Instant::now();
    let script = vec![
        vec![SurfaceEvent::Resized {
            width: 1080,
            height: 1920,
        }],
        vec![SurfaceEvent::PointerDown {
            x: 100,
            y: 100,
            at: base,
        }],
    ];

    let channel = FakeChannel::new(CaptureMode::Stall);
    let (surface, _state) = FakeSurface::new(script);
    let config = test_config();
    let mut session = session(channel.clone(), surface, &config);

    session.tick().await.unwrap();
    assert_eq!(session.geometry().surface_size(), (1080, 1920));

    session.tick().await.unwrap();
    assert_eq!(
        channel.inputs(),
        vec!["shell input touchscreen tap 100 100".to_string()]
    );
}

#[tokio::test]
async fn zero_sized_resize_is_ignored() {
    let script = vec![vec![SurfaceEvent::Resized {
        width: 0,
        height: 0,
    }]];

    let channel = FakeChannel::new(CaptureMode::Stall);
    let (surface, _state) = FakeSurface::new(script);
    let config = test_config();
    let mut session = session(channel, surface, &config);

    session.tick().await.unwrap();
    assert_eq!(session.geometry().surface_size(), (400, 711));
}

#[tokio::test]
async fn close_request_ends_the_session() {
    let script = vec![vec![SurfaceEvent::CloseRequested]];
    let channel = FakeChannel::new(CaptureMode::Stall);
    let (surface, _state) = FakeSurface::new(script);
    let config = test_config();
    let mut session = session(channel, surface, &config);

    session.run().await.unwrap();
    assert!(session.quit_requested());
}

#[tokio::test]
async fn reconnect_clears_the_lost_state() {
    let script = vec![
        Vec::new(),
        Vec::new(),
        Vec::new(),
        vec![SurfaceEvent::ReconnectRequested],
    ];
    let channel = FakeChannel::new(CaptureMode::Stall);
    let (surface, _state) = FakeSurface::new(script);
    let config = test_config();
    let mut session = session(channel, surface, &config);

    for _ in 0..3 {
        session.tick().await.unwrap();
    }
    assert!(session.connection_lost());

    session.tick().await.unwrap();
    assert!(!session.connection_lost());
}

#[tokio::test]
async fn frame_delivery_clears_the_lost_state() {
    let channel = FakeChannel::new(CaptureMode::Stall);
    let (surface, state) = FakeSurface::new(Vec::new());
    let config = test_config();
    let mut session = session(channel.clone(), surface, &config);

    for _ in 0..3 {
        session.tick().await.unwrap();
    }
    assert!(session.connection_lost());

    // The device comes back on its own: a captured frame must clear
    // the indication without an explicit reconnect.
    channel.set_mode(CaptureMode::Frame(png_bytes(5)));
    for _ in 0..100 {
        session.tick().await.unwrap();
        if !session.connection_lost() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(!session.connection_lost());
    assert!(state.lock().unwrap().presented > 0);
}
