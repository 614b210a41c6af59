//! QR scanning on top of a frame source
//!
//! The camera itself and the QR decoding algorithm are collaborators behind
//! [`FrameSource`] and [`QrDecoder`]. [`QrCameraService`] runs the scan loop:
//! pull a frame, decode it, update the scan overlay, emit a scan event.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, trace};
use tokio::sync::{Mutex, Notify};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use super::events::{EventEmitter, HandlerId};

/// Nominal size of synthetic frames built from text
const TEXT_FRAME_WIDTH: u32 = 640;
const TEXT_FRAME_HEIGHT: u32 = 480;

/// One captured image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageFrame {
    /// A frame carrying an already-decoded payload, as sent by a keyboard-wedge scanner
    pub fn from_text(payload: &str) -> Self {
        Self {
            width: TEXT_FRAME_WIDTH,
            height: TEXT_FRAME_HEIGHT,
            data: payload.as_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QrPoint {
    pub x: f32,
    pub y: f32,
}

impl QrPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Corners of a detected code in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QrLocation {
    pub top_left: QrPoint,
    pub top_right: QrPoint,
    pub bottom_right: QrPoint,
    pub bottom_left: QrPoint,
}

impl QrLocation {
    /// Closed outline starting and ending at the top-left corner
    pub fn outline(&self) -> [QrPoint; 5] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
            self.top_left,
        ]
    }
}

/// A decoded QR symbol
#[derive(Debug, Clone, PartialEq)]
pub struct QrCode {
    pub data: String,
    pub location: QrLocation,
}

/// The decoding algorithm: frame in, symbol out
pub trait QrDecoder {
    fn decode(&self, frame: &ImageFrame) -> Option<QrCode>;
}

/// Where frames come from
#[async_trait(?Send)]
pub trait FrameSource {
    async fn start(&self) -> Result<()>;

    fn stop(&self);

    /// Wait for the next frame; `None` once the source is stopped or exhausted
    async fn next_frame(&self) -> Option<ImageFrame>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The box the user is asked to hold the code in, a sixth of the frame in from each edge
pub fn target_box(width: u32, height: u32) -> Rect {
    let margin_h = (height as f32 / 6.0).round() as u32;
    let margin_w = (width as f32 / 6.0).round() as u32;

    Rect {
        x: margin_w,
        y: margin_h,
        width: width.saturating_sub(2 * margin_w),
        height: height.saturating_sub(2 * margin_h),
    }
}

/// What gets drawn over the camera image after each scanned frame
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOverlay {
    pub width: u32,
    pub height: u32,
    pub target_box: Rect,
    pub code_outline: Option<[QrPoint; 5]>,
}

struct CameraInner {
    source: Rc<dyn FrameSource>,
    decoder: Rc<dyn QrDecoder>,
    scans: EventEmitter<QrCode>,
    scan_interval: Duration,
    /// The source has been started and not stopped
    running: Cell<bool>,
    /// A scan loop is supposed to be alive
    updating: Cell<bool>,
    /// Bumped whenever the current loop must die
    generation: Cell<u64>,
    overlay: RefCell<Option<ScanOverlay>>,
}

/// Scans frames for QR codes and emits a scan event per detected code
///
/// Cheap to clone; clones share the same loop. The loop runs on the local
/// executor, so `start` and `resume` must be called inside a `LocalSet`.
#[derive(Clone)]
pub struct QrCameraService {
    inner: Rc<CameraInner>,
}

impl QrCameraService {
    pub fn new(
        source: Rc<dyn FrameSource>,
        decoder: Rc<dyn QrDecoder>,
        scan_interval: Duration,
    ) -> Self {
        Self {
            inner: Rc::new(CameraInner {
                source,
                decoder,
                scans: EventEmitter::new(),
                scan_interval,
                running: Cell::new(false),
                updating: Cell::new(false),
                generation: Cell::new(0),
                overlay: RefCell::new(None),
            }),
        }
    }

    pub fn on_scan<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&QrCode) + 'static,
    {
        self.inner.scans.on(handler)
    }

    pub fn off_scan(&self, id: HandlerId) -> bool {
        self.inner.scans.off(id)
    }

    /// Start the source and begin scanning
    pub async fn start(&self) -> Result<()> {
        self.inner.source.start().await?;
        self.inner.running.set(true);
        info!("Camera started");
        self.resume();
        Ok(())
    }

    /// Stop scanning and release the source
    pub fn stop(&self) {
        self.inner.source.stop();
        self.inner.running.set(false);
        self.halt_loop();
        info!("Camera stopped");
    }

    /// Stop scanning but keep the source
    pub fn pause(&self) {
        self.halt_loop();
        debug!("Scanning paused");
    }

    /// Continue scanning after a pause; no-op unless started and paused
    pub fn resume(&self) {
        if !self.inner.running.get() || self.inner.updating.get() {
            return;
        }

        self.inner.updating.set(true);
        let generation = self.inner.generation.get();
        let inner = Rc::clone(&self.inner);
        tokio::task::spawn_local(scan_loop(inner, generation));
        debug!("Scanning resumed");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    pub fn is_scanning(&self) -> bool {
        self.inner.updating.get()
    }

    /// Overlay produced by the last scanned frame
    pub fn overlay(&self) -> Option<ScanOverlay> {
        self.inner.overlay.borrow().clone()
    }

    fn halt_loop(&self) {
        self.inner.updating.set(false);
        self.inner.generation.set(self.inner.generation.get() + 1);
    }
}

fn loop_is_current(inner: &CameraInner, generation: u64) -> bool {
    inner.updating.get() && inner.generation.get() == generation
}

async fn scan_loop(inner: Rc<CameraInner>, generation: u64) {
    while loop_is_current(&inner, generation) {
        let Some(frame) = inner.source.next_frame().await else {
            debug!("Frame source ended, scan loop exiting");
            if inner.generation.get() == generation {
                inner.updating.set(false);
            }
            break;
        };

        // Paused or stopped while waiting for the frame
        if !loop_is_current(&inner, generation) {
            break;
        }

        let code = inner.decoder.decode(&frame);
        *inner.overlay.borrow_mut() = Some(ScanOverlay {
            width: frame.width,
            height: frame.height,
            target_box: target_box(frame.width, frame.height),
            code_outline: code.as_ref().map(|c| c.location.outline()),
        });

        match code {
            Some(code) => {
                info!("Scanned QR code ({} bytes)", code.data.len());
                inner.scans.emit(&code);
            }
            None => trace!("No QR code in frame"),
        }

        tokio::time::sleep(inner.scan_interval).await;
    }
}

/// Frame source fed through a channel
///
/// The binary pushes one synthetic frame per payload typed by a keyboard-wedge
/// scanner. Frames pushed while the source is stopped are discarded on start.
pub struct ChannelFrameSource {
    receiver: Mutex<UnboundedReceiver<ImageFrame>>,
    active: Cell<bool>,
    stopped: Notify,
}

impl ChannelFrameSource {
    pub fn new() -> (Self, UnboundedSender<ImageFrame>) {
        let (sender, receiver) = unbounded_channel();
        let source = Self {
            receiver: Mutex::new(receiver),
            active: Cell::new(false),
            stopped: Notify::new(),
        };
        (source, sender)
    }
}

#[async_trait(?Send)]
impl FrameSource for ChannelFrameSource {
    async fn start(&self) -> Result<()> {
        let mut receiver = self.receiver.lock().await;
        while receiver.try_recv().is_ok() {}
        self.active.set(true);
        Ok(())
    }

    fn stop(&self) {
        self.active.set(false);
        self.stopped.notify_waiters();
    }

    async fn next_frame(&self) -> Option<ImageFrame> {
        if !self.active.get() {
            return None;
        }

        // A waiter must not keep the receiver locked past stop()
        tokio::select! {
            frame = async { self.receiver.lock().await.recv().await } => {
                frame.filter(|_| self.active.get())
            }
            _ = self.stopped.notified() => None,
        }
    }
}

/// Decoder for frames built with [`ImageFrame::from_text`]
///
/// The frame bytes are the payload; the code is reported as filling the frame.
#[derive(Debug, Default)]
pub struct TextPayloadDecoder;

impl QrDecoder for TextPayloadDecoder {
    fn decode(&self, frame: &ImageFrame) -> Option<QrCode> {
        let text = std::str::from_utf8(&frame.data).ok()?.trim();
        if text.is_empty() {
            return None;
        }

        let (w, h) = (frame.width as f32, frame.height as f32);
        Some(QrCode {
            data: text.to_string(),
            location: QrLocation {
                top_left: QrPoint::new(0.0, 0.0),
                top_right: QrPoint::new(w, 0.0),
                bottom_right: QrPoint::new(w, h),
                bottom_left: QrPoint::new(0.0, h),
            },
        })
    }
}
