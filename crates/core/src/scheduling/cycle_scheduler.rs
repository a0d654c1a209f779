use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::select;
use thiserror::Error;

use crate::capture::domain::frame_source::{CaptureError, FrameSource};
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::render::render_context::RenderContext;
use crate::scheduling::admission_gate::{AdmissionGate, AdmissionPermit};
use crate::shared::constants::{CAPTURE_HEIGHT, CAPTURE_WIDTH, STALL_WARN_TICKS, TICK_INTERVAL};
use crate::shared::detection_result::DetectionResult;
use crate::shared::frame::PixelFormat;

/// Why one detection cycle ended early.
///
/// Logged by the cycle worker and recovered locally; it never terminates
/// the loop itself.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("pixel format {0} is not supported by the detector")]
    UnsupportedFormat(PixelFormat),
    #[error(transparent)]
    Detection(#[from] DetectionError),
}

/// Cadence and frame parameters of the sampling loop.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    pub frame_format: PixelFormat,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Consecutive dropped ticks before a stall warning is logged.
    pub stall_warn_ticks: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
            frame_format: PixelFormat::Nv12,
            frame_width: CAPTURE_WIDTH,
            frame_height: CAPTURE_HEIGHT,
            stall_warn_ticks: STALL_WARN_TICKS,
        }
    }
}

/// Drives the capture → detect → dispatch loop.
///
/// A timer thread fires at the configured cadence and asks the admission
/// gate whether a cycle may start; ticks that arrive while a cycle is
/// still in flight are dropped, never queued. Admitted cycles run on a
/// dedicated worker thread, so a slow detector stalls only itself while
/// the timer keeps firing and dropping.
pub struct CycleScheduler {
    stop_tx: crossbeam_channel::Sender<()>,
    timer_handle: thread::JoinHandle<()>,
    worker_handle: thread::JoinHandle<Box<dyn FrameSource>>,
    gate: Arc<AdmissionGate>,
}

impl CycleScheduler {
    /// Starts the timer and worker threads. The loop runs until `stop`.
    pub fn start(
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        render: Box<dyn RenderContext>,
        config: SchedulerConfig,
    ) -> Self {
        let gate = Arc::new(AdmissionGate::new());
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        // The gate guarantees at most one permit is ever outstanding, so
        // capacity 1 means this send never blocks the timer.
        let (cycle_tx, cycle_rx) = crossbeam_channel::bounded::<AdmissionPermit>(1);

        let timer_handle = spawn_timer(gate.clone(), cycle_tx, stop_rx, config);
        let worker_handle = spawn_worker(source, detector, render, cycle_rx, config);

        Self {
            stop_tx,
            timer_handle,
            worker_handle,
            gate,
        }
    }

    /// Whether a cycle is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Stops the timer first, then waits for any in-flight cycle to
    /// finish, and hands the frame source back so the caller can shut
    /// the capture stream down afterwards.
    pub fn stop(self) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
        let _ = self.stop_tx.send(());
        if self.timer_handle.join().is_err() {
            return Err("timer thread panicked".into());
        }
        // The timer's exit dropped the cycle sender, which ends the
        // worker loop once its current cycle (if any) completes.
        self.worker_handle
            .join()
            .map_err(|_| "cycle worker thread panicked".into())
    }
}

fn spawn_timer(
    gate: Arc<AdmissionGate>,
    cycle_tx: crossbeam_channel::Sender<AdmissionPermit>,
    stop_rx: crossbeam_channel::Receiver<()>,
    config: SchedulerConfig,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let ticker = crossbeam_channel::tick(config.tick_interval);
        let mut dropped_streak: u32 = 0;
        loop {
            select! {
                recv(stop_rx) -> _ => break,
                recv(ticker) -> tick => {
                    if tick.is_err() {
                        break;
                    }
                    match AdmissionGate::try_acquire(&gate) {
                        Some(permit) => {
                            dropped_streak = 0;
                            if cycle_tx.send(permit).is_err() {
                                break;
                            }
                        }
                        None => {
                            dropped_streak += 1;
                            log::trace!("detection busy, tick dropped");
                            if dropped_streak == config.stall_warn_ticks {
                                log::warn!(
                                    "detection has not finished for {dropped_streak} ticks; \
                                     dropping frames until it does"
                                );
                            }
                        }
                    }
                }
            }
        }
    })
}

fn spawn_worker(
    mut source: Box<dyn FrameSource>,
    mut detector: Box<dyn FaceDetector>,
    render: Box<dyn RenderContext>,
    cycle_rx: crossbeam_channel::Receiver<AdmissionPermit>,
    config: SchedulerConfig,
) -> thread::JoinHandle<Box<dyn FrameSource>> {
    thread::spawn(move || {
        for permit in cycle_rx {
            match run_cycle(source.as_mut(), detector.as_mut(), &*render, &config) {
                Ok(count) => log::trace!("cycle complete, {count} face(s)"),
                Err(CycleError::UnsupportedFormat(format)) => {
                    log::error!("capture format {format} does not match the detector");
                }
                Err(e) => log::warn!("detection cycle failed: {e}"),
            }
            // Dropping the permit reopens the gate for the next tick.
            drop(permit);
        }
        source
    })
}

/// One admitted cycle: fetch a frame, verify its format, run detection,
/// and hand the result to the rendering context.
fn run_cycle(
    source: &mut dyn FrameSource,
    detector: &mut dyn FaceDetector,
    render: &dyn RenderContext,
    config: &SchedulerConfig,
) -> Result<usize, CycleError> {
    // The frame lives exactly as long as this call.
    let frame = source.fetch_frame(config.frame_format, config.frame_width, config.frame_height)?;

    if !detector.supports_format(frame.format()) {
        return Err(CycleError::UnsupportedFormat(frame.format()));
    }

    let faces = detector.detect(&frame)?;
    let count = faces.len();

    // Fire-and-forget: the display thread picks the result up on its own
    // schedule; the cycle does not wait for rendering.
    render.submit(DetectionResult {
        frame_width: frame.width(),
        frame_height: frame.height(),
        faces,
    });

    Ok(count)
}
