mod display;

use std::process;
use std::time::Duration;

use clap::Parser;

use facetrack_core::capture::domain::capture_device::{
    select_device, CaptureBackend, CaptureSession, StreamConfig,
};
use facetrack_core::capture::infrastructure::nokhwa_capture::{NokhwaBackend, NokhwaCapture};
use facetrack_core::detection::domain::face_detector::FaceDetector;
use facetrack_core::detection::infrastructure::model_resolver;
use facetrack_core::detection::infrastructure::onnx_ultraface_detector::OnnxUltrafaceDetector;
use facetrack_core::render::render_context::render_queue;
use facetrack_core::scheduling::cycle_scheduler::{CycleScheduler, SchedulerConfig};
use facetrack_core::shared::constants::{ULTRAFACE_MODEL_NAME, ULTRAFACE_MODEL_URL};

/// Live camera face tracking with a bounding-box overlay.
#[derive(Parser)]
#[command(name = "facetrack")]
struct Cli {
    /// Camera to use when more than one is attached (default: first).
    #[arg(long)]
    device_index: Option<usize>,

    /// Detection sampling interval in milliseconds.
    #[arg(long, default_value = "66")]
    interval_ms: u64,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.7")]
    confidence: f32,

    /// Window size as a multiple of the 320x240 capture stream.
    #[arg(long, default_value = "2")]
    window_scale: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let detector = build_detector(&cli)?;
    let mut session = build_capture(&cli)?;
    let preview = session.preview_handle();
    session.start_preview()?;

    let (render_ctx, results) = render_queue();
    let config = SchedulerConfig {
        tick_interval: Duration::from_millis(cli.interval_ms),
        ..SchedulerConfig::default()
    };
    let scheduler =
        CycleScheduler::start(Box::new(session), detector, Box::new(render_ctx), config);

    display::run_window(preview, results, cli.window_scale)?;

    // Window closed: stop sampling first, then shut the stream down by
    // dropping the returned session.
    let source = scheduler.stop()?;
    drop(source);
    log::info!("capture stopped");
    Ok(())
}

fn build_capture(cli: &Cli) -> Result<NokhwaCapture, Box<dyn std::error::Error>> {
    let backend = NokhwaBackend;
    let devices = backend.enumerate_devices()?;
    let device = select_device(&devices, cli.device_index)?;
    log::info!("using camera {device}");

    let mut session = backend.open_session(device)?;
    session.configure_stream(&StreamConfig::default())?;
    Ok(session)
}

fn build_detector(cli: &Cli) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let model_path = model_resolver::resolve(ULTRAFACE_MODEL_NAME, ULTRAFACE_MODEL_URL)?;
    let detector = OnnxUltrafaceDetector::new(&model_path, cli.confidence)?;
    Ok(Box::new(detector))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.interval_ms == 0 {
        return Err("Interval must be at least 1 ms".into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.window_scale == 0 || cli.window_scale > 8 {
        return Err(format!(
            "Window scale must be between 1 and 8, got {}",
            cli.window_scale
        )
        .into());
    }
    Ok(())
}
