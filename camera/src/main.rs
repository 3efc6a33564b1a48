mod camera;
mod source;

use camera::{Camera, CameraError};
use chrono::{DateTime, Utc};
use motion_cam_common::config::Config;
use motion_cam_common::RateGate;
use motion_cam_detector::{DetectionError, MotionDetector};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    let (width, height) = config.camera.resolution.dimensions();
    info!(
        source = config.camera.source,
        width,
        height,
        max_fps = config.camera.max_fps,
        stride = config.detector.stride,
        threshold = config.detector.threshold,
        ratio = config.detector.ratio,
        cooldown_ms = config.detector.cooldown_ms,
        "starting motion-cam"
    );

    let frame_source = match source::open(&config.camera) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to open frame source");
            std::process::exit(1);
        }
    };

    let mut camera = Camera::new(frame_source, RateGate::from_fps(config.camera.max_fps));
    let mut detector = MotionDetector::from_config(&config.detector);
    let period = Duration::from_secs_f64(1.0 / config.camera.max_fps);

    let stats = run_capture_loop(&mut camera, &mut detector, period).await;
    info!(
        frames = stats.frames,
        motion_events = stats.motion_events,
        throttled = stats.throttled,
        failures = stats.failures,
        "shutting down"
    );
}

/// What one capture tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    Motion,
    Still,
    Throttled,
    Failed,
    /// The frame size changed; the detector dropped its baseline.
    Rebaselined,
}

#[derive(Debug, Default)]
struct LoopStats {
    frames: u64,
    motion_events: u64,
    throttled: u64,
    failures: u64,
}

impl LoopStats {
    fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Motion => {
                self.frames += 1;
                self.motion_events += 1;
            }
            TickOutcome::Still | TickOutcome::Rebaselined => self.frames += 1,
            TickOutcome::Throttled => self.throttled += 1,
            TickOutcome::Failed => self.failures += 1,
        }
    }
}

async fn run_capture_loop(
    camera: &mut Camera,
    detector: &mut MotionDetector,
    period: Duration,
) -> LoopStats {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut stats = LoopStats::default();
    info!(source = camera.source_name(), "entering capture loop");

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                break;
            }
            tick = ticker.tick() => {
                let outcome = process_tick(camera, detector, tick.into_std());
                stats.record(outcome);
                if stats.frames > 0 && stats.frames % 100 == 0 && outcome != TickOutcome::Throttled {
                    debug!(frames = stats.frames, motion_events = stats.motion_events, "frames processed");
                }
            }
        }
    }

    camera.release();
    stats
}

/// Capture one frame, run it through the detector and hand it back.
fn process_tick(camera: &mut Camera, detector: &mut MotionDetector, now: Instant) -> TickOutcome {
    let frame = match camera.capture_at(now) {
        Ok(f) => f,
        Err(CameraError::TooManyRequests) => {
            debug!("capture throttled");
            return TickOutcome::Throttled;
        }
        Err(e) => {
            warn!(error = %e, "capture failed");
            return TickOutcome::Failed;
        }
    };

    let seq = frame.seq();
    let captured_at_ms = frame.captured_at_ms();
    let result = detector.update_at(&frame, now);
    camera.release();

    match result {
        Ok(true) => {
            info!(
                seq,
                at = fmt_ts(captured_at_ms),
                moving_ratio = format!("{:.3}", detector.moving_ratio()),
                moving_points = detector.moving_points(),
                "motion detected"
            );
            TickOutcome::Motion
        }
        Ok(false) => TickOutcome::Still,
        Err(e @ DetectionError::FrameSizeMismatch { .. }) => {
            warn!(error = %e, seq, "frame size changed, resetting motion baseline");
            detector.reset();
            TickOutcome::Rebaselined
        }
        Err(e) => {
            error!(error = %e, seq, "motion detection failed");
            TickOutcome::Failed
        }
    }
}

fn fmt_ts(ms: i64) -> String {
    let dt: DateTime<Utc> = DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now);
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
