use std::collections::TryReserveError;
use std::time::{Duration, Instant};

use motion_cam_common::config::DetectorConfig;
use motion_cam_common::{Frame, RateGate};
use tracing::{debug, error, trace};

use crate::scan;

pub const DEFAULT_STRIDE: u8 = 4;
pub const DEFAULT_THRESHOLD: u8 = 5;
pub const DEFAULT_RATIO: f32 = 0.2;

/// Frame-differencing motion detector.
///
/// Keeps a private copy of the previous frame and compares every new frame
/// against it with a strided scan (see [`scan::moving_points`]). A positive
/// decision closes the rate gate for its cooldown; while the gate is closed
/// frames are still copied so the baseline keeps tracking the scene.
///
/// All frames fed to one detector must have the same byte length. A frame
/// of a different size is rejected with
/// [`DetectionError::FrameSizeMismatch`] and leaves the detector untouched;
/// call [`MotionDetector::reset`] to re-baseline on a new resolution.
#[derive(Debug)]
pub struct MotionDetector {
    stride: u8,
    threshold: u8,
    ratio: f32,
    /// Allocated on the first frame, never resized.
    prev: Option<Box<[u8]>>,
    moving_points: u32,
    moving_ratio: f32,
    rate_gate: RateGate,
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionDetector {
    /// Detector with stride 4, threshold 5, ratio 0.2 and no cooldown.
    pub fn new() -> Self {
        Self {
            stride: DEFAULT_STRIDE,
            threshold: DEFAULT_THRESHOLD,
            ratio: DEFAULT_RATIO,
            prev: None,
            moving_points: 0,
            moving_ratio: 0.0,
            rate_gate: RateGate::unlimited(),
        }
    }

    /// Build a detector through the regular setters, so an out-of-range
    /// ratio is logged and replaced by the default.
    pub fn from_config(config: &DetectorConfig) -> Self {
        let mut detector =
            Self::new().with_cooldown(Duration::from_millis(config.cooldown_ms));
        detector.set_stride(config.stride);
        detector.set_threshold(config.threshold);
        detector.set_ratio(config.ratio);
        detector
    }

    /// Minimum time between two positive detections.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_gate.set_min_interval(cooldown);
        self
    }

    /// Sampling step. Larger is faster and less accurate.
    pub fn set_stride(&mut self, stride: u8) {
        self.stride = stride;
    }

    /// Per-pixel luma delta that counts as movement.
    /// Larger is less sensitive.
    pub fn set_threshold(&mut self, threshold: u8) {
        self.threshold = threshold;
    }

    /// Fraction of sampled pixels that must move, in `(0, 1]`.
    /// Anything else (including NaN) is logged and ignored.
    pub fn set_ratio(&mut self, ratio: f32) {
        if !(ratio > 0.0 && ratio <= 1.0) {
            error!(
                ratio,
                current = self.ratio,
                "ratio must be between 0 (exclusive) and 1 (inclusive), keeping current value"
            );
            return;
        }
        self.ratio = ratio;
    }

    pub fn stride(&self) -> u8 {
        self.stride
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Ratio computed by the last comparison.
    pub fn moving_ratio(&self) -> f32 {
        self.moving_ratio
    }

    /// Moving samples counted by the last comparison.
    pub fn moving_points(&self) -> u32 {
        self.moving_points
    }

    pub fn rate_gate(&self) -> &RateGate {
        &self.rate_gate
    }

    pub fn rate_gate_mut(&mut self) -> &mut RateGate {
        &mut self.rate_gate
    }

    /// Returns `true` once a baseline frame has been retained.
    pub fn is_initialized(&self) -> bool {
        self.prev.is_some()
    }

    /// Free the retained frame. The next `update` starts a new baseline.
    pub fn reset(&mut self) {
        self.prev = None;
        self.moving_points = 0;
        self.moving_ratio = 0.0;
    }

    /// Feed the next frame. Returns `Ok(true)` when motion is detected.
    pub fn update(&mut self, frame: &Frame<'_>) -> Result<bool, DetectionError> {
        self.update_at(frame, Instant::now())
    }

    /// Like [`update`](Self::update), with the rate gate evaluated at `now`.
    pub fn update_at(&mut self, frame: &Frame<'_>, now: Instant) -> Result<bool, DetectionError> {
        let Some(prev) = self.prev.as_deref_mut() else {
            self.prev = Some(retain(frame.data())?);
            debug!(
                bytes = frame.len(),
                width = frame.width(),
                height = frame.height(),
                "first frame, retained as baseline"
            );
            return Ok(false);
        };

        if prev.len() != frame.len() {
            return Err(DetectionError::FrameSizeMismatch {
                expected: prev.len(),
                got: frame.len(),
            });
        }

        if !self.rate_gate.allowed_at(now) {
            prev.copy_from_slice(frame.data());
            trace!(
                seq = frame.seq(),
                remaining_ms = self.rate_gate.remaining_at(now).as_millis() as u64,
                "rate gate closed, baseline updated"
            );
            return Ok(false);
        }

        let points = scan::moving_points(
            frame.data(),
            prev,
            frame.width(),
            frame.height(),
            self.stride,
            self.threshold,
        );
        prev.copy_from_slice(frame.data());

        self.moving_points = points;
        self.moving_ratio = scan::moving_ratio(points, frame.pixel_count(), self.stride);
        debug!(
            seq = frame.seq(),
            moving_points = points,
            moving_ratio = format!("{:.3}", self.moving_ratio),
            ratio = self.ratio,
            "motion comparison"
        );

        if self.moving_ratio < self.ratio {
            return Ok(false);
        }

        self.rate_gate.record_action_at(now);
        Ok(true)
    }
}

/// Copy `data` into a freshly reserved buffer, surfacing allocation failure.
fn retain(data: &[u8]) -> Result<Box<[u8]>, DetectionError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(data.len())
        .map_err(|source| DetectionError::Allocation {
            len: data.len(),
            source,
        })?;
    buf.extend_from_slice(data);
    Ok(buf.into_boxed_slice())
}

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("frame size changed: baseline holds {expected} bytes, frame has {got}")]
    FrameSizeMismatch { expected: usize, got: usize },
    #[error("failed to allocate {len}-byte baseline buffer: {source}")]
    Allocation {
        len: usize,
        #[source]
        source: TryReserveError,
    },
}
