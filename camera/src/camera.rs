use std::time::Instant;

use motion_cam_common::{Frame, FrameSource, RateGate, SourceError};
use tracing::trace;

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("too many requests for frame")]
    TooManyRequests,
    #[error("cannot capture frame: {0}")]
    Capture(#[from] SourceError),
}

/// A frame source behind a capture rate limit.
///
/// `capture` hands back any frame still held before asking the source for
/// a new one, so at most one hardware buffer is ever checked out.
pub struct Camera {
    source: Box<dyn FrameSource>,
    capture_gate: RateGate,
    captured: u64,
    frame_len: usize,
}

impl Camera {
    pub fn new(source: Box<dyn FrameSource>, capture_gate: RateGate) -> Self {
        Self {
            source,
            capture_gate,
            captured: 0,
            frame_len: 0,
        }
    }

    pub fn capture(&mut self) -> Result<Frame<'_>, CameraError> {
        self.capture_at(Instant::now())
    }

    /// The attempt counts against the rate limit even when the source fails.
    pub fn capture_at(&mut self, now: Instant) -> Result<Frame<'_>, CameraError> {
        if !self.capture_gate.allowed_at(now) {
            return Err(CameraError::TooManyRequests);
        }

        self.release();
        self.capture_gate.record_action_at(now);

        let frame = self.source.acquire()?;
        self.captured += 1;
        self.frame_len = frame.len();
        trace!(seq = frame.seq(), bytes = frame.len(), "frame captured");
        Ok(frame)
    }

    /// Return the current frame to the source. No-op without one.
    pub fn release(&mut self) {
        if self.source.has_frame() {
            self.source.release();
        }
        self.frame_len = 0;
    }

    pub fn has_frame(&self) -> bool {
        self.source.has_frame()
    }

    /// Byte size of the held frame, `0` without one.
    pub fn size_in_bytes(&self) -> usize {
        if self.has_frame() {
            self.frame_len
        } else {
            0
        }
    }

    /// Frames successfully captured so far.
    pub fn captured(&self) -> u64 {
        self.captured
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SyntheticSource;
    use motion_cam_common::config::SyntheticConfig;
    use std::time::Duration;

    fn camera(gate: RateGate) -> Camera {
        let source = SyntheticSource::new(8, 8, &SyntheticConfig::default()).unwrap();
        Camera::new(Box::new(source), gate)
    }

    /// Fails every acquire.
    struct BrokenSource;

    impl FrameSource for BrokenSource {
        fn acquire(&mut self) -> Result<Frame<'_>, SourceError> {
            Err(SourceError::Unavailable("sensor offline".into()))
        }

        fn release(&mut self) {}

        fn has_frame(&self) -> bool {
            false
        }
    }

    #[test]
    fn capture_and_release() {
        let mut camera = camera(RateGate::unlimited());
        assert!(!camera.has_frame());
        assert_eq!(camera.size_in_bytes(), 0);

        let len = camera.capture().unwrap().len();
        assert_eq!(len, 128);
        assert!(camera.has_frame());
        assert_eq!(camera.size_in_bytes(), 128);

        camera.release();
        assert!(!camera.has_frame());
        assert_eq!(camera.size_in_bytes(), 0);
        assert_eq!(camera.source_name(), "synthetic");
    }

    #[test]
    fn capture_releases_previous_frame() {
        let mut camera = camera(RateGate::unlimited());
        let first = camera.capture().unwrap().seq();
        // No explicit release in between
        let second = camera.capture().unwrap().seq();
        assert_eq!((first, second), (0, 1));
        assert_eq!(camera.captured(), 2);
    }

    #[test]
    fn capture_is_rate_limited() {
        let t0 = Instant::now();
        let mut camera = camera(RateGate::from_fps(10.0));

        assert!(camera.capture_at(t0).is_ok());
        camera.release();
        assert!(matches!(
            camera.capture_at(t0 + Duration::from_millis(50)),
            Err(CameraError::TooManyRequests)
        ));
        assert!(camera.capture_at(t0 + Duration::from_millis(100)).is_ok());
        assert_eq!(camera.captured(), 2);
    }

    #[test]
    fn failed_capture_still_counts_against_limit() {
        let t0 = Instant::now();
        let mut camera = Camera::new(Box::new(BrokenSource), RateGate::from_fps(1.0));

        assert!(matches!(
            camera.capture_at(t0),
            Err(CameraError::Capture(SourceError::Unavailable(_)))
        ));
        assert!(matches!(
            camera.capture_at(t0 + Duration::from_millis(10)),
            Err(CameraError::TooManyRequests)
        ));
        assert_eq!(camera.captured(), 0);
        assert_eq!(camera.source_name(), "unnamed");
    }
}
