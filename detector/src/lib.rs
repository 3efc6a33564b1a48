//! Frame-differencing motion detection over raw RGB565 buffers.

pub mod detection;
pub mod scan;

pub use detection::{DetectionError, MotionDetector};
