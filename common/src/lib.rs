pub mod config;
pub mod frame;
pub mod rate_limit;
pub mod source;

pub use frame::{Frame, FrameError, BYTES_PER_PIXEL};
pub use rate_limit::RateGate;
pub use source::{FrameSlot, FrameSource, SourceError};
