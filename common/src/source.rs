use crate::frame::{expected_len, Frame, FrameError};

/// Camera driver interface.
///
/// A source lends out at most one frame at a time. The caller must
/// `release` the current frame before asking for the next one; until then
/// `acquire` fails with [`SourceError::Outstanding`].
pub trait FrameSource: Send {
    /// Produce the next frame.
    fn acquire(&mut self) -> Result<Frame<'_>, SourceError>;

    /// Hand the current frame back. No-op when nothing is outstanding.
    fn release(&mut self);

    /// Returns `true` while a frame is lent out.
    fn has_frame(&self) -> bool;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("previous frame has not been released")]
    Outstanding,
    #[error("no frame available: {0}")]
    Unavailable(String),
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
    #[error("frame source I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode frame {path}: {reason}")]
    Decode { path: String, reason: String },
}

/// The single reusable pixel buffer behind a source.
///
/// Keeps the one-outstanding-frame bookkeeping, sequence numbers and
/// capture timestamps in one place so sources only have to fill pixels.
#[derive(Debug)]
pub struct FrameSlot {
    buf: Vec<u8>,
    width: usize,
    height: usize,
    outstanding: bool,
    next_seq: u64,
    captured_at_ms: i64,
}

impl FrameSlot {
    pub fn new(width: usize, height: usize) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        let len = expected_len(width, height).ok_or(FrameError::TooLarge { width, height })?;
        Ok(Self {
            buf: vec![0; len],
            width,
            height,
            outstanding: false,
            next_seq: 0,
            captured_at_ms: 0,
        })
    }

    /// Writable pixels. Refused while the current frame is lent out.
    pub fn buffer_mut(&mut self) -> Result<&mut [u8], SourceError> {
        if self.outstanding {
            return Err(SourceError::Outstanding);
        }
        Ok(&mut self.buf)
    }

    /// Lend the buffer out as the next frame.
    pub fn check_out(&mut self) -> Result<Frame<'_>, SourceError> {
        if self.outstanding {
            return Err(SourceError::Outstanding);
        }
        let seq = self.next_seq;
        let captured_at_ms = chrono::Utc::now().timestamp_millis();
        let frame = Frame::new(&self.buf, self.width, self.height, captured_at_ms, seq)?;
        self.outstanding = true;
        self.next_seq += 1;
        self.captured_at_ms = captured_at_ms;
        Ok(frame)
    }

    pub fn check_in(&mut self) {
        self.outstanding = false;
    }

    pub fn is_outstanding(&self) -> bool {
        self.outstanding
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Frames lent out so far.
    pub fn frames_issued(&self) -> u64 {
        self.next_seq
    }

    /// Capture time of the most recent frame, `0` before the first.
    pub fn last_captured_at_ms(&self) -> i64 {
        self.captured_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_frame_at_a_time() {
        let mut slot = FrameSlot::new(2, 2).unwrap();
        let frame = slot.check_out().unwrap();
        assert_eq!(frame.seq(), 0);
        assert_eq!(frame.len(), 8);

        assert!(slot.is_outstanding());
        assert!(matches!(slot.check_out(), Err(SourceError::Outstanding)));
        assert!(matches!(slot.buffer_mut(), Err(SourceError::Outstanding)));

        slot.check_in();
        assert!(!slot.is_outstanding());
        let frame = slot.check_out().unwrap();
        assert_eq!(frame.seq(), 1);
        assert_eq!(slot.frames_issued(), 2);
    }

    #[test]
    fn buffer_writes_show_up_in_frame() {
        let mut slot = FrameSlot::new(1, 1).unwrap();
        slot.buffer_mut().unwrap().copy_from_slice(&[0xF8, 0x00]);
        let frame = slot.check_out().unwrap();
        assert_eq!(frame.pixel(0, 0), Some(0xF800));
    }

    #[test]
    fn check_in_without_frame_is_noop() {
        let mut slot = FrameSlot::new(1, 1).unwrap();
        slot.check_in();
        assert!(!slot.is_outstanding());
        assert_eq!(slot.frames_issued(), 0);
    }

    #[test]
    fn rejects_empty_slot() {
        assert!(FrameSlot::new(0, 4).is_err());
    }
}
