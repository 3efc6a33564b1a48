/// Bytes per pixel of the raw sensor format (RGB565).
pub const BYTES_PER_PIXEL: usize = 2;

/// A raw camera frame borrowed from its source.
///
/// Pixel layout: row-major RGB565, two bytes per pixel in sensor
/// (big-endian) byte order:
///
///   [0]  RRRRRGGG
///   [1]  GGGBBBBB
///
/// The frame never owns its pixels. The source lends them out until the
/// caller releases the frame, so anything that needs the bytes for longer
/// has to copy them.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    captured_at_ms: i64,
    seq: u64,
}

impl<'a> Frame<'a> {
    /// Wrap a pixel buffer, checking `data.len() == width * height * 2`.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        captured_at_ms: i64,
        seq: u64,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        let expected = expected_len(width, height).ok_or(FrameError::TooLarge { width, height })?;
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                width,
                height,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            captured_at_ms,
            seq,
        })
    }

    /// Wrap a pixel buffer stamped with the current wall-clock time.
    pub fn now(data: &'a [u8], width: usize, height: usize, seq: u64) -> Result<Self, FrameError> {
        Self::new(data, width, height, chrono::Utc::now().timestamp_millis(), seq)
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Byte length of the pixel buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false` for a constructed frame; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn captured_at_ms(&self) -> i64 {
        self.captured_at_ms
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The RGB565 value at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.width + x) * BYTES_PER_PIXEL;
        Some(u16::from_be_bytes([self.data[offset], self.data[offset + 1]]))
    }
}

/// Byte length of a `width x height` RGB565 frame, `None` on overflow.
pub fn expected_len(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(BYTES_PER_PIXEL)
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame has no pixels ({width}x{height})")]
    Empty { width: usize, height: usize },
    #[error("frame dimensions {width}x{height} overflow the address space")]
    TooLarge { width: usize, height: usize },
    #[error("frame {width}x{height} needs {expected} bytes, got {got}")]
    LengthMismatch {
        width: usize,
        height: usize,
        expected: usize,
        got: usize,
    },
}
