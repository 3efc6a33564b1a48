use motion_cam_common::config::SyntheticConfig;
use motion_cam_common::{Frame, FrameSlot, FrameSource, SourceError};

const BACKGROUND: [u8; 2] = [0x84, 0x10]; // mid gray
const BLOCK: [u8; 2] = [0xFF, 0xFF];

/// Deterministic test pattern.
///
/// Repeats a cycle of `idle_frames` static frames followed by
/// `active_frames` frames in which a white square of `block_size` pixels
/// jumps one block to the right per frame, vertically centered.
pub struct SyntheticSource {
    slot: FrameSlot,
    idle_frames: u32,
    active_frames: u32,
    block_size: usize,
    tick: u64,
}

impl SyntheticSource {
    pub fn new(width: usize, height: usize, config: &SyntheticConfig) -> Result<Self, SourceError> {
        Ok(Self {
            slot: FrameSlot::new(width, height)?,
            idle_frames: config.idle_frames,
            active_frames: config.active_frames,
            block_size: config.block_size.max(1),
            tick: 0,
        })
    }

    /// Index of the current frame within the active phase, `None` while idle.
    fn active_step(&self) -> Option<u64> {
        let idle = self.idle_frames as u64;
        let cycle = idle + self.active_frames as u64;
        if cycle == 0 {
            return None;
        }
        let pos = self.tick % cycle;
        (pos >= idle).then(|| pos - idle)
    }

    fn render(buf: &mut [u8], width: usize, height: usize, block_size: usize, step: Option<u64>) {
        for px in buf.chunks_exact_mut(2) {
            px.copy_from_slice(&BACKGROUND);
        }
        let Some(step) = step else {
            return;
        };

        let x0 = (step as usize).wrapping_mul(block_size) % width;
        let y0 = height.saturating_sub(block_size) / 2;
        for y in y0..(y0 + block_size).min(height) {
            for x in x0..(x0 + block_size).min(width) {
                let offset = (y * width + x) * 2;
                buf[offset..offset + 2].copy_from_slice(&BLOCK);
            }
        }
    }
}

impl FrameSource for SyntheticSource {
    fn acquire(&mut self) -> Result<Frame<'_>, SourceError> {
        let step = self.active_step();
        let (width, height) = (self.slot.width(), self.slot.height());
        let buf = self.slot.buffer_mut()?;
        Self::render(buf, width, height, self.block_size, step);
        self.tick += 1;
        self.slot.check_out()
    }

    fn release(&mut self) {
        self.slot.check_in();
    }

    fn has_frame(&self) -> bool {
        self.slot.is_outstanding()
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(idle_frames: u32, active_frames: u32) -> SyntheticSource {
        let config = SyntheticConfig {
            idle_frames,
            active_frames,
            block_size: 8,
        };
        SyntheticSource::new(32, 16, &config).unwrap()
    }

    fn grab(source: &mut SyntheticSource) -> Vec<u8> {
        let data = source.acquire().unwrap().data().to_vec();
        source.release();
        data
    }

    #[test]
    fn idle_frames_are_identical() {
        let mut source = source(3, 2);
        let first = grab(&mut source);
        assert!(first.chunks_exact(2).all(|px| px == BACKGROUND));
        assert_eq!(grab(&mut source), first);
        assert_eq!(grab(&mut source), first);
    }

    #[test]
    fn active_frames_move_the_block() {
        let mut source = source(1, 2);
        let idle = grab(&mut source);
        let a = grab(&mut source);
        let b = grab(&mut source);
        assert_ne!(a, idle);
        assert_ne!(a, b);

        // Block at x = 0 then x = 8, row 4
        let px = |data: &[u8], x: usize, y: usize| {
            let o = (y * 32 + x) * 2;
            [data[o], data[o + 1]]
        };
        assert_eq!(px(&a, 0, 4), BLOCK);
        assert_eq!(px(&a, 8, 4), BACKGROUND);
        assert_eq!(px(&b, 0, 4), BACKGROUND);
        assert_eq!(px(&b, 8, 4), BLOCK);

        // Cycle restarts with an idle frame
        assert_eq!(grab(&mut source), idle);
    }

    #[test]
    fn second_acquire_without_release_fails() {
        let mut source = source(1, 1);
        let _ = source.acquire().unwrap();
        assert!(source.has_frame());
        assert!(matches!(source.acquire(), Err(SourceError::Outstanding)));
        source.release();
        assert!(!source.has_frame());
        assert!(source.acquire().is_ok());
    }

    #[test]
    fn block_larger_than_frame_is_clipped() {
        let config = SyntheticConfig {
            idle_frames: 0,
            active_frames: 1,
            block_size: 100,
        };
        let mut source = SyntheticSource::new(4, 4, &config).unwrap();
        let data = grab(&mut source);
        assert!(data.chunks_exact(2).all(|px| px == BLOCK));
    }
}
