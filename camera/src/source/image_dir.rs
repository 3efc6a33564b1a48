use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use motion_cam_common::{Frame, FrameSlot, FrameSource, SourceError};

use super::rgb888_to_rgb565;

const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Replays still images from a directory as raw RGB565 frames.
///
/// Files are played in lexical order and looped forever. Each image is
/// decoded on acquire and resized (nearest neighbour) to the slot size.
pub struct ImageDirSource {
    slot: FrameSlot,
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageDirSource {
    pub fn open(dir: &Path, width: usize, height: usize) -> Result<Self, SourceError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(SourceError::Unavailable(format!(
                "no images in {}",
                dir.display()
            )));
        }

        info!(dir = %dir.display(), images = paths.len(), "image directory source opened");
        Ok(Self {
            slot: FrameSlot::new(width, height)?,
            paths,
            next: 0,
        })
    }

    fn decode_into(path: &Path, buf: &mut [u8], width: usize, height: usize) -> Result<(), SourceError> {
        let img = image::open(path).map_err(|e| SourceError::Decode {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let rgb = img
            .resize_exact(width as u32, height as u32, FilterType::Nearest)
            .to_rgb8();
        for (px, out) in rgb.pixels().zip(buf.chunks_exact_mut(2)) {
            out.copy_from_slice(&rgb888_to_rgb565(px[0], px[1], px[2]));
        }
        Ok(())
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

impl FrameSource for ImageDirSource {
    fn acquire(&mut self) -> Result<Frame<'_>, SourceError> {
        if self.slot.is_outstanding() {
            return Err(SourceError::Outstanding);
        }
        let path = &self.paths[self.next];
        self.next = (self.next + 1) % self.paths.len();

        let (width, height) = (self.slot.width(), self.slot.height());
        debug!(path = %path.display(), "decoding frame");
        Self::decode_into(path, self.slot.buffer_mut()?, width, height)?;
        self.slot.check_out()
    }

    fn release(&mut self) {
        self.slot.check_in();
    }

    fn has_frame(&self) -> bool {
        self.slot.is_outstanding()
    }

    fn name(&self) -> &str {
        "image_dir"
    }
}
