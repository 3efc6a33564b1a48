pub mod image_dir;
pub mod synthetic;

use motion_cam_common::config::CameraConfig;
use motion_cam_common::{FrameSource, SourceError};

pub use image_dir::ImageDirSource;
pub use synthetic::SyntheticSource;

/// Build the frame source named by `camera.source`.
pub fn open(config: &CameraConfig) -> Result<Box<dyn FrameSource>, SourceError> {
    let (width, height) = config.resolution.dimensions();
    match config.source.as_str() {
        "synthetic" => Ok(Box::new(SyntheticSource::new(
            width,
            height,
            &config.synthetic,
        )?)),
        "image_dir" => {
            let dir = config.image_dir.as_deref().ok_or_else(|| {
                SourceError::Unavailable("camera.image_dir is not set".into())
            })?;
            Ok(Box::new(ImageDirSource::open(dir, width, height)?))
        }
        other => Err(SourceError::Unavailable(format!(
            "unknown source '{other}'"
        ))),
    }
}

/// Pack an 8-bit RGB triple into big-endian RGB565.
pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> [u8; 2] {
    [(r & 0xF8) | (g >> 5), ((g & 0x1C) << 3) | (b >> 3)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_cam_common::config::Config;

    #[test]
    fn rgb565_packing() {
        assert_eq!(rgb888_to_rgb565(0, 0, 0), [0x00, 0x00]);
        assert_eq!(rgb888_to_rgb565(255, 255, 255), [0xFF, 0xFF]);
        assert_eq!(rgb888_to_rgb565(255, 0, 0), [0xF8, 0x00]);
        assert_eq!(rgb888_to_rgb565(0, 255, 0), [0x07, 0xE0]);
        assert_eq!(rgb888_to_rgb565(0, 0, 255), [0x00, 0x1F]);
    }

    #[test]
    fn opens_synthetic_source_at_configured_resolution() {
        let config = Config::parse("[camera]\nresolution = \"qqvga\"\n").unwrap();
        let mut source = open(&config.camera).unwrap();
        assert_eq!(source.name(), "synthetic");
        let frame = source.acquire().unwrap();
        assert_eq!((frame.width(), frame.height()), (160, 120));
    }

    #[test]
    fn image_dir_source_needs_directory() {
        let mut config = Config::parse("[camera]\n").unwrap().camera;
        config.source = "image_dir".into();
        assert!(matches!(open(&config), Err(SourceError::Unavailable(_))));
    }
}
