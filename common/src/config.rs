use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub camera: CameraConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "default_max_fps")]
    pub max_fps: f64,
    #[serde(default)]
    pub image_dir: Option<PathBuf>,
    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyntheticConfig {
    #[serde(default = "default_idle_frames")]
    pub idle_frames: u32,
    #[serde(default = "default_active_frames")]
    pub active_frames: u32,
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            idle_frames: default_idle_frames(),
            active_frames: default_active_frames(),
            block_size: default_block_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_stride")]
    pub stride: u8,
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    #[serde(default = "default_ratio")]
    pub ratio: f32,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            stride: default_stride(),
            threshold: default_threshold(),
            ratio: default_ratio(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Sensor frame sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Qqvga,
    Qcif,
    Hqvga,
    #[default]
    Qvga,
    Cif,
    Vga,
    Svga,
    Xga,
    Hd,
    Sxga,
    Uxga,
}

impl Resolution {
    /// `(width, height)` in pixels.
    pub fn dimensions(self) -> (usize, usize) {
        match self {
            Resolution::Qqvga => (160, 120),
            Resolution::Qcif => (176, 144),
            Resolution::Hqvga => (240, 176),
            Resolution::Qvga => (320, 240),
            Resolution::Cif => (400, 296),
            Resolution::Vga => (640, 480),
            Resolution::Svga => (800, 600),
            Resolution::Xga => (1024, 768),
            Resolution::Hd => (1280, 720),
            Resolution::Sxga => (1280, 1024),
            Resolution::Uxga => (1600, 1200),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// `detector.ratio` is not checked here; `MotionDetector` rejects
    /// out-of-range values itself and keeps its default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.camera.max_fps.is_finite() && self.camera.max_fps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.max_fps must be positive, got {}",
                self.camera.max_fps
            )));
        }
        match self.camera.source.as_str() {
            "synthetic" => {
                if self.camera.synthetic.block_size == 0 {
                    return Err(ConfigError::Invalid(
                        "camera.synthetic.block_size must be non-zero".into(),
                    ));
                }
            }
            "image_dir" => {
                if self.camera.image_dir.is_none() {
                    return Err(ConfigError::Invalid(
                        "camera.image_dir is required for the image_dir source".into(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown camera.source '{other}', expected 'synthetic' or 'image_dir'"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_source() -> String {
    "synthetic".into()
}
fn default_max_fps() -> f64 {
    10.0
}
fn default_idle_frames() -> u32 {
    30
}
fn default_active_frames() -> u32 {
    10
}
fn default_block_size() -> usize {
    96
}
fn default_stride() -> u8 {
    4
}
fn default_threshold() -> u8 {
    5
}
fn default_ratio() -> f32 {
    0.2
}
fn default_cooldown_ms() -> u64 {
    5000
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::parse("[camera]\n").unwrap();
        assert_eq!(config.camera.source, "synthetic");
        assert_eq!(config.camera.resolution, Resolution::Qvga);
        assert_eq!(config.camera.max_fps, 10.0);
        assert_eq!(config.camera.synthetic.block_size, 96);
        assert_eq!(config.detector.stride, 4);
        assert_eq!(config.detector.threshold, 5);
        assert_eq!(config.detector.ratio, 0.2);
        assert_eq!(config.detector.cooldown_ms, 5000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn full_config() {
        let config = Config::parse(
            r#"
            [camera]
            source = "image_dir"
            resolution = "qqvga"
            max_fps = 2.5
            image_dir = "/tmp/frames"

            [detector]
            stride = 8
            threshold = 12
            ratio = 0.5
            cooldown_ms = 100

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.camera.resolution.dimensions(), (160, 120));
        assert_eq!(config.camera.image_dir, Some(PathBuf::from("/tmp/frames")));
        assert_eq!(config.detector.stride, 8);
        assert_eq!(config.detector.ratio, 0.5);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn image_dir_source_requires_directory() {
        let err = Config::parse("[camera]\nsource = \"image_dir\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_source_rejected() {
        let err = Config::parse("[camera]\nsource = \"usb\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn non_positive_fps_rejected() {
        let err = Config::parse("[camera]\nmax_fps = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_resolution_is_parse_error() {
        let err = Config::parse("[camera]\nresolution = \"8k\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file() {
        let err = Config::load(Path::new("/nonexistent/motion-cam.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile(..)));
    }
}
