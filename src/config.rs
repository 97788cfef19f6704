//! Pipeline configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Every setting that changes what the pipeline produces.
///
/// There are no defaults: a config file must name each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Speeds strictly above this value (km/h) are overspeed.
    pub speed_limit_kmh: f64,
    /// Scene scale: meters covered by one pixel of displacement.
    pub meters_per_pixel: f64,
    /// Detector class ids treated as vehicles. Everything else is ignored.
    pub vehicle_classes: Vec<u32>,
    /// Directory receiving evidence images and documents.
    pub evidence_dir: PathBuf,
    /// SQLite database holding the evidence rows.
    pub database_path: PathBuf,
    /// Languages handed to the text recognizer.
    pub recognizer_languages: Vec<String>,
    /// Frames a track may go unobserved before its ledger entry is evicted.
    pub inactivity_frames: u64,
    /// Sampling rate used when the frame source does not report one.
    pub fallback_fps: f64,
    /// Padding (pixels) added around the vehicle box before cropping.
    pub crop_padding_px: u32,
}

impl PipelineConfig {
    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.speed_limit_kmh.is_finite() && self.speed_limit_kmh > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "speed_limit_kmh must be positive, got {}",
                self.speed_limit_kmh
            )));
        }
        if !(self.meters_per_pixel.is_finite() && self.meters_per_pixel > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "meters_per_pixel must be positive, got {}",
                self.meters_per_pixel
            )));
        }
        if !(self.fallback_fps.is_finite() && self.fallback_fps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fallback_fps must be positive, got {}",
                self.fallback_fps
            )));
        }
        if self.vehicle_classes.is_empty() {
            return Err(ConfigError::Invalid("vehicle_classes is empty".into()));
        }
        if self.recognizer_languages.is_empty() {
            return Err(ConfigError::Invalid("recognizer_languages is empty".into()));
        }
        if self.inactivity_frames == 0 {
            return Err(ConfigError::Invalid(
                "inactivity_frames must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn is_vehicle(&self, class_id: u32) -> bool {
        self.vehicle_classes.contains(&class_id)
    }
}
