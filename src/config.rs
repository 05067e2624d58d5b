//! Application configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierKind;

/// Top-level configuration, loaded from a JSON file.
///
/// Missing fields fall back to their defaults; a missing file yields the
/// full default configuration, which is written back so the file documents
/// every available knob. CLI flags override individual fields per
/// invocation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub extractor: ExtractorConfig,
    /// CSV dataset written by `collect` and read by `train`.
    pub dataset_path: PathBuf,
    /// Directory holding persisted model artifacts.
    pub model_dir: PathBuf,
    /// Classifiers trained by `train` and loaded by `infer`.
    pub classifiers: Vec<ClassifierKind>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture device index; 0 is the default camera.
    pub index: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// ONNX hand landmark network consumed by the extractor.
    pub model_path: PathBuf,
    /// Presence threshold for full-frame detection passes, in `0.0..=1.0`.
    pub detection_confidence: f32,
    /// Presence threshold for tracked region-of-interest passes, in
    /// `0.0..=1.0`.
    pub tracking_confidence: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            extractor: ExtractorConfig::default(),
            dataset_path: PathBuf::from("data/sign_data.csv"),
            model_dir: PathBuf::from("models"),
            classifiers: vec![ClassifierKind::Forest, ClassifierKind::Svm],
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { index: 0 }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("hand_landmark.onnx"),
            detection_confidence: 0.5,
            tracking_confidence: 0.5,
        }
    }
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "handsign.json";

    /// Loads the configuration from `path`, creating the file with default
    /// values if it does not exist. A file that exists but does not parse is
    /// an error rather than silently replaced.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config
                .save(path)
                .with_context(|| format!("failed to write default config `{}`", path.display()))?;
            log::info!("created default config `{}`", path.display());
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config `{}`", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("config `{}` is not valid", path.display()))?;
        log::debug!("loaded config `{}`", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("failed to write config `{}`", path.display()))
    }
}
