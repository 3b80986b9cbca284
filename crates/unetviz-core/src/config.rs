//! Viewer configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::highlight::{Axis, HighlightSettings, PositionOffset};
use crate::viewport::{self, CanvasRect};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid viewer config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize viewer config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Everything the front end needs to lay out and animate the diagram
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub slider: SliderConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub target: [f32; 3],
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    /// Orbit damping factor, 0 disables smoothing
    #[serde(default = "default_damping")]
    pub damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov(),
            position: default_camera_position(),
            target: [0.0; 3],
            near: default_near(),
            far: default_far(),
            damping: default_damping(),
        }
    }
}

fn default_fov() -> f32 {
    75.0
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 0.0, 60.0]
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

fn default_damping() -> f32 {
    0.05
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Share of the window width given to the 3D view
    #[serde(default = "default_width_fraction")]
    pub width_fraction: f32,
    /// Portrait windows narrower than this get the rotate prompt
    #[serde(default = "default_rotate_prompt_max_width")]
    pub rotate_prompt_max_width: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width_fraction: default_width_fraction(),
            rotate_prompt_max_width: default_rotate_prompt_max_width(),
        }
    }
}

impl CanvasConfig {
    pub fn rect(&self, window_width: f32, window_height: f32) -> CanvasRect {
        CanvasRect::for_window(window_width, window_height, self.width_fraction)
    }

    pub fn needs_rotate_prompt(&self, window_width: f32, window_height: f32) -> bool {
        viewport::needs_rotate_prompt(window_width, window_height, self.rotate_prompt_max_width)
    }
}

fn default_width_fraction() -> f32 {
    viewport::CANVAS_WIDTH_FRACTION
}

fn default_rotate_prompt_max_width() -> f32 {
    viewport::ROTATE_PROMPT_MAX_WIDTH
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightConfig {
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    #[serde(default = "default_lightness_boost")]
    pub lightness_boost: f32,
    /// Displacement while highlighted; 0 keeps objects in place
    #[serde(default = "default_offset")]
    pub offset: f32,
    #[serde(default)]
    pub axis: Axis,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            step_ms: default_step_ms(),
            lightness_boost: default_lightness_boost(),
            offset: default_offset(),
            axis: Axis::default(),
        }
    }
}

impl HighlightConfig {
    pub fn settings(&self) -> HighlightSettings {
        HighlightSettings {
            step: Duration::from_millis(self.step_ms),
            lightness_boost: self.lightness_boost,
            offset: (self.offset != 0.0).then_some(PositionOffset {
                axis: self.axis,
                amount: self.offset,
            }),
        }
    }
}

fn default_step_ms() -> u64 {
    500
}

fn default_lightness_boost() -> f32 {
    0.2
}

fn default_offset() -> f32 {
    0.1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderConfig {
    /// Id of the image cube the slider drives
    #[serde(default = "default_slider_target")]
    pub target: String,
    #[serde(default = "default_slider_face")]
    pub face: usize,
    #[serde(default = "default_slider_interval_ms")]
    pub interval_ms: u64,
    /// File names inside the image directory, shown in order
    #[serde(default = "default_slider_images")]
    pub images: Vec<String>,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            target: default_slider_target(),
            face: default_slider_face(),
            interval_ms: default_slider_interval_ms(),
            images: default_slider_images(),
        }
    }
}

impl SliderConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_slider_target() -> String {
    "preVisu".to_string()
}

fn default_slider_face() -> usize {
    4
}

fn default_slider_interval_ms() -> u64 {
    11_500
}

fn default_slider_images() -> Vec<String> {
    [1, 2, 3, 4, 5, 6, 8, 9, 0]
        .iter()
        .map(|step| format!("step{}.jpeg", step))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Image directory, relative to the asset root
    #[serde(default = "default_img_dir")]
    pub img_dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            img_dir: default_img_dir(),
        }
    }
}

fn default_img_dir() -> String {
    "img".to_string()
}

impl ViewerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Read `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "Viewer config not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "Loaded viewer config");
        Ok(config)
    }

    /// Asset path of an image file name
    pub fn asset_path(&self, file: &str) -> String {
        let dir = self.assets.img_dir.trim_end_matches('/');
        if dir.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", dir, file)
        }
    }

    /// Slider images as asset paths
    pub fn slider_images(&self) -> Vec<String> {
        self.slider.images.iter().map(|file| self.asset_path(file)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.camera.position, [0.0, 0.0, 60.0]);
        assert_eq!(config.canvas.width_fraction, 0.8);
        assert_eq!(config.slider.target, "preVisu");
        assert_eq!(config.slider.images.len(), 9);
        assert_eq!(config.slider_images()[0], "img/step1.jpeg");

        let settings = config.highlight.settings();
        assert_eq!(settings.step, Duration::from_millis(500));
        assert_eq!(
            settings.offset,
            Some(PositionOffset {
                axis: Axis::Y,
                amount: 0.1
            })
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [highlight]
            step_ms = 250
            offset = 0.0

            [assets]
            img_dir = "static/img/"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.highlight.step_ms, 250);
        assert_eq!(config.highlight.lightness_boost, 0.2);
        assert_eq!(config.highlight.settings().offset, None);
        assert_eq!(config.asset_path("emb.jpeg"), "static/img/emb.jpeg");
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let result = ViewerConfig::from_toml_str("[highlight]\nstep_ms = \"soon\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[slider]\ninterval_ms = 2000\nimages = [\"a.jpeg\", \"b.jpeg\"]").expect("write");

        let config = ViewerConfig::load(file.path()).expect("load");
        assert_eq!(config.slider.interval(), Duration::from_secs(2));
        assert_eq!(config.slider_images(), vec!["img/a.jpeg", "img/b.jpeg"]);
        assert_eq!(config.slider.face, 4);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = ViewerConfig::load(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ViewerConfig::default();
        config.highlight.axis = Axis::X;
        config.canvas.width_fraction = 0.75;
        let text = config.to_toml_string().expect("serialize");
        assert_eq!(ViewerConfig::from_toml_str(&text).expect("parse"), config);
    }
}
