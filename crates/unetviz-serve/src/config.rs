//! Server configuration
//!
//! One TOML file holds the `[server]` section for this binary and the
//! `[viewer]` section handed to the web front end through `/api/config`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use unetviz_core::ViewerConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for web server
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Built wasm bundle and index.html
    #[serde(default = "default_web_dir")]
    pub web_dir: PathBuf,
    /// Root of the image assets; the viewer's `img_dir` lives below it
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            web_dir: default_web_dir(),
            assets_dir: default_assets_dir(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_web_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

impl Config {
    /// Directory served under `/<img_dir>`
    pub fn image_dir(&self) -> PathBuf {
        self.server.assets_dir.join(&self.viewer.assets.img_dir)
    }

    /// URL prefix the viewer loads images from
    pub fn image_route(&self) -> String {
        format!("/{}", self.viewer.assets.img_dir.trim_matches('/'))
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}
