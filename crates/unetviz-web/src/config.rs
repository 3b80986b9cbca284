//! Viewer config loading
//!
//! In the browser the config comes from `/api/config` (or the URL given by a
//! `?config=` query parameter). Natively it is read from `unetviz.toml`.
//! Either way a failure falls back to the defaults.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use unetviz_core::ViewerConfig;

use crate::app::ViewerSet;

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingConfig>()
            .init_resource::<ViewerSettings>()
            .add_message::<ConfigLoaded>()
            .add_systems(Startup, request_config)
            .add_systems(Update, apply_pending_config.in_set(ViewerSet::Setup));
    }
}

/// Config currently in effect
#[derive(Resource, Debug, Clone, Default)]
pub struct ViewerSettings {
    pub config: ViewerConfig,
    pub ready: bool,
}

/// Sent once, when the config is known
#[derive(Message, Debug, Clone)]
pub struct ConfigLoaded;

/// Filled by the async fetch, drained on the next frame
#[derive(Resource, Default)]
pub struct PendingConfig(pub Arc<Mutex<Option<ViewerConfig>>>);

#[cfg(target_arch = "wasm32")]
const CONFIG_URL: &str = "/api/config";
#[cfg(not(target_arch = "wasm32"))]
const CONFIG_FILE: &str = "unetviz.toml";

fn request_config(pending: Res<PendingConfig>) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let pending_clone = pending.0.clone();
        let url = config_url_parameter().unwrap_or_else(|| CONFIG_URL.to_string());

        spawn_local(async move {
            tracing::info!("Fetching viewer config from: {}", url);
            let config = match fetch_config(&url).await {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Viewer config unavailable ({}), using defaults", e);
                    ViewerConfig::default()
                }
            };
            if let Ok(mut slot) = pending_clone.lock() {
                *slot = Some(config);
            }
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let config = ViewerConfig::load(std::path::Path::new(CONFIG_FILE)).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Viewer config invalid, using defaults");
            ViewerConfig::default()
        });
        if let Ok(mut slot) = pending.0.lock() {
            *slot = Some(config);
        }
    }
}

/// `?config=` parameter of the page URL, if any
#[cfg(target_arch = "wasm32")]
fn config_url_parameter() -> Option<String> {
    let href = web_sys::window()?.location().href().ok()?;
    let url = web_sys::Url::new(&href).ok()?;
    url.search_params().get("config")
}

#[cfg(target_arch = "wasm32")]
async fn fetch_config(url: &str) -> Result<ViewerConfig, String> {
    let response = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| format!("Fetch failed: {:?}", e))?;
    if !response.ok() {
        return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
    }
    let text = response
        .text()
        .await
        .map_err(|e| format!("Text extraction failed: {:?}", e))?;
    serde_json::from_str(&text).map_err(|e| format!("JSON parse error: {}", e))
}

fn apply_pending_config(
    pending: Res<PendingConfig>,
    mut settings: ResMut<ViewerSettings>,
    mut loaded: MessageWriter<ConfigLoaded>,
) {
    if settings.ready {
        return;
    }
    let Ok(mut slot) = pending.0.try_lock() else { return };
    if let Some(config) = slot.take() {
        settings.config = config;
        settings.ready = true;
        loaded.write(ConfigLoaded);
    }
}
