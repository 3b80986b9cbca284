//! Texture loading through the asset server
//!
//! The diagram asks for image paths; this plugin starts the loads and tells
//! the diagram when each one finishes or fails.

use std::collections::HashMap;

use bevy::asset::LoadState;
use bevy::prelude::*;

use crate::app::{DiagramState, ViewerSet};

pub struct TexturePlugin;

impl Plugin for TexturePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TextureLoads>()
            .add_systems(
                Update,
                (start_texture_loads, poll_texture_loads)
                    .chain()
                    .in_set(ViewerSet::Textures),
            );
    }
}

/// Image handles by asset path, plus the paths still loading
#[derive(Resource, Default)]
pub struct TextureLoads {
    handles: HashMap<String, Handle<Image>>,
    loading: Vec<String>,
}

impl TextureLoads {
    /// Handle for `path`, starting a load if nobody asked for it yet
    pub fn handle(&self, path: &str, asset_server: &AssetServer) -> Handle<Image> {
        match self.handles.get(path) {
            Some(handle) => handle.clone(),
            None => asset_server.load(path.to_string()),
        }
    }

    pub fn loading_count(&self) -> usize {
        self.loading.len()
    }
}

fn start_texture_loads(
    mut diagram: ResMut<DiagramState>,
    mut loads: ResMut<TextureLoads>,
    asset_server: Res<AssetServer>,
) {
    for path in diagram.0.drain_texture_requests() {
        if loads.handles.contains_key(&path) {
            continue;
        }
        tracing::debug!(path = %path, "Loading texture");
        let handle: Handle<Image> = asset_server.load(path.clone());
        loads.handles.insert(path.clone(), handle);
        loads.loading.push(path);
    }
}

fn poll_texture_loads(
    mut diagram: ResMut<DiagramState>,
    mut loads: ResMut<TextureLoads>,
    asset_server: Res<AssetServer>,
) {
    if loads.loading.is_empty() {
        return;
    }

    let TextureLoads { handles, loading } = &mut *loads;
    loading.retain(|path| {
        let Some(handle) = handles.get(path) else {
            return false;
        };
        match asset_server.get_load_state(handle.id()) {
            Some(LoadState::Loaded) => {
                diagram.0.texture_loaded(path);
                false
            }
            Some(LoadState::Failed(err)) => {
                tracing::warn!(path = %path, error = %err, "Texture failed to load");
                diagram.0.texture_failed(path);
                false
            }
            _ => true,
        }
    });
}
