//! Diagram context: the scene graph, its registry and pending texture work
//!
//! One `Diagram` owns everything the builder, animator and picker share. It is
//! passed to them explicitly, so several diagrams can coexist (the tests build
//! a fresh one each).

use thiserror::Error;
use tracing::{debug, warn};

use crate::builder::PendingCubeBuild;
use crate::material::MaterialSlot;
use crate::registry::ObjectRegistry;
use crate::scene::{NodeId, Scene};
use crate::texture::{TextureState, TextureStore};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagramError {
    #[error("Unknown object id: {0}")]
    UnknownObject(String),
    #[error("Texture unavailable: {0}")]
    TextureUnavailable(String),
    #[error("Face index {face} out of range for {id} (expected 0-5)")]
    FaceOutOfRange { id: String, face: usize },
}

/// Texture swap waiting for its image to load
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FaceSwap {
    id: String,
    texture: String,
    face_index: usize,
}

#[derive(Debug, Default)]
pub struct Diagram {
    pub scene: Scene,
    pub registry: ObjectRegistry,
    pub(crate) textures: TextureStore,
    pub(crate) pending_cubes: Vec<PendingCubeBuild>,
    pending_swaps: Vec<FaceSwap>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, id: &str) -> Option<NodeId> {
        self.registry.resolve(id)
    }

    pub fn caption_of(&self, node: NodeId) -> &str {
        self.registry.caption_of(&self.scene, node)
    }

    pub fn texture_state(&self, path: &str) -> Option<TextureState> {
        self.textures.state(path)
    }

    /// Asset paths the host should start loading
    pub fn drain_texture_requests(&mut self) -> Vec<String> {
        self.textures.drain_requests()
    }

    /// Number of image cubes still waiting for their texture
    pub fn pending_cube_count(&self) -> usize {
        self.pending_cubes.len()
    }

    /// The host finished loading `path`: build waiting cubes, apply waiting swaps
    pub fn texture_loaded(&mut self, path: &str) {
        self.textures.mark_ready(path);

        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_cubes)
            .into_iter()
            .partition(|build| build.texture() == path);
        self.pending_cubes = waiting;
        for build in ready {
            build.finish(self);
        }

        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_swaps)
            .into_iter()
            .partition(|swap| swap.texture == path);
        self.pending_swaps = waiting;
        for swap in ready {
            self.apply_face_texture(&swap);
        }
    }

    /// The host could not load `path`. Cubes waiting on it are never built.
    pub fn texture_failed(&mut self, path: &str) {
        self.textures.mark_failed(path);

        let before = self.pending_cubes.len();
        self.pending_cubes.retain(|build| build.texture() != path);
        let dropped = before - self.pending_cubes.len();
        if dropped > 0 {
            warn!(path = %path, cubes = dropped, "Texture failed to load, image cubes skipped");
        }

        let before = self.pending_swaps.len();
        self.pending_swaps.retain(|swap| swap.texture != path);
        if self.pending_swaps.len() != before {
            warn!(path = %path, "Texture failed to load, image swap skipped");
        }
    }

    /// Replace the texture on face `face_index` of the cube registered as `id`.
    ///
    /// Only a face flagged as the image face is changed; anything else is
    /// logged and skipped. The swap happens once the texture is loaded.
    pub fn change_cube_image(&mut self, id: &str, texture: &str, face_index: usize) {
        if self.resolve(id).is_none() {
            warn!(id = %id, "No object with this id, image change skipped");
            return;
        }

        let swap = FaceSwap {
            id: id.to_string(),
            texture: texture.to_string(),
            face_index,
        };
        match self.textures.request(texture) {
            TextureState::Ready => self.apply_face_texture(&swap),
            TextureState::Loading => self.pending_swaps.push(swap),
            TextureState::Failed => {
                warn!(path = %texture, "Texture previously failed, image change skipped");
            }
        }
    }

    fn apply_face_texture(&mut self, swap: &FaceSwap) {
        let Some(node) = self.resolve(&swap.id) else {
            warn!(id = %swap.id, "No object with this id, image change skipped");
            return;
        };
        let slot = MaterialSlot {
            node,
            index: swap.face_index,
        };
        if !self.scene.material(slot).is_some_and(|m| m.is_image_face) {
            warn!(id = %swap.id, face = swap.face_index, "No image face at this index");
            return;
        }
        if let Some(material) = self.scene.material_mut(slot) {
            material.texture = Some(swap.texture.clone());
            debug!(id = %swap.id, path = %swap.texture, "Image face updated");
        }
    }
}
