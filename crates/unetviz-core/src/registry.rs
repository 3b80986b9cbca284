//! Object registry: string ids and captions for scene nodes

use std::collections::HashMap;

use crate::scene::{NodeId, Scene};

/// Caption shown when a node has no caption of its own or of its group
pub const UNKNOWN_OBJECT: &str = "Unknown object";

/// Maps stable ids to scene nodes and nodes to captions.
///
/// Registering an id that already exists replaces the lookup result; the
/// earlier node stays in the scene and stays pickable.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    by_id: HashMap<String, NodeId>,
    captions: HashMap<NodeId, String>,
    pickable: Vec<NodeId>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `id -> node` and the node's caption, and make the node pickable
    pub fn register(&mut self, id: impl Into<String>, node: NodeId, caption: impl Into<String>) {
        let id = id.into();
        if let Some(previous) = self.by_id.insert(id.clone(), node) {
            if previous != node {
                tracing::debug!(id = %id, "id re-registered, previous node shadowed");
            }
        }
        self.captions.insert(node, caption.into());
        if !self.pickable.contains(&node) {
            self.pickable.push(node);
        }
    }

    /// Caption a child part so hovering it reads the same as its owner
    pub fn register_part(&mut self, node: NodeId, caption: impl Into<String>) {
        self.captions.insert(node, caption.into());
    }

    pub fn resolve(&self, id: &str) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    /// Caption of `node`, or of its immediate owning group
    pub fn find_caption<'a>(&'a self, scene: &Scene, node: NodeId) -> Option<&'a str> {
        self.captions
            .get(&node)
            .or_else(|| scene.parent(node).and_then(|parent| self.captions.get(&parent)))
            .map(String::as_str)
    }

    /// Like [`find_caption`](Self::find_caption) with the unknown-object fallback
    pub fn caption_of<'a>(&'a self, scene: &Scene, node: NodeId) -> &'a str {
        self.find_caption(scene, node).unwrap_or(UNKNOWN_OBJECT)
    }

    /// Top-level nodes tested by the picker, in registration order
    pub fn pickable(&self) -> &[NodeId] {
        &self.pickable
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
