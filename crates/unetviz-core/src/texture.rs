//! Texture load bookkeeping
//!
//! The core never decodes images. It records which asset paths it needs; the
//! host drains those requests, loads them however it likes and reports back
//! through [`Diagram::texture_loaded`](crate::Diagram::texture_loaded) or
//! [`Diagram::texture_failed`](crate::Diagram::texture_failed).

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Default)]
pub struct TextureStore {
    states: HashMap<String, TextureState>,
    requests: Vec<String>,
}

impl TextureStore {
    /// Ask for `path`; queues a host request the first time it is seen
    pub fn request(&mut self, path: &str) -> TextureState {
        if let Some(state) = self.states.get(path) {
            return *state;
        }
        self.states.insert(path.to_string(), TextureState::Loading);
        self.requests.push(path.to_string());
        TextureState::Loading
    }

    pub fn state(&self, path: &str) -> Option<TextureState> {
        self.states.get(path).copied()
    }

    pub fn drain_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.requests)
    }

    pub fn mark_ready(&mut self, path: &str) {
        self.states.insert(path.to_string(), TextureState::Ready);
    }

    pub fn mark_failed(&mut self, path: &str) {
        self.states.insert(path.to_string(), TextureState::Failed);
    }
}
