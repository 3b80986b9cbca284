//! UNetViz Web - interactive 3D diagram of a U-Net image generator
//!
//! Renders the diagram built by `unetviz-core` with Bevy, shows hover
//! captions in an egui side panel and drives the highlight and image
//! animations from the frame clock.

mod animation;
mod app;
mod camera;
mod config;
mod picking;
mod scene;
mod textures;
mod ui;

pub use app::run;

use wasm_bindgen::prelude::*;

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging with filtering to reduce wgpu noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::WARN)
            .build()
    );

    app::run();
}
