//! Hover captions
//!
//! The pointer position is turned into a ray from the main camera and tested
//! against the diagram model; the caption of the nearest object ends up in
//! [`HoverInfo`].

use bevy::prelude::*;
use bevy::window::{CursorMoved, PrimaryWindow};
use unetviz_core::glam;
use unetviz_core::{hover_caption, Diagram, PerspectiveCamera, ViewerConfig, DEFAULT_PROMPT};

use crate::app::{DiagramState, ViewerSet};
use crate::camera::MainCamera;
use crate::config::ViewerSettings;

pub struct HoverPlugin;

impl Plugin for HoverPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HoverInfo>()
            .add_systems(Update, update_hover.in_set(ViewerSet::Input));
    }
}

/// Text shown in the info panel
#[derive(Resource, Debug, Clone)]
pub struct HoverInfo {
    pub caption: String,
}

impl Default for HoverInfo {
    fn default() -> Self {
        Self {
            caption: DEFAULT_PROMPT.to_string(),
        }
    }
}

fn to_glam(v: Vec3) -> glam::Vec3 {
    glam::Vec3::from_array(v.to_array())
}

/// Caption for a pointer at `pointer` (window coordinates). Anywhere outside
/// the canvas, including over the info panel, shows the prompt.
fn caption_at<'a>(
    diagram: &'a Diagram,
    config: &ViewerConfig,
    window_size: Vec2,
    camera_transform: &GlobalTransform,
    pointer: Vec2,
) -> &'a str {
    let rect = config.canvas.rect(window_size.x, window_size.y);
    let pointer = glam::Vec2::new(pointer.x, pointer.y);
    if !rect.contains(pointer) {
        return DEFAULT_PROMPT;
    }

    let position = camera_transform.translation();
    let camera = PerspectiveCamera {
        position: to_glam(position),
        target: to_glam(position + camera_transform.forward().as_vec3()),
        up: to_glam(camera_transform.up().as_vec3()),
        fov_y_degrees: config.camera.fov_degrees,
        aspect: rect.aspect(),
        near: config.camera.near,
        far: config.camera.far,
    };
    hover_caption(diagram, &camera, pointer, &rect)
}

fn update_hover(
    mut cursor_moved: MessageReader<CursorMoved>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<&GlobalTransform, With<MainCamera>>,
    settings: Res<ViewerSettings>,
    diagram: Res<DiagramState>,
    mut hover: ResMut<HoverInfo>,
) {
    let Some(moved) = cursor_moved.read().last() else { return };
    let Ok(window) = windows.single() else { return };
    let Ok(camera_transform) = cameras.single() else { return };

    let caption = caption_at(
        &diagram.0,
        &settings.config,
        Vec2::new(window.width(), window.height()),
        camera_transform,
        moved.position,
    );
    if hover.caption != caption {
        tracing::trace!(caption = %caption, "Hover caption changed");
        hover.caption = caption.to_string();
    }
}
