//! Bevy application setup

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use unetviz_core::Diagram;

use crate::animation::AnimationPlugin;
use crate::camera::OrbitCameraPlugin;
use crate::config::ConfigPlugin;
use crate::picking::HoverPlugin;
use crate::scene::DiagramScenePlugin;
use crate::textures::TexturePlugin;
use crate::ui::UiPlugin;

/// The diagram model shared by every system
#[derive(Resource, Default)]
pub struct DiagramState(pub Diagram);

/// Frame stages, run in this order every update
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerSet {
    /// Config arrival and diagram construction
    Setup,
    /// Highlight and slider ticks
    Animate,
    /// Texture requests and completions
    Textures,
    /// Copy diagram changes onto entities
    Mirror,
    /// Camera and hover handling
    Input,
}

/// Run the Bevy application
pub fn run() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.96, 0.96, 0.97)))
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "UNetViz - U-Net in 3D".to_string(),
                    canvas: Some("#unetviz-canvas".to_string()),
                    fit_canvas_to_parent: true,
                    prevent_default_event_handling: false,
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                // Images are served from the site root (/img/...)
                file_path: "".to_string(),
                // Don't look for .meta files - server doesn't have them
                meta_check: bevy::asset::AssetMetaCheck::Never,
                ..default()
            })
        )
        // bevy_egui looks for bevy_picking's PickingPlugin; add it before EguiPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .init_resource::<DiagramState>()
        .configure_sets(
            Update,
            (
                ViewerSet::Setup,
                ViewerSet::Animate,
                ViewerSet::Textures,
                ViewerSet::Mirror,
                ViewerSet::Input,
            )
                .chain(),
        )
        .add_plugins(ConfigPlugin)
        .add_plugins(AnimationPlugin)
        .add_plugins(TexturePlugin)
        .add_plugins(DiagramScenePlugin)
        .add_plugins(OrbitCameraPlugin)
        .add_plugins(HoverPlugin)
        .add_plugins(UiPlugin)
        .run();
}
