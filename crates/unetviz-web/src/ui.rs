//! UI overlays using bevy_egui

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::config::ViewerSettings;
use crate::picking::HoverInfo;
use crate::scene::PendingCubes;
use crate::textures::TextureLoads;

/// Plain ASCII so egui's bundled fonts can draw it
const ROTATE_TITLE: &str = "Rotate your device";
const ROTATE_HINT: &str = "Please turn it to landscape for the best view.";

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        // Runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
        app.add_systems(EguiPrimaryContextPass, ui_system);
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    windows: Query<&Window, With<PrimaryWindow>>,
    settings: Res<ViewerSettings>,
    hover: Res<HoverInfo>,
    pending: Res<PendingCubes>,
    textures: Res<TextureLoads>,
) {
    let Ok(window) = windows.single() else { return };
    let Ok(ctx) = contexts.ctx_mut() else { return };

    let canvas = &settings.config.canvas;
    let fraction = canvas.width_fraction.clamp(0.1, 1.0);
    let panel_width = (window.width() * (1.0 - fraction)).max(80.0);

    egui::SidePanel::right("info_panel")
        .exact_width(panel_width)
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading("U-Net in 3D");
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.label(egui::RichText::new(&hover.caption).size(15.0));
            });

            ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                if !settings.ready {
                    ui.weak("Loading config...");
                } else if !pending.0.is_empty() || textures.loading_count() > 0 {
                    ui.weak(format!("Loading images ({})...", textures.loading_count()));
                }
            });
        });

    if canvas.needs_rotate_prompt(window.width(), window.height()) {
        egui::Window::new(ROTATE_TITLE)
            .collapsible(false)
            .resizable(false)
            .title_bar(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading(ROTATE_TITLE);
                    ui.label(ROTATE_HINT);
                });
            });
    }
}
