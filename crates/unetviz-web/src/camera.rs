//! Orbit camera and canvas viewport
//!
//! Left drag orbits, right drag pans, the wheel zooms; one finger orbits and
//! two fingers pinch. Zoom and pan ease towards their targets.

use bevy::camera::Viewport;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use unetviz_core::config::CameraConfig;

use crate::app::ViewerSet;
use crate::config::{ConfigLoaded, ViewerSettings};

pub struct OrbitCameraPlugin;

impl Plugin for OrbitCameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OrbitCamera>()
            .add_systems(Startup, spawn_camera)
            .add_systems(Update, apply_camera_config.in_set(ViewerSet::Setup))
            .add_systems(Update, (update_viewport, update_camera).in_set(ViewerSet::Input));
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Orbit state around `target`, Y up
#[derive(Debug, Clone, Resource)]
pub struct OrbitCamera {
    pub distance: f32,
    pub target_distance: f32, // For smooth zoom
    pub azimuth: f32,
    pub elevation: f32,
    pub target: Vec3,
    pub target_focus: Vec3, // For smooth panning
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl OrbitCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        let target = Vec3::from_array(config.target);
        let offset = Vec3::from_array(config.position) - target;
        let distance = offset.length().max(1.0);
        Self {
            distance,
            target_distance: distance,
            azimuth: offset.x.atan2(offset.z),
            elevation: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            target,
            target_focus: target,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: config.damping,
        }
    }

    /// Camera position for the current angles and distance
    pub fn eye(&self) -> Vec3 {
        let x = self.distance * self.elevation.cos() * self.azimuth.sin();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.elevation.cos() * self.azimuth.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Share of the remaining distance covered this frame
    fn lerp_factor(&self, dt: f32) -> f32 {
        if self.smooth_factor <= 0.0 {
            1.0
        } else {
            1.0 - (-self.smooth_factor * 60.0 * dt).exp()
        }
    }
}

fn perspective(config: &CameraConfig) -> Projection {
    Projection::Perspective(PerspectiveProjection {
        fov: config.fov_degrees.to_radians(),
        near: config.near,
        far: config.far,
        ..default()
    })
}

fn spawn_camera(mut commands: Commands, orbit: Res<OrbitCamera>) {
    let config = CameraConfig::default();
    commands.spawn((
        Camera3d::default(),
        perspective(&config),
        Transform::from_translation(orbit.eye()).looking_at(orbit.target, Vec3::Y),
        MainCamera,
    ));
}

fn apply_camera_config(
    mut loaded: MessageReader<ConfigLoaded>,
    settings: Res<ViewerSettings>,
    mut orbit: ResMut<OrbitCamera>,
    mut cameras: Query<&mut Projection, With<MainCamera>>,
) {
    if loaded.read().last().is_none() {
        return;
    }
    *orbit = OrbitCamera::from_config(&settings.config.camera);
    if let Ok(mut projection) = cameras.single_mut() {
        *projection = perspective(&settings.config.camera);
    }
}

/// Keep the 3D view in the left part of the window; the info panel takes the rest
fn update_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    settings: Res<ViewerSettings>,
    mut cameras: Query<&mut Camera, With<MainCamera>>,
) {
    let Ok(window) = windows.single() else { return };
    let Ok(mut camera) = cameras.single_mut() else { return };

    let fraction = settings.config.canvas.width_fraction.clamp(0.1, 1.0);
    let size = UVec2::new(
        ((window.physical_width() as f32 * fraction) as u32).max(1),
        window.physical_height().max(1),
    );
    let unchanged = camera
        .viewport
        .as_ref()
        .is_some_and(|viewport| viewport.physical_size == size);
    if !unchanged {
        camera.viewport = Some(Viewport {
            physical_position: UVec2::ZERO,
            physical_size: size,
            ..default()
        });
    }
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut orbit: ResMut<OrbitCamera>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    time: Res<Time>,
    mut contexts: bevy_egui::EguiContexts,
) {
    // Check if egui wants the mouse - if so, don't process camera controls
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);

    let total_motion: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();

    // Orbit with left mouse drag
    if mouse_button.pressed(MouseButton::Left) && !egui_wants_pointer {
        orbit.azimuth -= total_motion.x * orbit.sensitivity;
        orbit.elevation = (orbit.elevation + total_motion.y * orbit.sensitivity).clamp(-1.5, 1.5);
    }

    // Pan with right mouse drag, in the camera's screen plane
    if mouse_button.pressed(MouseButton::Right) && !egui_wants_pointer {
        let right = Vec3::new(orbit.azimuth.cos(), 0.0, -orbit.azimuth.sin());
        let forward = (orbit.target - orbit.eye()).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        let pan_speed = orbit.distance * 0.002;
        let delta = -right * total_motion.x * pan_speed + up * total_motion.y * pan_speed;
        orbit.target_focus += delta;
    }

    // Zoom with scroll; drain the events even when the UI has the pointer
    for scroll in mouse_wheel.read() {
        if !egui_wants_pointer {
            let zoom_factor = 1.0 - scroll.y * orbit.zoom_speed;
            orbit.target_distance = (orbit.target_distance * zoom_factor).clamp(2.0, 500.0);
        }
    }

    // Touch support for mobile
    if touch_input.iter().count() == 1 && !egui_wants_pointer {
        for touch in touch_input.iter() {
            let delta = touch.delta();
            if delta != Vec2::ZERO {
                orbit.azimuth -= delta.x * orbit.sensitivity;
                orbit.elevation = (orbit.elevation + delta.y * orbit.sensitivity).clamp(-1.5, 1.5);
            }
        }
    }

    // Pinch to zoom
    if touch_input.iter().count() == 2 {
        let touches: Vec<_> = touch_input.iter().collect();
        if let (Some(t1), Some(t2)) = (touches.first(), touches.get(1)) {
            let curr_dist = t1.position().distance(t2.position());
            let prev_dist = (t1.position() - t1.delta()).distance(t2.position() - t2.delta());
            let zoom_factor = prev_dist / curr_dist.max(1.0);
            orbit.target_distance = (orbit.target_distance * zoom_factor).clamp(2.0, 500.0);
        }
    }

    // Smooth interpolation for zoom and pan
    let lerp_factor = orbit.lerp_factor(time.delta_secs());
    orbit.distance += (orbit.target_distance - orbit.distance) * lerp_factor;
    let focus = orbit.target_focus;
    let current_target = orbit.target;
    orbit.target += (focus - current_target) * lerp_factor;

    if let Ok(mut transform) = camera_query.single_mut() {
        transform.translation = orbit.eye();
        transform.look_at(orbit.target, Vec3::Y);
    }
}
