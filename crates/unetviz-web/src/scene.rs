//! Diagram construction and its mirror in Bevy entities
//!
//! The core scene is the source of truth. New root nodes are spawned as
//! entity trees; changed nodes get their transform and materials copied over.

use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI};

use bevy::prelude::*;
use unetviz_core::geometry::{Geometry, BOX_FACES};
use unetviz_core::layout::build_unet_diagram;
use unetviz_core::scene::Transform as NodeTransform;
use unetviz_core::{Material as DiagramMaterial, NodeId, NodeKind, PendingCube, Scene};

use crate::animation::AnimationState;
use crate::app::{DiagramState, ViewerSet};
use crate::config::{ConfigLoaded, ViewerSettings};
use crate::textures::TextureLoads;

pub struct DiagramScenePlugin;

impl Plugin for DiagramScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NodeEntities>()
            .init_resource::<PendingCubes>()
            .add_systems(Update, (build_diagram, report_cubes).chain().in_set(ViewerSet::Setup))
            .add_systems(
                Update,
                (spawn_added_nodes, sync_changed_nodes)
                    .chain()
                    .in_set(ViewerSet::Mirror),
            );
    }
}

/// Links an entity to its diagram node
#[derive(Component)]
pub struct DiagramNode(pub NodeId);

/// Material handles of a mesh node, in the node's material order
#[derive(Component, Default)]
pub struct NodeMaterials(pub Vec<Handle<StandardMaterial>>);

#[derive(Resource, Default)]
pub struct NodeEntities(pub HashMap<NodeId, Entity>);

/// Image cubes whose textures are still on the way
#[derive(Resource, Default)]
pub struct PendingCubes(pub Vec<PendingCube>);

fn build_diagram(
    mut loaded: MessageReader<ConfigLoaded>,
    settings: Res<ViewerSettings>,
    mut diagram: ResMut<DiagramState>,
    mut pending: ResMut<PendingCubes>,
    mut animation: ResMut<AnimationState>,
) {
    if loaded.read().last().is_none() {
        return;
    }
    if !diagram.0.registry.is_empty() {
        tracing::warn!("Diagram already built, ignoring new config");
        return;
    }

    pending.0 = build_unet_diagram(&mut diagram.0, &settings.config);
    animation.restart(&settings.config);
}

fn report_cubes(mut pending: ResMut<PendingCubes>) {
    pending.0.retain_mut(|cube| match cube.try_take() {
        None => true,
        Some(Ok(entry)) => {
            tracing::debug!(id = %entry.id, "Image cube ready");
            false
        }
        Some(Err(err)) => {
            tracing::warn!(error = %err, "Image cube dropped");
            false
        }
    });
}

/// Asset stores needed to turn diagram nodes into entities
struct MirrorAssets<'a> {
    meshes: &'a mut Assets<Mesh>,
    materials: &'a mut Assets<StandardMaterial>,
    textures: &'a TextureLoads,
    asset_server: &'a AssetServer,
}

fn spawn_added_nodes(
    mut commands: Commands,
    mut diagram: ResMut<DiagramState>,
    mut entities: ResMut<NodeEntities>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    textures: Res<TextureLoads>,
    asset_server: Res<AssetServer>,
) {
    let added = diagram.0.scene.drain_added();
    if added.is_empty() {
        return;
    }

    let mut assets = MirrorAssets {
        meshes: &mut meshes,
        materials: &mut materials,
        textures: &textures,
        asset_server: &asset_server,
    };
    for root in added {
        spawn_node(&mut commands, &mut assets, &diagram.0.scene, root, None, &mut entities);
    }
}

fn spawn_node(
    commands: &mut Commands,
    assets: &mut MirrorAssets,
    scene: &Scene,
    id: NodeId,
    parent: Option<Entity>,
    entities: &mut NodeEntities,
) {
    let Some(node) = scene.node(id) else { return };

    let entity = {
        let mut entity = commands.spawn((
            Name::new(node.name.clone()),
            DiagramNode(id),
            to_bevy_transform(&node.transform),
            Visibility::default(),
        ));
        if let Some(parent) = parent {
            entity.insert(ChildOf(parent));
        }
        entity.id()
    };
    entities.0.insert(id, entity);

    match &node.kind {
        NodeKind::Group { children } => {
            for &child in children {
                spawn_node(commands, assets, scene, child, Some(entity), entities);
            }
        }
        NodeKind::Mesh(mesh) => {
            let handles: Vec<Handle<StandardMaterial>> = mesh
                .materials
                .iter()
                .map(|material| {
                    let standard = standard_material(material, assets.textures, assets.asset_server);
                    assets.materials.add(standard)
                })
                .collect();

            match mesh.geometry {
                // One quad per face so each face keeps its own material
                Geometry::Box { width, height, depth } if handles.len() == BOX_FACES => {
                    for (face, handle) in handles.iter().enumerate() {
                        let (size, transform) = box_face(face, width, height, depth);
                        commands.spawn((
                            Mesh3d(assets.meshes.add(Rectangle::new(size.x, size.y))),
                            MeshMaterial3d(handle.clone()),
                            transform,
                            ChildOf(entity),
                        ));
                    }
                }
                geometry => {
                    if let Some(handle) = handles.first() {
                        commands.entity(entity).insert((
                            Mesh3d(assets.meshes.add(bevy_mesh(geometry))),
                            MeshMaterial3d(handle.clone()),
                        ));
                    } else {
                        tracing::warn!(node = %node.name, "Mesh without material, not rendered");
                    }
                }
            }
            commands.entity(entity).insert(NodeMaterials(handles));
        }
    }
}

fn sync_changed_nodes(
    mut diagram: ResMut<DiagramState>,
    entities: Res<NodeEntities>,
    mut nodes: Query<(&mut Transform, Option<&NodeMaterials>), With<DiagramNode>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    textures: Res<TextureLoads>,
    asset_server: Res<AssetServer>,
) {
    let diagram = &mut diagram.0;
    for id in diagram.scene.drain_dirty() {
        let Some(&entity) = entities.0.get(&id) else { continue };
        let Some(node) = diagram.scene.node(id) else { continue };
        // Spawned this frame; the spawn already used the current state
        let Ok((mut transform, node_materials)) = nodes.get_mut(entity) else { continue };

        *transform = to_bevy_transform(&node.transform);

        let (Some(node_materials), Some(mesh)) = (node_materials, node.as_mesh()) else { continue };
        for (handle, material) in node_materials.0.iter().zip(&mesh.materials) {
            if let Some(standard) = materials.get_mut(handle) {
                standard.base_color = base_color(material);
                standard.base_color_texture = material
                    .texture
                    .as_deref()
                    .map(|path| textures.handle(path, &asset_server));
            }
        }
    }
}

fn to_bevy_transform(transform: &NodeTransform) -> Transform {
    Transform {
        translation: Vec3::from_array(transform.translation.to_array()),
        rotation: Quat::from_array(transform.rotation.to_array()),
        scale: Vec3::from_array(transform.scale.to_array()),
    }
}

fn base_color(material: &DiagramMaterial) -> Color {
    let [r, g, b] = material.color.to_array();
    Color::srgba(r, g, b, material.opacity)
}

fn standard_material(
    material: &DiagramMaterial,
    textures: &TextureLoads,
    asset_server: &AssetServer,
) -> StandardMaterial {
    StandardMaterial {
        base_color: base_color(material),
        base_color_texture: material
            .texture
            .as_deref()
            .map(|path| textures.handle(path, asset_server)),
        unlit: true,
        alpha_mode: if material.transparent {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        ..default()
    }
}

fn bevy_mesh(geometry: Geometry) -> Mesh {
    match geometry {
        Geometry::Box { width, height, depth } => Mesh::from(Cuboid::new(width, height, depth)),
        Geometry::Cylinder { radius_top, radius_bottom, height }
            if (radius_top - radius_bottom).abs() <= f32::EPSILON =>
        {
            Mesh::from(Cylinder::new(radius_top, height))
        }
        Geometry::Cylinder { radius_top, radius_bottom, height } => Mesh::from(ConicalFrustum {
            radius_top,
            radius_bottom,
            height,
        }),
        Geometry::Cone { radius, height } => Mesh::from(Cone { radius, height }),
    }
}

/// Quad size and placement of box face `face` (+X, -X, +Y, -Y, +Z, -Z)
fn box_face(face: usize, width: f32, height: f32, depth: f32) -> (Vec2, Transform) {
    let (size, offset, rotation) = match face {
        0 => (Vec2::new(depth, height), Vec3::X * width / 2.0, Quat::from_rotation_y(FRAC_PI_2)),
        1 => (Vec2::new(depth, height), Vec3::NEG_X * width / 2.0, Quat::from_rotation_y(-FRAC_PI_2)),
        2 => (Vec2::new(width, depth), Vec3::Y * height / 2.0, Quat::from_rotation_x(-FRAC_PI_2)),
        3 => (Vec2::new(width, depth), Vec3::NEG_Y * height / 2.0, Quat::from_rotation_x(FRAC_PI_2)),
        4 => (Vec2::new(width, height), Vec3::Z * depth / 2.0, Quat::IDENTITY),
        _ => (Vec2::new(width, height), Vec3::NEG_Z * depth / 2.0, Quat::from_rotation_y(PI)),
    };
    (size, Transform::from_translation(offset).with_rotation(rotation))
}
