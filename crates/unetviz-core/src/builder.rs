//! Diagram primitives: plain objects, arrows and image cubes
//!
//! Every call creates new nodes. Re-using an id only replaces what the
//! registry returns for it.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use glam::{Quat, Vec3};
use tracing::debug;

use crate::color::Rgb;
use crate::diagram::{Diagram, DiagramError};
use crate::geometry::{Geometry, BOX_FACES};
use crate::material::Material;
use crate::scene::{NodeId, Transform};
use crate::texture::TextureState;

/// Share of an arrow's length taken by the shaft; the head gets the rest
pub const SHAFT_FRACTION: f32 = 0.6;
pub const ARROW_OPACITY: f32 = 0.7;

/// One end of an arrow
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    Point(Vec3),
    /// Current position of a node
    Node(NodeId),
    /// Current position of a registered object
    Id(String),
}

impl From<Vec3> for Endpoint {
    fn from(point: Vec3) -> Self {
        Endpoint::Point(point)
    }
}

impl From<NodeId> for Endpoint {
    fn from(node: NodeId) -> Self {
        Endpoint::Node(node)
    }
}

impl From<&str> for Endpoint {
    fn from(id: &str) -> Self {
        Endpoint::Id(id.to_string())
    }
}

/// Placement of an arrow between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowLayout {
    pub origin: Vec3,
    /// Turns local +Y onto the arrow direction
    pub rotation: Quat,
    pub shaft_length: f32,
    pub head_length: f32,
}

impl ArrowLayout {
    /// Coincident points give a zero-length arrow with no rotation
    pub fn between(from: Vec3, to: Vec3) -> Self {
        let direction = to - from;
        let length = direction.length();
        let rotation = direction
            .try_normalize()
            .map(|dir| Quat::from_rotation_arc(Vec3::Y, dir))
            .unwrap_or(Quat::IDENTITY);

        let shaft_length = length * SHAFT_FRACTION;
        Self {
            origin: from,
            rotation,
            shaft_length,
            head_length: length - shaft_length,
        }
    }

    pub fn length(&self) -> f32 {
        self.shaft_length + self.head_length
    }
}

/// Box with a texture on one face and a flat color on the other five
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCube {
    pub id: String,
    pub image_path: String,
    pub position: Vec3,
    pub caption: String,
    /// 0..6, in +X, -X, +Y, -Y, +Z, -Z order
    pub face_index: usize,
    pub base_color: Rgb,
    pub size: Vec3,
}

impl ImageCube {
    pub fn new(id: impl Into<String>, image_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image_path: image_path.into(),
            position: Vec3::ZERO,
            caption: String::new(),
            face_index: 4,
            base_color: Rgb::from_hex(0x888888),
            size: Vec3::ONE,
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    pub fn face(mut self, face_index: usize) -> Self {
        self.face_index = face_index;
        self
    }

    pub fn base_color(mut self, color: impl Into<Rgb>) -> Self {
        self.base_color = color.into();
        self
    }

    pub fn size(mut self, width: f32, height: f32, depth: f32) -> Self {
        self.size = Vec3::new(width, height, depth);
        self
    }
}

/// A registered image cube
#[derive(Debug, Clone, PartialEq)]
pub struct CubeEntry {
    pub id: String,
    pub node: NodeId,
}

/// Resolves once the cube's texture has loaded and the cube is registered
#[derive(Debug)]
pub struct PendingCube {
    texture: String,
    rx: oneshot::Receiver<CubeEntry>,
}

impl PendingCube {
    /// Non-blocking check. `None` while the texture is still loading.
    pub fn try_take(&mut self) -> Option<Result<CubeEntry, DiagramError>> {
        match self.rx.try_recv() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(DiagramError::TextureUnavailable(self.texture.clone()))),
        }
    }
}

impl Future for PendingCube {
    type Output = Result<CubeEntry, DiagramError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| DiagramError::TextureUnavailable(this.texture.clone())))
    }
}

/// Cube waiting in the diagram for its texture
#[derive(Debug)]
pub(crate) struct PendingCubeBuild {
    cube: ImageCube,
    sender: oneshot::Sender<CubeEntry>,
}

impl PendingCubeBuild {
    pub(crate) fn texture(&self) -> &str {
        &self.cube.image_path
    }

    pub(crate) fn finish(self, diagram: &mut Diagram) {
        let cube = self.cube;
        let materials = (0..BOX_FACES)
            .map(|face| {
                if face == cube.face_index {
                    Material::image_face(cube.image_path.clone())
                } else {
                    Material::basic(cube.base_color)
                }
            })
            .collect();

        let node = diagram.scene.create_mesh(
            cube.id.clone(),
            Geometry::cuboid(cube.size.x, cube.size.y, cube.size.z),
            materials,
            Transform::from_translation(cube.position),
        );
        diagram.scene.add_root(node);
        diagram.registry.register(cube.id.clone(), node, cube.caption);
        debug!(id = %cube.id, "Image cube registered");

        // Nobody may be waiting on the handle
        let _ = self.sender.send(CubeEntry { id: cube.id, node });
    }
}

impl Diagram {
    /// Single mesh at `position`, rotated by Euler XYZ `rotation` (radians)
    pub fn add_object(
        &mut self,
        id: &str,
        geometry: Geometry,
        material: Material,
        position: Vec3,
        caption: &str,
        rotation: Option<Vec3>,
    ) -> NodeId {
        let transform = Transform::from_translation(position).with_euler(rotation.unwrap_or(Vec3::ZERO));
        let node = self.scene.create_mesh(id, geometry, vec![material], transform);
        self.scene.add_root(node);
        self.registry.register(id, node, caption);
        node
    }

    /// Arrow from `from` to `to`: a cylinder shaft and a cone head twice as wide.
    ///
    /// The group and both parts share `caption`, so hovering either part reads
    /// the arrow's text.
    pub fn add_arrow(
        &mut self,
        id: &str,
        from: impl Into<Endpoint>,
        to: impl Into<Endpoint>,
        color: impl Into<Rgb>,
        caption: &str,
        shaft_radius: f32,
    ) -> Result<NodeId, DiagramError> {
        let from = self.endpoint_position(&from.into())?;
        let to = self.endpoint_position(&to.into())?;
        let layout = ArrowLayout::between(from, to);
        let color = color.into();

        let group = self.scene.create_group(
            id,
            Transform::from_translation(layout.origin).with_rotation(layout.rotation),
        );
        let shaft = self.scene.create_mesh(
            format!("{}_shaft", id),
            Geometry::cylinder(shaft_radius, layout.shaft_length),
            vec![Material::translucent(color, ARROW_OPACITY)],
            Transform::from_translation(Vec3::new(0.0, layout.shaft_length / 2.0, 0.0)),
        );
        let head = self.scene.create_mesh(
            format!("{}_head", id),
            Geometry::cone(shaft_radius * 2.0, layout.head_length),
            vec![Material::translucent(color, ARROW_OPACITY)],
            Transform::from_translation(Vec3::new(
                0.0,
                layout.shaft_length + layout.head_length / 2.0,
                0.0,
            )),
        );
        self.scene.attach(group, shaft);
        self.scene.attach(group, head);
        self.scene.add_root(group);

        self.registry.register(id, group, caption);
        self.registry.register_part(shaft, caption);
        self.registry.register_part(head, caption);
        Ok(group)
    }

    /// Queue an image cube. It is built and registered only after its texture
    /// has loaded; await the returned handle to get the registered node.
    pub fn add_cube_with_image_face(&mut self, cube: ImageCube) -> Result<PendingCube, DiagramError> {
        if cube.face_index >= BOX_FACES {
            return Err(DiagramError::FaceOutOfRange {
                id: cube.id,
                face: cube.face_index,
            });
        }

        let (sender, rx) = oneshot::channel();
        let pending = PendingCube {
            texture: cube.image_path.clone(),
            rx,
        };
        let build = PendingCubeBuild { cube, sender };

        match self.textures.request(build.texture()) {
            TextureState::Ready => build.finish(self),
            TextureState::Loading => self.pending_cubes.push(build),
            // Dropping the sender resolves the handle with an error
            TextureState::Failed => drop(build),
        }
        Ok(pending)
    }

    fn endpoint_position(&self, endpoint: &Endpoint) -> Result<Vec3, DiagramError> {
        match endpoint {
            Endpoint::Point(point) => Ok(*point),
            Endpoint::Node(node) => self
                .scene
                .translation(*node)
                .ok_or_else(|| DiagramError::UnknownObject(format!("{:?}", node))),
            Endpoint::Id(id) => self
                .resolve(id)
                .and_then(|node| self.scene.translation(node))
                .ok_or_else(|| DiagramError::UnknownObject(id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialSlot;
    use crate::scene::NodeKind;
    use futures::executor::block_on;

    #[test]
    fn test_vertical_arrow_split_and_identity_rotation() {
        let layout = ArrowLayout::between(Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0));
        assert!((layout.shaft_length - 6.0).abs() < 1e-5);
        assert!((layout.head_length - 4.0).abs() < 1e-5);
        assert!(layout.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn test_arrow_parts_sum_to_length() {
        for length in [1.0, 3.0, 7.5, 10.0, 33.3] {
            let layout = ArrowLayout::between(Vec3::ZERO, Vec3::new(0.0, length, 0.0));
            assert_eq!(layout.shaft_length + layout.head_length, length);
        }
        let layout = ArrowLayout::between(Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(layout.head_length, 4.0);
    }

    #[test]
    fn test_arrow_rotation_points_along_direction() {
        let layout = ArrowLayout::between(Vec3::new(1.0, 1.0, 0.0), Vec3::new(4.0, 1.0, 4.0));
        assert!((layout.length() - 5.0).abs() < 1e-5);
        let tip = layout.origin + layout.rotation * Vec3::Y * layout.length();
        assert!((tip - Vec3::new(4.0, 1.0, 4.0)).length() < 1e-4);

        let down = ArrowLayout::between(Vec3::ZERO, Vec3::new(0.0, -3.0, 0.0));
        assert!((down.rotation * Vec3::Y - Vec3::NEG_Y).length() < 1e-5);
    }

    #[test]
    fn test_zero_length_arrow_is_degenerate_not_nan() {
        let layout = ArrowLayout::between(Vec3::ONE, Vec3::ONE);
        assert_eq!(layout.length(), 0.0);
        assert_eq!(layout.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_add_arrow_builds_group() {
        let mut diagram = Diagram::new();
        let arrow = diagram
            .add_arrow("arrow", Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0), 0xffff00, "flow", 0.3)
            .expect("point endpoints always resolve");

        let node = diagram.scene.node(arrow).expect("group exists");
        let children = node.children().to_vec();
        assert_eq!(children.len(), 2);
        assert_eq!(node.transform.translation, Vec3::ZERO);

        let shaft = diagram.scene.node(children[0]).expect("shaft");
        assert_eq!(shaft.as_mesh().map(|m| m.geometry), Some(Geometry::cylinder(0.3, 6.0)));
        assert!((shaft.transform.translation.y - 3.0).abs() < 1e-5);

        let head = diagram.scene.node(children[1]).expect("head");
        assert_eq!(head.as_mesh().map(|m| m.geometry), Some(Geometry::cone(0.6, 4.0)));
        assert!((head.transform.translation.y - 8.0).abs() < 1e-5);

        for part in children {
            assert_eq!(diagram.caption_of(part), "flow");
        }
        assert_eq!(diagram.resolve("arrow"), Some(arrow));
        assert_eq!(diagram.scene.roots(), &[arrow]);
    }

    #[test]
    fn test_arrow_between_registered_objects() {
        let mut diagram = Diagram::new();
        let material = Material::basic(0x6495ed);
        diagram.add_object("a", Geometry::cuboid(1.0, 1.0, 1.0), material.clone(), Vec3::new(-2.0, 0.0, 0.0), "A", None);
        diagram.add_object("b", Geometry::cuboid(1.0, 1.0, 1.0), material, Vec3::new(2.0, 0.0, 0.0), "B", None);

        let arrow = diagram.add_arrow("a_to_b", "a", "b", 0x00ff00, "conv", 0.4).expect("both ids exist");
        assert_eq!(diagram.scene.translation(arrow), Some(Vec3::new(-2.0, 0.0, 0.0)));

        let missing = diagram.add_arrow("broken", "a", "nowhere", 0x00ff00, "conv", 0.4);
        assert_eq!(missing, Err(DiagramError::UnknownObject("nowhere".to_string())));
        assert_eq!(diagram.resolve("broken"), None);
    }

    #[test]
    fn test_add_object_rotation() {
        let mut diagram = Diagram::new();
        let node = diagram.add_object(
            "cone",
            Geometry::cone(1.5, 2.5),
            Material::translucent(0x0000ff, 0.7),
            Vec3::new(-50.0, 0.0, 0.0),
            "encoder",
            Some(Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2)),
        );
        let rotation = diagram.scene.node(node).map(|n| n.transform.rotation).expect("node");
        // The cone's +Y tip now points along -X
        assert!((rotation * Vec3::Y - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_cube_registered_only_after_texture_load() {
        let mut diagram = Diagram::new();
        let mut pending = diagram
            .add_cube_with_image_face(
                ImageCube::new("Sorti_img", "img/step9.jpeg")
                    .position(Vec3::new(45.0, 0.0, 0.0))
                    .caption("output image")
                    .face(0)
                    .size(1.0, 10.0, 10.0),
            )
            .expect("face in range");

        assert_eq!(diagram.resolve("Sorti_img"), None);
        assert!(pending.try_take().is_none());
        assert_eq!(diagram.drain_texture_requests(), vec!["img/step9.jpeg".to_string()]);

        diagram.texture_loaded("img/step9.jpeg");
        let entry = block_on(pending).expect("texture loaded");
        assert_eq!(diagram.resolve("Sorti_img"), Some(entry.node));
        assert_eq!(diagram.caption_of(entry.node), "output image");

        let mesh = match &diagram.scene.node(entry.node).expect("cube").kind {
            NodeKind::Mesh(mesh) => mesh.clone(),
            NodeKind::Group { .. } => panic!("cube should be a mesh"),
        };
        assert_eq!(mesh.materials.len(), 6);
        assert!(mesh.materials[0].is_image_face);
        assert_eq!(mesh.materials[0].texture.as_deref(), Some("img/step9.jpeg"));
        assert!(mesh.materials[1..].iter().all(|m| !m.is_image_face && m.texture.is_none()));
    }

    #[test]
    fn test_cube_with_loaded_texture_builds_immediately() {
        let mut diagram = Diagram::new();
        let first = diagram
            .add_cube_with_image_face(ImageCube::new("a", "img/step0.jpeg"))
            .expect("face in range");
        diagram.texture_loaded("img/step0.jpeg");
        assert!(block_on(first).is_ok());

        let mut second = diagram
            .add_cube_with_image_face(ImageCube::new("b", "img/step0.jpeg"))
            .expect("face in range");
        assert!(diagram.resolve("b").is_some());
        assert!(matches!(second.try_take(), Some(Ok(_))));
    }

    #[test]
    fn test_failed_texture_never_registers() {
        let mut diagram = Diagram::new();
        let pending = diagram
            .add_cube_with_image_face(ImageCube::new("embed", "img/missing.jpeg"))
            .expect("face in range");
        diagram.texture_failed("img/missing.jpeg");

        assert_eq!(
            block_on(pending),
            Err(DiagramError::TextureUnavailable("img/missing.jpeg".to_string()))
        );
        assert_eq!(diagram.resolve("embed"), None);
        assert_eq!(diagram.pending_cube_count(), 0);
    }

    #[test]
    fn test_face_out_of_range() {
        let mut diagram = Diagram::new();
        let result = diagram.add_cube_with_image_face(ImageCube::new("bad", "img/x.jpeg").face(6));
        assert!(matches!(result, Err(DiagramError::FaceOutOfRange { face: 6, .. })));
    }

    #[test]
    fn test_change_cube_image_only_touches_image_face() {
        let mut diagram = Diagram::new();
        let pending = diagram
            .add_cube_with_image_face(ImageCube::new("preVisu", "img/step0.jpeg").face(4))
            .expect("face in range");
        diagram.texture_loaded("img/step0.jpeg");
        let node = block_on(pending).expect("loaded").node;
        diagram.scene.drain_dirty();

        // Not the image face: nothing changes
        diagram.change_cube_image("preVisu", "img/step0.jpeg", 2);
        assert!(diagram.scene.drain_dirty().is_empty());

        diagram.change_cube_image("preVisu", "img/step1.jpeg", 4);
        let slot = MaterialSlot { node, index: 4 };
        assert_eq!(
            diagram.scene.material(slot).and_then(|m| m.texture.as_deref()),
            Some("img/step0.jpeg")
        );
        diagram.texture_loaded("img/step1.jpeg");
        assert_eq!(
            diagram.scene.material(slot).and_then(|m| m.texture.as_deref()),
            Some("img/step1.jpeg")
        );

        // Unknown ids are skipped without queuing anything
        diagram.change_cube_image("nope", "img/step2.jpeg", 4);
        assert_eq!(diagram.texture_state("img/step2.jpeg"), None);
    }
}
