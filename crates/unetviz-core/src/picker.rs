//! Pointer picking
//!
//! Pointer position -> normalized device coordinates -> camera ray -> nearest
//! mesh under any registered object -> caption.

use glam::{Vec2, Vec3};

use crate::camera::PerspectiveCamera;
use crate::diagram::Diagram;
use crate::ray::Ray;
use crate::registry::UNKNOWN_OBJECT;
use crate::scene::NodeId;
use crate::viewport::CanvasRect;

/// Shown when the pointer is over empty space
pub const DEFAULT_PROMPT: &str = "Hover over an element to see its details.";

/// Map a pointer position to `[-1, 1]` on both axes, y pointing up
pub fn pointer_to_ndc(pointer: Vec2, rect: &CanvasRect) -> Vec2 {
    Vec2::new(
        (pointer.x - rect.x) / rect.width * 2.0 - 1.0,
        -((pointer.y - rect.y) / rect.height) * 2.0 + 1.0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Mesh that was hit
    pub node: NodeId,
    /// Registered object the mesh belongs to
    pub root: NodeId,
    pub distance: f32,
    pub point: Vec3,
    /// Box face index when the mesh is a box
    pub face: Option<usize>,
}

/// Nearest intersection over every mesh below every registered object
pub fn pick(diagram: &Diagram, ray: &Ray) -> Option<Hit> {
    let mut nearest: Option<Hit> = None;

    for &root in diagram.registry.pickable() {
        for node in diagram.scene.meshes_under(root) {
            let Some(mesh) = diagram.scene.node(node).and_then(|n| n.as_mesh()) else {
                continue;
            };
            let world = diagram.scene.world_matrix(node);
            if world.determinant().abs() <= f32::EPSILON {
                continue;
            }
            let Some(local) = mesh.geometry.intersect_local(&ray.to_local(&world)) else {
                continue;
            };
            if local.distance < 0.0 || nearest.is_some_and(|hit| hit.distance <= local.distance) {
                continue;
            }
            nearest = Some(Hit {
                node,
                root,
                distance: local.distance,
                point: ray.at(local.distance),
                face: local.face,
            });
        }
    }
    nearest
}

/// Caption of the hit part, its group, or the registered object it sits under
pub fn caption_for_hit<'a>(diagram: &'a Diagram, hit: &Hit) -> &'a str {
    let registry = &diagram.registry;
    registry
        .find_caption(&diagram.scene, hit.node)
        .or_else(|| registry.find_caption(&diagram.scene, hit.root))
        .unwrap_or(UNKNOWN_OBJECT)
}

/// Text for the info panel with the pointer at `pointer`
pub fn hover_caption<'a>(
    diagram: &'a Diagram,
    camera: &PerspectiveCamera,
    pointer: Vec2,
    rect: &CanvasRect,
) -> &'a str {
    let ray = camera.ray_from_ndc(pointer_to_ndc(pointer, rect));
    match pick(diagram, &ray) {
        Some(hit) => caption_for_hit(diagram, &hit),
        None => DEFAULT_PROMPT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ImageCube;
    use crate::geometry::Geometry;
    use crate::material::Material;

    fn rect() -> CanvasRect {
        CanvasRect {
            x: 0.0,
            y: 0.0,
            width: 800.0,
            height: 600.0,
        }
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera {
            aspect: rect().aspect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_pointer_to_ndc_corners() {
        let rect = CanvasRect {
            x: 100.0,
            y: 50.0,
            width: 200.0,
            height: 100.0,
        };
        assert_eq!(pointer_to_ndc(Vec2::new(100.0, 50.0), &rect), Vec2::new(-1.0, 1.0));
        assert_eq!(pointer_to_ndc(Vec2::new(300.0, 150.0), &rect), Vec2::new(1.0, -1.0));
        assert_eq!(pointer_to_ndc(Vec2::new(200.0, 100.0), &rect), Vec2::ZERO);
    }

    #[test]
    fn test_empty_region_shows_prompt() {
        let mut diagram = Diagram::new();
        diagram.add_object(
            "block",
            Geometry::cuboid(2.0, 2.0, 2.0),
            Material::basic(0x6495ed),
            Vec3::ZERO,
            "a block",
            None,
        );
        let caption = hover_caption(&diagram, &camera(), Vec2::new(10.0, 10.0), &rect());
        assert_eq!(caption, DEFAULT_PROMPT);
    }

    #[test]
    fn test_image_face_reports_cube_caption() {
        let mut diagram = Diagram::new();
        let _ = diagram
            .add_cube_with_image_face(
                ImageCube::new("preVisu", "img/step0.jpeg")
                    .caption("latent preview")
                    .size(10.0, 10.0, 1.0),
            )
            .expect("face in range");
        diagram.texture_loaded("img/step0.jpeg");

        let ray = camera().ray_from_ndc(Vec2::ZERO);
        let hit = pick(&diagram, &ray).expect("cube in front of camera");
        assert_eq!(hit.face, Some(4));
        assert!((hit.distance - 59.5).abs() < 1e-3);
        assert_eq!(caption_for_hit(&diagram, &hit), "latent preview");
        assert_eq!(
            hover_caption(&diagram, &camera(), Vec2::new(400.0, 300.0), &rect()),
            "latent preview"
        );
    }

    #[test]
    fn test_arrow_part_reports_arrow_caption() {
        let mut diagram = Diagram::new();
        let arrow = diagram
            .add_arrow(
                "arrow0",
                Vec3::new(-20.0, 0.0, 0.0),
                Vec3::new(-10.0, 0.0, 0.0),
                0xffff00,
                "downsample",
                0.5,
            )
            .expect("point endpoints");

        let ray = Ray::new(Vec3::new(-17.0, 0.0, 60.0), Vec3::NEG_Z);
        let hit = pick(&diagram, &ray).expect("shaft under ray");
        assert_eq!(hit.root, arrow);
        assert_ne!(hit.node, arrow);
        assert!((hit.distance - 59.5).abs() < 1e-3);
        assert_eq!(hit.face, None);
        assert_eq!(caption_for_hit(&diagram, &hit), "downsample");
    }

    #[test]
    fn test_nearest_hit_wins() {
        let mut diagram = Diagram::new();
        let material = Material::basic(0x00ffff);
        diagram.add_object("far", Geometry::cuboid(2.0, 2.0, 2.0), material.clone(), Vec3::ZERO, "far", None);
        let near = diagram.add_object(
            "near",
            Geometry::cuboid(2.0, 2.0, 2.0),
            material,
            Vec3::new(0.0, 0.0, 10.0),
            "near",
            None,
        );

        let hit = pick(&diagram, &camera().ray_from_ndc(Vec2::ZERO)).expect("both on axis");
        assert_eq!(hit.node, near);
        assert!((hit.point.z - 11.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotated_cone_is_hit() {
        let mut diagram = Diagram::new();
        diagram.add_object(
            "Encodeur1",
            Geometry::cone(1.5, 2.5),
            Material::translucent(0x0000ff, 0.7),
            Vec3::new(-50.0, 0.0, 0.0),
            "image encoder",
            Some(Vec3::new(0.0, 0.0, 4.71)),
        );
        let ray = Ray::new(Vec3::new(-50.0, 0.0, 60.0), Vec3::NEG_Z);
        let hit = pick(&diagram, &ray).expect("cone axis crosses the ray");
        assert_eq!(caption_for_hit(&diagram, &hit), "image encoder");
    }

    #[test]
    fn test_pending_cube_is_not_pickable() {
        let mut diagram = Diagram::new();
        let _pending = diagram
            .add_cube_with_image_face(ImageCube::new("embed", "img/emb.jpeg").size(30.0, 2.0, 1.0))
            .expect("face in range");
        assert!(pick(&diagram, &camera().ray_from_ndc(Vec2::ZERO)).is_none());
    }
}
