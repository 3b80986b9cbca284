//! Primitive shapes used by the diagram

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ray::{intersect_aabb, intersect_frustum, Aabb, Ray};

/// Number of faces on a box; face order is +X, -X, +Y, -Y, +Z, -Z
pub const BOX_FACES: usize = 6;

/// Shape of a mesh, centered on its local origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Box { width: f32, height: f32, depth: f32 },
    /// Along local +Y
    Cylinder { radius_top: f32, radius_bottom: f32, height: f32 },
    /// Base at `-height / 2`, tip at `+height / 2`
    Cone { radius: f32, height: f32 },
}

/// Result of a local-space intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalHit {
    pub distance: f32,
    /// Box face index, `None` for round shapes
    pub face: Option<usize>,
}

impl Geometry {
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Geometry::Box { width, height, depth }
    }

    pub fn cylinder(radius: f32, height: f32) -> Self {
        Geometry::Cylinder {
            radius_top: radius,
            radius_bottom: radius,
            height,
        }
    }

    pub fn cone(radius: f32, height: f32) -> Self {
        Geometry::Cone { radius, height }
    }

    pub fn bounds(&self) -> Aabb {
        match *self {
            Geometry::Box { width, height, depth } => {
                Aabb::from_half_extents(Vec3::new(width, height, depth) * 0.5)
            }
            Geometry::Cylinder { radius_top, radius_bottom, height } => {
                let r = radius_top.max(radius_bottom);
                Aabb::from_half_extents(Vec3::new(r, height * 0.5, r))
            }
            Geometry::Cone { radius, height } => {
                Aabb::from_half_extents(Vec3::new(radius, height * 0.5, radius))
            }
        }
    }

    /// Intersect a ray already expressed in this shape's local space
    pub fn intersect_local(&self, ray: &Ray) -> Option<LocalHit> {
        match *self {
            Geometry::Box { .. } => {
                let aabb = self.bounds();
                let distance = intersect_aabb(ray, &aabb)?;
                let face = box_face(ray.at(distance), aabb.half_extents());
                Some(LocalHit {
                    distance,
                    face: Some(face),
                })
            }
            Geometry::Cylinder { radius_top, radius_bottom, height } => {
                intersect_frustum(ray, radius_top, radius_bottom, height)
                    .map(|distance| LocalHit { distance, face: None })
            }
            Geometry::Cone { radius, height } => intersect_frustum(ray, 0.0, radius, height)
                .map(|distance| LocalHit { distance, face: None }),
        }
    }
}

/// Face of a box containing `point`, picked by the largest normalized coordinate
fn box_face(point: Vec3, half: Vec3) -> usize {
    let n = Vec3::new(
        safe_ratio(point.x, half.x),
        safe_ratio(point.y, half.y),
        safe_ratio(point.z, half.z),
    );
    let abs = n.abs();
    if abs.x >= abs.y && abs.x >= abs.z {
        if n.x >= 0.0 { 0 } else { 1 }
    } else if abs.y >= abs.z {
        if n.y >= 0.0 { 2 } else { 3 }
    } else if n.z >= 0.0 {
        4
    } else {
        5
    }
}

fn safe_ratio(v: f32, half: f32) -> f32 {
    if half > 0.0 { v / half } else { 0.0 }
}
