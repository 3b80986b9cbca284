//! Rays, bounding boxes and primitive intersection tests
//!
//! All tests run in the primitive's local space. Callers transform the ray by
//! the inverse world matrix first; since that map is affine, the returned ray
//! parameter is also the world-space parameter.

use glam::{Mat4, Vec3};

/// Half-line `origin + t * direction`, `t >= 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Express this ray in the space whose world matrix is `world`
    pub fn to_local(&self, world: &Mat4) -> Ray {
        let inv = world.inverse();
        Ray {
            origin: inv.transform_point3(self.origin),
            direction: inv.transform_vector3(self.direction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box centered on the origin
    pub fn from_half_extents(half: Vec3) -> Self {
        Self { min: -half, max: half }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// Slab test. Returns the entry parameter, or the exit parameter when the
/// origin is inside the box.
pub fn intersect_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv = Vec3::new(
        if ray.direction.x != 0.0 { 1.0 / ray.direction.x } else { f32::INFINITY },
        if ray.direction.y != 0.0 { 1.0 / ray.direction.y } else { f32::INFINITY },
        if ray.direction.z != 0.0 { 1.0 / ray.direction.z } else { f32::INFINITY },
    );

    let t0 = (aabb.min - ray.origin) * inv;
    let t1 = (aabb.max - ray.origin) * inv;

    // 0 * inf is NaN when the origin sits exactly on a slab plane; treat it as inside
    let near = t0.min(t1);
    let far = t0.max(t1);
    let t_near = max_ignore_nan(near.x, max_ignore_nan(near.y, near.z));
    let t_far = min_ignore_nan(far.x, min_ignore_nan(far.y, far.z));

    if t_near > t_far || t_far < 0.0 {
        return None;
    }
    Some(if t_near >= 0.0 { t_near } else { t_far })
}

/// Intersect a cylinder/cone frustum aligned with local +Y and centered on the
/// origin. `radius_bottom` is at `y = -height / 2`, `radius_top` at `+height / 2`.
pub fn intersect_frustum(ray: &Ray, radius_top: f32, radius_bottom: f32, height: f32) -> Option<f32> {
    if height <= 0.0 {
        return None;
    }
    let half = height * 0.5;
    // radius(y) = a + k * y
    let k = (radius_top - radius_bottom) / height;
    let a = (radius_top + radius_bottom) * 0.5;

    let o = ray.origin;
    let d = ray.direction;
    let mut best: Option<f32> = None;
    let mut consider = |t: f32| {
        if t >= 0.0 && best.map_or(true, |b| t < b) {
            best = Some(t);
        }
    };

    // Side surface: x^2 + z^2 = (a + k y)^2
    let ro = a + k * o.y;
    let qa = d.x * d.x + d.z * d.z - k * k * d.y * d.y;
    let qb = 2.0 * (o.x * d.x + o.z * d.z - k * d.y * ro);
    let qc = o.x * o.x + o.z * o.z - ro * ro;

    let on_side = |t: f32| {
        let y = o.y + d.y * t;
        y >= -half && y <= half && a + k * y >= 0.0
    };

    if qa.abs() > f32::EPSILON {
        let disc = qb * qb - 4.0 * qa * qc;
        if disc >= 0.0 {
            let sqrt = disc.sqrt();
            for t in [(-qb - sqrt) / (2.0 * qa), (-qb + sqrt) / (2.0 * qa)] {
                if on_side(t) {
                    consider(t);
                }
            }
        }
    } else if qb.abs() > f32::EPSILON {
        let t = -qc / qb;
        if on_side(t) {
            consider(t);
        }
    }

    // End caps
    if d.y != 0.0 {
        for (y, r) in [(-half, radius_bottom), (half, radius_top)] {
            if r <= 0.0 {
                continue;
            }
            let t = (y - o.y) / d.y;
            let p = o + d * t;
            if p.x * p.x + p.z * p.z <= r * r {
                consider(t);
            }
        }
    }

    best
}

fn max_ignore_nan(a: f32, b: f32) -> f32 {
    if a.is_nan() {
        b
    } else if b.is_nan() {
        a
    } else {
        a.max(b)
    }
}

fn min_ignore_nan(a: f32, b: f32) -> f32 {
    if a.is_nan() {
        b
    } else if b.is_nan() {
        a
    } else {
        a.min(b)
    }
}
