//! Flat, unlit surface materials

use crate::color::Rgb;
use crate::scene::NodeId;

/// Surface description of one mesh face group
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub opacity: f32,
    pub transparent: bool,
    /// Asset path of the texture shown on this surface
    pub texture: Option<String>,
    /// Set on the one face of an image cube whose texture may be swapped
    pub is_image_face: bool,
}

impl Material {
    /// Opaque flat color
    pub fn basic(color: impl Into<Rgb>) -> Self {
        Self {
            color: color.into(),
            opacity: 1.0,
            transparent: false,
            texture: None,
            is_image_face: false,
        }
    }

    /// Flat color blended at `opacity`
    pub fn translucent(color: impl Into<Rgb>, opacity: f32) -> Self {
        Self {
            opacity,
            transparent: true,
            ..Self::basic(color)
        }
    }

    /// White surface showing `texture`
    pub fn textured(texture: impl Into<String>) -> Self {
        Self {
            texture: Some(texture.into()),
            ..Self::basic(Rgb::WHITE)
        }
    }

    pub fn image_face(texture: impl Into<String>) -> Self {
        Self {
            is_image_face: true,
            ..Self::textured(texture)
        }
    }
}

/// Address of one material: the owning mesh node and the index in its list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialSlot {
    pub node: NodeId,
    pub index: usize,
}
