//! Scene graph arena
//!
//! Nodes live for the whole session and are addressed by [`NodeId`]. A node is
//! either a mesh or a group; material collection walks both kinds uniformly so
//! callers never have to inspect what a handle points at.
//!
//! The scene records which root nodes were added and which nodes changed since
//! the host last looked, so a renderer can mirror it incrementally.

use std::collections::BTreeSet;

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::geometry::Geometry;
use crate::material::{Material, MaterialSlot};

/// Handle to a node in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Local transform relative to the parent node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Euler angles in radians, applied X then Y then Z
    pub fn with_euler(mut self, euler: Vec3) -> Self {
        self.rotation = Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    /// One material for the whole surface, or one per box face
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Mesh(Mesh),
    Group { children: Vec<NodeId> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group { .. } => None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Group { children } => children,
            NodeKind::Mesh(_) => &[],
        }
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    added: Vec<NodeId>,
    dirty: BTreeSet<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a detached mesh node
    pub fn create_mesh(
        &mut self,
        name: impl Into<String>,
        geometry: Geometry,
        materials: Vec<Material>,
        transform: Transform,
    ) -> NodeId {
        self.push(Node {
            name: name.into(),
            transform,
            parent: None,
            kind: NodeKind::Mesh(Mesh { geometry, materials }),
        })
    }

    /// Create a detached, empty group node
    pub fn create_group(&mut self, name: impl Into<String>, transform: Transform) -> NodeId {
        self.push(Node {
            name: name.into(),
            transform,
            parent: None,
            kind: NodeKind::Group { children: Vec::new() },
        })
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Parent `child` under `group`. Ignored when `group` is not a group.
    pub fn attach(&mut self, group: NodeId, child: NodeId) {
        let Some(Node {
            kind: NodeKind::Group { children },
            ..
        }) = self.nodes.get_mut(group.index())
        else {
            tracing::warn!(?group, "attach target is not a group");
            return;
        };
        children.push(child);
        if let Some(node) = self.nodes.get_mut(child.index()) {
            node.parent = Some(group);
        }
    }

    /// Make a detached node part of the rendered scene
    pub fn add_root(&mut self, id: NodeId) {
        if id.index() < self.nodes.len() {
            self.roots.push(id);
            self.added.push(id);
        }
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn translation(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(|n| n.transform.translation)
    }

    pub fn set_translation(&mut self, id: NodeId, translation: Vec3) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.transform.translation = translation;
            self.dirty.insert(id);
        }
    }

    /// Matrix from this node's local space to world space
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.node(node_id) else { break };
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// Every material reachable from `id`: the node's own when it is a mesh,
    /// every descendant mesh's when it is a group
    pub fn collect_materials(&self, id: NodeId) -> Vec<MaterialSlot> {
        let mut slots = Vec::new();
        for mesh_id in self.meshes_under(id) {
            if let Some(mesh) = self.node(mesh_id).and_then(Node::as_mesh) {
                slots.extend((0..mesh.materials.len()).map(|index| MaterialSlot {
                    node: mesh_id,
                    index,
                }));
            }
        }
        slots
    }

    /// Mesh nodes in the subtree rooted at `id`, depth first
    pub fn meshes_under(&self, id: NodeId) -> Vec<NodeId> {
        let mut meshes = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else { continue };
            match &node.kind {
                NodeKind::Mesh(_) => meshes.push(current),
                NodeKind::Group { children } => stack.extend(children.iter().rev()),
            }
        }
        meshes
    }

    pub fn material(&self, slot: MaterialSlot) -> Option<&Material> {
        self.node(slot.node)
            .and_then(Node::as_mesh)
            .and_then(|mesh| mesh.materials.get(slot.index))
    }

    /// Mutable access to one material; marks the owning mesh as changed
    pub fn material_mut(&mut self, slot: MaterialSlot) -> Option<&mut Material> {
        let node = self.nodes.get_mut(slot.node.index())?;
        let NodeKind::Mesh(mesh) = &mut node.kind else {
            return None;
        };
        let material = mesh.materials.get_mut(slot.index)?;
        self.dirty.insert(slot.node);
        Some(material)
    }

    /// Root nodes added since the previous call
    pub fn drain_added(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.added)
    }

    /// Nodes whose transform or materials changed since the previous call
    pub fn drain_dirty(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    fn arrow_like(scene: &mut Scene) -> (NodeId, NodeId, NodeId) {
        let group = scene.create_group("arrow", Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        let shaft = scene.create_mesh(
            "shaft",
            Geometry::cylinder(0.1, 1.0),
            vec![Material::basic(0xff0000)],
            Transform::from_translation(Vec3::new(0.0, 0.5, 0.0)),
        );
        let head = scene.create_mesh(
            "head",
            Geometry::cone(0.2, 0.5),
            vec![Material::basic(0x00ff00)],
            Transform::from_translation(Vec3::new(0.0, 1.25, 0.0)),
        );
        scene.attach(group, shaft);
        scene.attach(group, head);
        (group, shaft, head)
    }

    #[test]
    fn test_collect_materials_mesh_and_group() {
        let mut scene = Scene::new();
        let cube = scene.create_mesh(
            "cube",
            Geometry::cuboid(1.0, 1.0, 1.0),
            (0..6).map(|_| Material::basic(0x888888)).collect(),
            Transform::default(),
        );
        assert_eq!(scene.collect_materials(cube).len(), 6);

        let (group, shaft, head) = arrow_like(&mut scene);
        let slots = scene.collect_materials(group);
        assert_eq!(
            slots,
            vec![
                MaterialSlot { node: shaft, index: 0 },
                MaterialSlot { node: head, index: 0 }
            ]
        );
    }

    #[test]
    fn test_parent_links() {
        let mut scene = Scene::new();
        let (group, shaft, head) = arrow_like(&mut scene);
        assert_eq!(scene.parent(shaft), Some(group));
        assert_eq!(scene.parent(head), Some(group));
        assert_eq!(scene.parent(group), None);
        assert_eq!(scene.node(group).map(|n| n.children().len()), Some(2));
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut scene = Scene::new();
        let (_, _, head) = arrow_like(&mut scene);
        let origin = scene.world_matrix(head).transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 1.25, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_dirty_tracking() {
        let mut scene = Scene::new();
        let (group, shaft, _) = arrow_like(&mut scene);
        scene.add_root(group);
        assert_eq!(scene.drain_added(), vec![group]);
        assert!(scene.drain_added().is_empty());

        if let Some(material) = scene.material_mut(MaterialSlot { node: shaft, index: 0 }) {
            material.color = Rgb::WHITE;
        }
        scene.set_translation(group, Vec3::ONE);
        // Drained in id order; the group was created before its shaft
        assert_eq!(scene.drain_dirty(), vec![group, shaft]);
        assert!(scene.drain_dirty().is_empty());
    }

    #[test]
    fn test_material_mut_out_of_range() {
        let mut scene = Scene::new();
        let (group, shaft, _) = arrow_like(&mut scene);
        assert!(scene.material_mut(MaterialSlot { node: shaft, index: 3 }).is_none());
        assert!(scene.material_mut(MaterialSlot { node: group, index: 0 }).is_none());
        assert!(scene.drain_dirty().is_empty());
    }
}
