//! Scene graph owned by the render thread.
//!
//! This module provides the data structures for a dynamic scene where all
//! entities are created and torn down by stimuli. It is deliberately small:
//! nodes carry a transform and a flat list of panels and lights, and the
//! scene root carries the pose-tracking translation/rotation applied by the
//! render loop each tick.

use std::collections::HashMap;

use glam::{Mat4, Vec3};

/// Unique identifier for scene nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// Transform component for scene nodes and panels.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians (pitch, yaw, roll).
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// A colored box panel attached to a node.
#[derive(Debug, Clone)]
pub struct Panel {
    pub half_extents: Vec3,
    pub color: [f32; 3],
    pub transform: Transform,
    pub visible: bool,
}

/// A point light attached to a node.
#[derive(Debug, Clone)]
pub struct PointLight {
    pub position: Vec3,
    pub color: [f32; 3],
}

/// A child of the scene root: one transform plus attached entities.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub transform: Transform,
    pub panels: Vec<Panel>,
    pub lights: Vec<PointLight>,
    pub visible: bool,
}

/// The scene graph: a root transform tracking the subject's pose delta and
/// a flat set of child nodes owned by whatever stimulus is live.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,

    root_position: Vec3,
    /// Root orientation as an absolute (pitch, yaw, roll) triple. Reset and
    /// reapplied every tick rather than rotated incrementally, so repeated
    /// updates cannot accumulate drift.
    root_rotation: Vec3,

    pub ambient: [f32; 3],
    pub background: [f32; 3],
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 1,
            root_position: Vec3::ZERO,
            root_rotation: Vec3::ZERO,
            ambient: [0.0; 3],
            background: [0.0; 3],
        }
    }

    // ------------------------------------------------------------------
    // Root transform
    // ------------------------------------------------------------------

    pub fn set_root_position(&mut self, position: Vec3) {
        self.root_position = position;
    }

    /// Set the root orientation absolutely from a pitch/yaw/roll triple.
    pub fn set_root_rotation(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.root_rotation = Vec3::new(pitch, yaw, roll);
    }

    pub fn root_position(&self) -> Vec3 {
        self.root_position
    }

    pub fn root_rotation(&self) -> Vec3 {
        self.root_rotation
    }

    /// Root orientation matrix: identity, then pitch, yaw, roll applied in
    /// that fixed order about the local axes.
    pub fn root_orientation(&self) -> Mat4 {
        Mat4::from_rotation_x(self.root_rotation.x)
            * Mat4::from_rotation_y(self.root_rotation.y)
            * Mat4::from_rotation_z(self.root_rotation.z)
    }

    /// Full root matrix (translation * orientation).
    pub fn root_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.root_position) * self.root_orientation()
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Create an empty child node of the scene root.
    pub fn create_node(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                visible: true,
                ..Node::default()
            },
        );
        id
    }

    /// Destroy a node and everything attached to it.
    pub fn destroy_node(&mut self, id: NodeId) -> bool {
        self.nodes.remove(&id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn attach_panel(&mut self, id: NodeId, panel: Panel) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.panels.push(panel);
        }
    }

    pub fn attach_light(&mut self, id: NodeId, light: PointLight) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.lights.push(light);
        }
    }

    pub fn set_node_position(&mut self, id: NodeId, position: Vec3) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.transform.position = position;
        }
    }

    /// Set a node's yaw (rotation about the vertical axis) absolutely.
    pub fn set_node_yaw(&mut self, id: NodeId, yaw: f32) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.transform.rotation.y = yaw;
        }
    }

    pub fn node_yaw(&self, id: NodeId) -> Option<f32> {
        self.nodes.get(&id).map(|n| n.transform.rotation.y)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Total panel count across all nodes.
    pub fn panel_count(&self) -> usize {
        self.nodes.values().map(|n| n.panels.len()).sum()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_destroy_node() {
        let mut scene = SceneGraph::new();
        let id = scene.create_node();

        assert!(scene.get(id).is_some());
        assert!(scene.destroy_node(id));
        assert!(scene.get(id).is_none());
        assert!(!scene.destroy_node(id));
    }

    #[test]
    fn test_attach_entities() {
        let mut scene = SceneGraph::new();
        let id = scene.create_node();

        scene.attach_panel(
            id,
            Panel {
                half_extents: Vec3::new(0.1, 0.2, 0.01),
                color: [1.0, 0.0, 0.0],
                transform: Transform::default(),
                visible: true,
            },
        );
        scene.attach_light(
            id,
            PointLight {
                position: Vec3::new(0.0, 1.0, 0.0),
                color: [1.0, 1.0, 1.0],
            },
        );

        let node = scene.get(id).unwrap();
        assert_eq!(node.panels.len(), 1);
        assert_eq!(node.lights.len(), 1);
        assert_eq!(scene.panel_count(), 1);
    }

    #[test]
    fn test_root_rotation_is_absolute() {
        let mut scene = SceneGraph::new();

        // Setting the same rotation repeatedly must not accumulate.
        for _ in 0..100 {
            scene.set_root_rotation(0.1, 0.2, 0.3);
        }
        assert_eq!(scene.root_rotation(), Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_root_orientation_axis_order() {
        let mut scene = SceneGraph::new();
        scene.set_root_rotation(0.0, std::f32::consts::FRAC_PI_2, 0.0);

        // Pure yaw of 90 degrees carries +X to -Z.
        let rotated = scene.root_orientation().transform_vector3(Vec3::X);
        assert!((rotated - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_clear_removes_all_nodes() {
        let mut scene = SceneGraph::new();
        let a = scene.create_node();
        scene.create_node();
        scene.attach_panel(
            a,
            Panel {
                half_extents: Vec3::ONE,
                color: [1.0, 1.0, 1.0],
                transform: Transform::default(),
                visible: true,
            },
        );

        scene.clear();
        assert_eq!(scene.node_count(), 0);
        assert_eq!(scene.panel_count(), 0);
    }

    #[test]
    fn test_node_yaw() {
        let mut scene = SceneGraph::new();
        let id = scene.create_node();

        scene.set_node_yaw(id, 1.25);
        assert_eq!(scene.node_yaw(id), Some(1.25));
    }
}
