//! Scene graph nodes.

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::geometry::{MeshGeometry, PointsGeometry};
use crate::material::{MeshMaterial, PointsMaterial};

/// Local translation, rotation and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// A point light. `range == 0` disables distance cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub range: f32,
    pub decay: f32,
}

/// What a node contributes to the frame.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh {
        geometry: Arc<MeshGeometry>,
        material: MeshMaterial,
    },
    Points {
        geometry: Arc<PointsGeometry>,
        material: PointsMaterial,
    },
    PointLight(PointLight),
}

/// A positioned object with children.
///
/// With `matrix_auto_update` off, the local matrix stays at whatever
/// [`freeze_matrix`](Self::freeze_matrix) captured, even if `transform`
/// changes later.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
    matrix_auto_update: bool,
    frozen_matrix: Mat4,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            kind,
            children: Vec::new(),
            matrix_auto_update: true,
            frozen_matrix: Mat4::IDENTITY,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_children(mut self, children: Vec<SceneNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Capture the current transform and stop tracking it.
    pub fn freeze_matrix(&mut self) {
        self.frozen_matrix = self.transform.matrix();
        self.matrix_auto_update = false;
    }

    pub fn matrix_auto_update(&self) -> bool {
        self.matrix_auto_update
    }

    pub fn local_matrix(&self) -> Mat4 {
        if self.matrix_auto_update {
            self.transform.matrix()
        } else {
            self.frozen_matrix
        }
    }

    /// Depth-first pre-order walk, passing each node's world matrix.
    pub fn visit(&self, parent_world: Mat4, f: &mut impl FnMut(&SceneNode, Mat4)) {
        let world = parent_world * self.local_matrix();
        f(self, world);
        for child in &self.children {
            child.visit(world, f);
        }
    }

    /// Mutable pre-order walk without matrices.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut SceneNode)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    /// This node plus all descendants.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SceneNode::subtree_len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_world(node: &SceneNode) -> Vec<(String, Mat4)> {
        let mut out = Vec::new();
        node.visit(Mat4::IDENTITY, &mut |n, world| out.push((n.name.clone(), world)));
        out
    }

    #[test]
    fn test_world_matrix_is_parent_times_child() {
        let mut parent = SceneNode::group("parent").with_transform(Transform {
            scale: Vec3::splat(2.0),
            ..Transform::from_position(Vec3::new(10.0, 0.0, 0.0))
        });
        parent.add_child(SceneNode::group("child").with_transform(Transform::from_position(Vec3::Y)));

        let worlds = collect_world(&parent);
        assert_eq!(worlds.len(), 2);
        let child_origin = worlds[1].1.transform_point3(Vec3::ZERO);
        assert!((child_origin - Vec3::new(10.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_frozen_matrix_ignores_later_changes() {
        let mut node = SceneNode::group("stars").with_transform(Transform::from_position(Vec3::X));
        node.freeze_matrix();
        node.transform.position = Vec3::new(100.0, 0.0, 0.0);
        assert!(!node.matrix_auto_update());
        assert_eq!(node.local_matrix(), Mat4::from_translation(Vec3::X));
    }

    #[test]
    fn test_auto_update_tracks_transform() {
        let mut node = SceneNode::group("n");
        node.transform.position = Vec3::Z;
        assert_eq!(node.local_matrix(), Mat4::from_translation(Vec3::Z));
    }

    #[test]
    fn test_visit_is_pre_order() {
        let mut root = SceneNode::group("a");
        let mut b = SceneNode::group("b");
        b.add_child(SceneNode::group("c"));
        root.add_child(b);
        root.add_child(SceneNode::group("d"));

        let names: Vec<String> = collect_world(&root).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(root.subtree_len(), 4);
    }
}
