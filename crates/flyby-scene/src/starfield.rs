//! Layered star point clouds.
//!
//! Two star buffers are generated once and shared by twenty layers. Each
//! layer picks a buffer and a grey material by index, gets a random
//! orientation, and is scaled up so that the layers nest at growing
//! distances.

use std::ops::Range;
use std::sync::Arc;

use glam::{EulerRot, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::geometry::PointsGeometry;
use crate::material::{PointsMaterial, star_palette};
use crate::node::{NodeKind, SceneNode, Transform};

/// Layer indices. The index also drives buffer, material and scale choice.
pub const LAYER_RANGE: Range<u32> = 10..30;

/// Upper bound of the random per-axis rotation, in radians.
pub const MAX_LAYER_ROTATION: f32 = 6.0;

/// Placement of one star layer.
#[derive(Debug, Clone, PartialEq)]
pub struct StarLayer {
    pub index: u32,
    /// Which of the two buffers the layer draws.
    pub buffer: usize,
    /// Index into [`star_palette`].
    pub material: usize,
    /// Euler angles (XYZ order).
    pub rotation: Vec3,
    pub scale: f32,
}

impl StarLayer {
    fn new(index: u32, rng: &mut impl Rng) -> Self {
        let mut angle = || rng.random::<f32>() * MAX_LAYER_ROTATION;
        let rotation = Vec3::new(angle(), angle(), angle());
        Self {
            index,
            buffer: index as usize % 2,
            material: index as usize % 6,
            rotation,
            scale: index as f32 * 10.0,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: Vec3::ZERO,
            rotation: Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z),
            scale: Vec3::splat(self.scale),
        }
    }
}

/// The two shared star buffers and the layers that draw them.
#[derive(Debug, Clone)]
pub struct StarField {
    pub buffers: [Arc<PointsGeometry>; 2],
    pub layers: Vec<StarLayer>,
    palette: [PointsMaterial; 6],
}

impl StarField {
    /// Generate buffers of `counts[0]` and `counts[1]` points inside a sphere
    /// of `radius`. Deterministic for a given seed.
    pub fn generate(radius: f32, counts: [usize; 2], seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let buffers = [
            Arc::new(random_points_in_sphere(&mut rng, radius, counts[0])),
            Arc::new(random_points_in_sphere(&mut rng, radius, counts[1])),
        ];
        let layers = LAYER_RANGE.map(|i| StarLayer::new(i, &mut rng)).collect();

        tracing::debug!(
            sparse = counts[0],
            dense = counts[1],
            layers = LAYER_RANGE.len(),
            "Star field generated"
        );

        Self {
            buffers,
            layers,
            palette: star_palette(),
        }
    }

    /// One frozen-matrix points node per layer.
    pub fn nodes(&self) -> Vec<SceneNode> {
        self.layers
            .iter()
            .map(|layer| {
                let mut node = SceneNode::new(
                    format!("stars-{}", layer.index),
                    NodeKind::Points {
                        geometry: Arc::clone(&self.buffers[layer.buffer]),
                        material: self.palette[layer.material].clone(),
                    },
                )
                .with_transform(layer.transform());
                node.freeze_matrix();
                node
            })
            .collect()
    }
}

/// Uniform samples inside a ball, by rejection from the enclosing cube.
fn random_points_in_sphere(rng: &mut impl Rng, radius: f32, count: usize) -> PointsGeometry {
    let mut positions = Vec::with_capacity(count);
    while positions.len() < count {
        let p = Vec3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        if p.length_squared() <= 1.0 {
            positions.push((p * radius).to_array());
        }
    }
    PointsGeometry::new(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    const RADIUS: f32 = 6371.0;

    fn field(seed: u64) -> StarField {
        StarField::generate(RADIUS, [250, 1500], seed)
    }

    #[test]
    fn test_buffer_sizes() {
        let stars = field(1);
        assert_eq!(stars.buffers[0].len(), 250);
        assert_eq!(stars.buffers[1].len(), 1500);
    }

    #[test]
    fn test_points_inside_radius() {
        let stars = field(2);
        for buffer in &stars.buffers {
            assert!(buffer.bounding_radius() <= RADIUS * (1.0 + 1e-5));
        }
    }

    #[test]
    fn test_twenty_layers_with_index_rules() {
        let stars = field(3);
        assert_eq!(stars.layers.len(), 20);
        for (layer, i) in stars.layers.iter().zip(10u32..) {
            assert_eq!(layer.index, i);
            assert_eq!(layer.buffer, (i % 2) as usize);
            assert_eq!(layer.material, (i % 6) as usize);
            assert_eq!(layer.scale, i as f32 * 10.0);
            for angle in layer.rotation.to_array() {
                assert!((0.0..MAX_LAYER_ROTATION).contains(&angle));
            }
        }
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let a = field(42);
        let b = field(42);
        assert_eq!(a.buffers[1].positions, b.buffers[1].positions);
        assert_eq!(a.layers, b.layers);
        assert_ne!(a.layers, field(43).layers);
    }

    #[test]
    fn test_layers_share_buffers() {
        let stars = field(4);
        let nodes = stars.nodes();
        assert_eq!(nodes.len(), 20);
        for (node, layer) in nodes.iter().zip(&stars.layers) {
            let NodeKind::Points { geometry, material } = &node.kind else {
                panic!("star layer must be a points node");
            };
            assert!(Arc::ptr_eq(geometry, &stars.buffers[layer.buffer]));
            assert_eq!(*material, star_palette()[layer.material]);
        }
    }

    #[test]
    fn test_layer_nodes_are_frozen() {
        let stars = field(5);
        let mut nodes = stars.nodes();
        let node = &mut nodes[0];
        assert!(!node.matrix_auto_update());
        let before = node.local_matrix();
        node.transform.scale = Vec3::ONE;
        assert_eq!(node.local_matrix(), before);

        let scale = before.to_scale_rotation_translation().0;
        assert!((scale - Vec3::splat(100.0)).length() < 1e-3);
        assert_ne!(before, Mat4::IDENTITY);
    }

    #[test]
    fn test_empty_buffers() {
        let stars = StarField::generate(RADIUS, [0, 0], 6);
        assert!(stars.buffers.iter().all(|b| b.is_empty()));
        assert_eq!(stars.layers.len(), 20);
    }
}
