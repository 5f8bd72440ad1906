//! The sun: a point light carrying an emissive sphere.

use std::sync::Arc;

use glam::Vec3;

use flyby_render::hex_to_linear;

use crate::geometry::MeshGeometry;
use crate::material::MeshMaterial;
use crate::node::{NodeKind, PointLight, SceneNode, Transform};

pub const SUN_LIGHT_COLOR: u32 = 0xffee88;
pub const SUN_EMISSIVE_COLOR: u32 = 0xffffee;
pub const SUN_WIDTH_SEGMENTS: u32 = 100;
pub const SUN_HEIGHT_SEGMENTS: u32 = 50;

/// Offset from the camera, in multiples of the planet radius.
pub fn sun_offset(radius: f32) -> Vec3 {
    Vec3::new(radius, 0.0, -5.0 * radius)
}

/// Build the sun node placed relative to the starting camera position.
pub fn build_sun(radius: f32, camera_position: Vec3) -> SceneNode {
    let light = PointLight {
        color: hex_to_linear(SUN_LIGHT_COLOR),
        intensity: 1.0,
        range: 0.0,
        decay: 2.0,
    };

    let mut sun = SceneNode::new("sun", NodeKind::PointLight(light))
        .with_transform(Transform::from_position(camera_position + sun_offset(radius)));

    sun.add_child(SceneNode::new(
        "sun-sphere",
        NodeKind::Mesh {
            geometry: Arc::new(MeshGeometry::sphere(
                radius,
                SUN_WIDTH_SEGMENTS,
                SUN_HEIGHT_SEGMENTS,
            )),
            material: MeshMaterial::emissive(SUN_EMISSIVE_COLOR, 1.0),
        },
    ));

    tracing::debug!(radius, "Sun built");
    sun
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn test_sun_position_relative_to_camera() {
        let radius = 6371.0;
        let camera = Vec3::new(0.0, 0.0, radius * 5.0);
        let sun = build_sun(radius, camera);
        assert_eq!(sun.transform.position, Vec3::new(radius, 0.0, 0.0));
    }

    #[test]
    fn test_sun_light_parameters() {
        let sun = build_sun(1.0, Vec3::ZERO);
        let NodeKind::PointLight(light) = &sun.kind else {
            panic!("sun root must be a point light");
        };
        assert_eq!(light.intensity, 1.0);
        assert_eq!(light.range, 0.0);
        assert_eq!(light.decay, 2.0);
        assert_eq!(light.color, hex_to_linear(0xffee88));
    }

    #[test]
    fn test_sun_sphere_follows_light() {
        let radius = 100.0;
        let sun = build_sun(radius, Vec3::ZERO);
        assert_eq!(sun.children.len(), 1);

        let mut sphere_world = None;
        sun.visit(Mat4::IDENTITY, &mut |node, world| {
            if let NodeKind::Mesh { geometry, material } = &node.kind {
                assert_eq!(geometry.vertices.len(), 101 * 51);
                assert!((geometry.bounding_radius() - radius).abs() < 1e-3);
                assert_eq!(material.color, [0.0; 3]);
                sphere_world = Some(world);
            }
        });
        let center = sphere_world.map(|m| m.transform_point3(Vec3::ZERO));
        assert_eq!(center, Some(sun_offset(radius)));
    }
}
