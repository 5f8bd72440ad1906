//! The scene root: top-level nodes plus fog.

use glam::{Mat4, Vec3};

use flyby_render::{FogUniform, PointLightUniform};

use crate::loader::{AssetError, LoadedModel};
use crate::node::{NodeKind, SceneNode, Transform};

/// Exponential-squared fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub density: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: [0.0; 3],
            density: 2.5e-7,
        }
    }
}

/// Ordered collection of top-level nodes. Append-only.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub fog: Fog,
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new(fog: Fog) -> Self {
        Self {
            fog,
            nodes: Vec::new(),
        }
    }

    pub fn add(&mut self, node: SceneNode) {
        tracing::trace!(name = %node.name, "Node added to scene");
        self.nodes.push(node);
    }

    /// Number of top-level nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Walk every node in order with its world matrix.
    pub fn visit(&self, f: &mut impl FnMut(&SceneNode, Mat4)) {
        for node in &self.nodes {
            node.visit(Mat4::IDENTITY, f);
        }
    }

    /// The first point light in traversal order with its world position.
    pub fn point_light(&self) -> Option<PointLightUniform> {
        let mut found = None;
        self.visit(&mut |node, world| {
            if found.is_none()
                && let NodeKind::PointLight(light) = &node.kind
            {
                found = Some(PointLightUniform {
                    position: world.transform_point3(Vec3::ZERO),
                    color: light.color,
                    intensity: light.intensity,
                    range: light.range,
                    decay: light.decay,
                });
            }
        });
        found
    }

    pub fn fog_uniform(&self) -> FogUniform {
        FogUniform {
            color: self.fog.color,
            density: self.fog.density,
        }
    }

    /// Append a finished model load, placed by `placement`.
    ///
    /// The texture, if any, becomes the color map of every mesh in the
    /// model. Failures are logged and leave the scene untouched. Returns
    /// whether a node was added.
    pub fn complete_model_load(
        &mut self,
        outcome: Result<LoadedModel, AssetError>,
        placement: Transform,
    ) -> bool {
        let model = match outcome {
            Ok(model) => model,
            Err(e) => {
                tracing::error!("Model load failed: {e}");
                return false;
            }
        };

        let LoadedModel {
            mut root,
            texture,
            source,
        } = model;

        let mut meshes = 0usize;
        root.visit_mut(&mut |node| {
            if let NodeKind::Mesh { material, .. } = &mut node.kind {
                meshes += 1;
                if let Some(texture) = &texture {
                    material.map = Some(texture.clone());
                }
            }
        });

        let placed = SceneNode::group(root.name.clone())
            .with_transform(placement)
            .with_children(vec![root]);

        tracing::info!(
            path = %source.display(),
            meshes,
            textured = texture.is_some(),
            "Model added to scene"
        );
        self.add(placed);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshGeometry;
    use crate::material::{MeshMaterial, TextureImage};
    use crate::sun::build_sun;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn mesh_node(name: &str) -> SceneNode {
        SceneNode::new(
            name,
            NodeKind::Mesh {
                geometry: Arc::new(MeshGeometry::default()),
                material: MeshMaterial::default(),
            },
        )
    }

    fn model(texture: Option<TextureImage>) -> LoadedModel {
        let mut root = SceneNode::group("plane");
        let mut body = mesh_node("body");
        body.add_child(mesh_node("wing"));
        root.add_child(body);
        LoadedModel {
            root,
            texture: texture.map(Arc::new),
            source: PathBuf::from("plane.gltf"),
        }
    }

    fn collect_maps(scene: &Scene) -> Vec<bool> {
        let mut maps = Vec::new();
        scene.visit(&mut |node, _| {
            if let NodeKind::Mesh { material, .. } = &node.kind {
                maps.push(material.map.is_some());
            }
        });
        maps
    }

    #[test]
    fn test_successful_load_adds_one_node() {
        let mut scene = Scene::default();
        scene.add(SceneNode::group("existing"));
        let texture = TextureImage {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        };
        assert!(scene.complete_model_load(Ok(model(Some(texture))), Transform::default()));
        assert_eq!(scene.len(), 2);
        assert_eq!(collect_maps(&scene), vec![true, true]);
    }

    #[test]
    fn test_failed_load_leaves_scene_unchanged() {
        let mut scene = Scene::default();
        scene.add(SceneNode::group("existing"));
        let err = AssetError::NoMeshes {
            path: PathBuf::from("empty.gltf"),
        };
        assert!(!scene.complete_model_load(Err(err), Transform::default()));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_untextured_model_still_added() {
        let mut scene = Scene::default();
        assert!(scene.complete_model_load(Ok(model(None)), Transform::default()));
        assert_eq!(scene.len(), 1);
        assert_eq!(collect_maps(&scene), vec![false, false]);
    }

    #[test]
    fn test_placement_applies_to_model() {
        let mut scene = Scene::default();
        let placement = Transform::from_position(Vec3::new(-50.0, 0.0, 31655.0));
        scene.complete_model_load(Ok(model(None)), placement);

        let mut origins = Vec::new();
        scene.visit(&mut |_, world| origins.push(world.transform_point3(Vec3::ZERO)));
        assert!(origins.iter().all(|o| *o == placement.position));
    }

    #[test]
    fn test_point_light_world_position() {
        let mut scene = Scene::default();
        assert!(scene.point_light().is_none());
        scene.add(build_sun(10.0, Vec3::new(0.0, 0.0, 50.0)));
        let light = scene.point_light().map(|l| l.position);
        assert_eq!(light, Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_default_fog() {
        let fog = Scene::default().fog_uniform();
        assert_eq!(fog.color, [0.0; 3]);
        assert_eq!(fog.density, 2.5e-7);
    }
}
