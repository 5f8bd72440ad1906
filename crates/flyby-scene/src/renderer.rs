//! GPU mirror of a [`Scene`].
//!
//! The scene is append-only, so [`SceneRenderer::prepare`] uploads
//! resources only for top-level nodes it has not seen yet. Geometry and
//! textures shared through `Arc` are uploaded once.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;

use flyby_render::{
    BufferAllocator, FrameBindings, FrameUniform, GpuTexture, IndexData, MeshBuffer, MeshPipeline,
    MeshUniform, ObjectBinding, PerspectiveCamera, PointLightUniform, PointsBuffer, PointsPipeline,
    PointsUniform, SceneDrawer, TextureBinder, Viewport,
};

use crate::geometry::{MeshGeometry, PointsGeometry};
use crate::material::TextureImage;
use crate::node::{NodeKind, SceneNode};
use crate::scene::Scene;

enum Drawable {
    Mesh {
        object: ObjectBinding,
        mesh: usize,
        texture: Option<usize>,
    },
    Points {
        object: ObjectBinding,
        points: usize,
    },
}

/// Uploads and draws a [`Scene`].
pub struct SceneRenderer {
    frame: FrameBindings,
    mesh_pipeline: MeshPipeline,
    points_pipeline: PointsPipeline,
    textures: TextureBinder,
    white: GpuTexture,
    mesh_buffers: Vec<MeshBuffer>,
    points_buffers: Vec<PointsBuffer>,
    gpu_textures: Vec<GpuTexture>,
    // Keyed by Arc address. The Arc is held so the address stays unique.
    mesh_cache: HashMap<usize, (Arc<MeshGeometry>, usize)>,
    points_cache: HashMap<usize, (Arc<PointsGeometry>, usize)>,
    texture_cache: HashMap<usize, (Arc<TextureImage>, Option<usize>)>,
    drawables: Vec<Drawable>,
    synced_roots: usize,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let frame = FrameBindings::new(device);
        let textures = TextureBinder::new(device);
        let mesh_pipeline = MeshPipeline::new(
            device,
            target_format,
            sample_count,
            &frame.layout,
            &textures.layout,
        );
        let points_pipeline = PointsPipeline::new(device, target_format, sample_count, &frame.layout);
        let white = textures.white(device, queue);

        Self {
            frame,
            mesh_pipeline,
            points_pipeline,
            textures,
            white,
            mesh_buffers: Vec::new(),
            points_buffers: Vec::new(),
            gpu_textures: Vec::new(),
            mesh_cache: HashMap::new(),
            points_cache: HashMap::new(),
            texture_cache: HashMap::new(),
            drawables: Vec::new(),
            synced_roots: 0,
        }
    }

    /// Upload new nodes and refresh every uniform for the coming frame.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        camera: &PerspectiveCamera,
        viewport: &Viewport,
    ) {
        let new_roots = scene.nodes().get(self.synced_roots..).unwrap_or_default();
        for root in new_roots {
            root.visit(Mat4::IDENTITY, &mut |node, world| self.sync_node(device, queue, node, world));
        }
        if !new_roots.is_empty() {
            tracing::debug!(
                "Scene synced: {} roots, {} drawables, {} meshes, {} point buffers",
                scene.len(),
                self.drawables.len(),
                self.mesh_buffers.len(),
                self.points_buffers.len()
            );
        }
        self.synced_roots = scene.len();

        let light = scene.point_light().unwrap_or(PointLightUniform::NONE);
        let uniform = FrameUniform::new(camera, viewport, &scene.fog_uniform(), &light);
        self.frame.update(queue, &uniform);

        let mut drawables = self.drawables.iter();
        scene.visit(&mut |node, world| {
            let drawable = if is_drawable(node) { drawables.next() } else { None };
            match (&node.kind, drawable) {
                (NodeKind::Mesh { material, .. }, Some(Drawable::Mesh { object, .. })) => {
                    let uniform = MeshUniform::new(
                        world,
                        material.color,
                        material.emissive,
                        material.emissive_intensity,
                    );
                    object.write(queue, bytemuck::bytes_of(&uniform));
                }
                (NodeKind::Points { material, .. }, Some(Drawable::Points { object, .. })) => {
                    let uniform = PointsUniform::new(world, material.color, material.size);
                    object.write(queue, bytemuck::bytes_of(&uniform));
                }
                _ => {}
            }
        });
    }

    /// Number of objects drawn per frame.
    pub fn drawable_count(&self) -> usize {
        self.drawables.len()
    }

    /// Distinct geometry buffers resident on the GPU (meshes, point clouds).
    pub fn buffer_counts(&self) -> (usize, usize) {
        (self.mesh_buffers.len(), self.points_buffers.len())
    }

    fn sync_node(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, node: &SceneNode, world: Mat4) {
        match &node.kind {
            NodeKind::Mesh { geometry, material } => {
                let mesh = self.mesh_buffer(device, &node.name, geometry);
                let texture = material
                    .map
                    .as_ref()
                    .and_then(|image| self.texture(device, queue, &node.name, image));
                let uniform = MeshUniform::new(
                    world,
                    material.color,
                    material.emissive,
                    material.emissive_intensity,
                );
                let object = ObjectBinding::new(
                    device,
                    &self.mesh_pipeline.object_layout,
                    &node.name,
                    bytemuck::bytes_of(&uniform),
                );
                self.drawables.push(Drawable::Mesh {
                    object,
                    mesh,
                    texture,
                });
            }
            NodeKind::Points { geometry, material } => {
                if material.size_attenuation {
                    tracing::warn!("{}: attenuated points are drawn at constant size", node.name);
                }
                let points = self.points_buffer(device, &node.name, geometry);
                let uniform = PointsUniform::new(world, material.color, material.size);
                let object = ObjectBinding::new(
                    device,
                    &self.points_pipeline.object_layout,
                    &node.name,
                    bytemuck::bytes_of(&uniform),
                );
                self.drawables.push(Drawable::Points { object, points });
            }
            NodeKind::Group | NodeKind::PointLight(_) => {}
        }
    }

    fn mesh_buffer(&mut self, device: &wgpu::Device, label: &str, geometry: &Arc<MeshGeometry>) -> usize {
        let key = Arc::as_ptr(geometry) as usize;
        if let Some((_, index)) = self.mesh_cache.get(&key) {
            return *index;
        }

        let allocator = BufferAllocator::new(device);
        let buffer = match narrow_indices(&geometry.indices, geometry.vertices.len()) {
            Some(indices) => allocator.create_mesh(label, &geometry.vertices, IndexData::U16(&indices)),
            None => allocator.create_mesh(label, &geometry.vertices, IndexData::U32(&geometry.indices)),
        };

        let index = self.mesh_buffers.len();
        self.mesh_buffers.push(buffer);
        self.mesh_cache.insert(key, (Arc::clone(geometry), index));
        index
    }

    fn points_buffer(&mut self, device: &wgpu::Device, label: &str, geometry: &Arc<PointsGeometry>) -> usize {
        let key = Arc::as_ptr(geometry) as usize;
        if let Some((_, index)) = self.points_cache.get(&key) {
            return *index;
        }

        let buffer = BufferAllocator::new(device).create_points(label, &geometry.positions);
        let index = self.points_buffers.len();
        self.points_buffers.push(buffer);
        self.points_cache.insert(key, (Arc::clone(geometry), index));
        index
    }

    fn texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        image: &Arc<TextureImage>,
    ) -> Option<usize> {
        let key = Arc::as_ptr(image) as usize;
        if let Some((_, index)) = self.texture_cache.get(&key) {
            return *index;
        }

        let index = match self
            .textures
            .create(device, queue, label, &image.rgba, image.width, image.height)
        {
            Ok(texture) => {
                self.gpu_textures.push(texture);
                Some(self.gpu_textures.len() - 1)
            }
            Err(e) => {
                tracing::warn!("{label}: {e}; drawing untextured");
                None
            }
        };
        self.texture_cache.insert(key, (Arc::clone(image), index));
        index
    }
}

fn is_drawable(node: &SceneNode) -> bool {
    matches!(node.kind, NodeKind::Mesh { .. } | NodeKind::Points { .. })
}

impl SceneDrawer for SceneRenderer {
    fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_bind_group(0, &self.frame.bind_group, &[]);
        for drawable in &self.drawables {
            match drawable {
                Drawable::Mesh {
                    object,
                    mesh,
                    texture,
                } => {
                    let color_map = texture
                        .and_then(|i| self.gpu_textures.get(i))
                        .unwrap_or(&self.white);
                    self.mesh_pipeline.draw(
                        render_pass,
                        object,
                        &color_map.bind_group,
                        &self.mesh_buffers[*mesh],
                    );
                }
                Drawable::Points { object, points } => {
                    self.points_pipeline
                        .draw(render_pass, object, &self.points_buffers[*points]);
                }
            }
        }
    }
}

/// 16-bit copies of `indices`, or `None` if the vertex count or any index
/// needs 32 bits.
fn narrow_indices(indices: &[u32], vertex_count: usize) -> Option<Vec<u16>> {
    if !IndexData::fits_u16(vertex_count) {
        return None;
    }
    indices.iter().map(|&i| u16::try_from(i).ok()).collect()
}
