//! Lit, textured triangle meshes with emissive term and fog.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

use crate::buffer::{MeshBuffer, VertexPositionNormalUv};
use crate::depth::DepthBuffer;
use crate::frame::FRAME_WGSL;

/// Per-object uniform for meshes (group 1). 160 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MeshUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of `model`, for normals.
    pub normal_matrix: [[f32; 4]; 4],
    /// rgb = base color (linear).
    pub color: [f32; 4],
    /// rgb = emissive color (linear), w = emissive intensity.
    pub emissive: [f32; 4],
}

impl MeshUniform {
    pub const SIZE: u64 = std::mem::size_of::<MeshUniform>() as u64;

    pub fn new(model: Mat4, color: [f32; 3], emissive: [f32; 3], emissive_intensity: f32) -> Self {
        let [r, g, b] = color;
        let [er, eg, eb] = emissive;
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: [r, g, b, 1.0],
            emissive: [er, eg, eb, emissive_intensity],
        }
    }
}

/// A uniform buffer with its bind group, one per drawable.
pub struct ObjectBinding {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ObjectBinding {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str, contents: &[u8]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    pub fn write(&self, queue: &wgpu::Queue, contents: &[u8]) {
        queue.write_buffer(&self.buffer, 0, contents);
    }
}

/// Bind group layout for a single per-object uniform buffer.
pub(crate) fn object_layout(device: &wgpu::Device, label: &str, size: u64) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(size),
            },
            count: None,
        }],
    })
}

/// Render pipeline for lit meshes.
///
/// Groups: 0 = frame, 1 = [`MeshUniform`], 2 = color map.
pub struct MeshPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub object_layout: wgpu::BindGroupLayout,
}

impl MeshPipeline {
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        sample_count: u32,
        frame_layout: &wgpu::BindGroupLayout,
        texture_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh-shader"),
            source: wgpu::ShaderSource::Wgsl(mesh_shader_source().into()),
        });

        let object_layout = object_layout(device, "mesh-object-layout", MeshUniform::SIZE);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh-pipeline-layout"),
            bind_group_layouts: &[frame_layout, &object_layout, texture_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(DepthBuffer::depth_stencil_state(true)),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            object_layout,
        }
    }

    /// Draw one mesh with its object uniform and color map.
    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        object: &ObjectBinding,
        color_map: &wgpu::BindGroup,
        mesh: &MeshBuffer,
    ) {
        if mesh.index_count == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(1, &object.bind_group, &[]);
        render_pass.set_bind_group(2, color_map, &[]);
        mesh.bind(render_pass);
        mesh.draw(render_pass);
    }
}

/// Full WGSL source: frame declarations plus the mesh stages.
pub fn mesh_shader_source() -> String {
    format!("{FRAME_WGSL}{MESH_SHADER_BODY}")
}

const MESH_SHADER_BODY: &str = r#"
struct Object {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    emissive: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> object: Object;

@group(2) @binding(0)
var color_map: texture_2d<f32>;
@group(2) @binding(1)
var color_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = object.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (object.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

fn attenuation(dist: f32) -> f32 {
    let range = frame.light_position.w;
    if range <= 0.0 {
        return 1.0;
    }
    return pow(clamp(1.0 - dist / range, 0.0, 1.0), frame.light_params.x);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = object.color.rgb * textureSample(color_map, color_sampler, in.uv).rgb;

    let to_light = frame.light_position.xyz - in.world_pos;
    let dist = length(to_light);
    let l = to_light / max(dist, 0.0001);
    let n = normalize(in.normal);
    let irradiance = max(dot(n, l), 0.0) * attenuation(dist);
    let diffuse = base * frame.light_color.rgb * frame.light_color.w * irradiance;

    let emissive = object.emissive.rgb * object.emissive.w;
    let color = apply_fog(diffuse + emissive, in.world_pos);
    return vec4<f32>(color, 1.0);
}
"#;
