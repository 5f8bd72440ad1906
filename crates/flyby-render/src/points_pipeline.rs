//! Constant-size screen-space points.
//!
//! Each point is expanded into a quad in clip space, so its on-screen size
//! is `size * pixel_ratio` physical pixels regardless of distance.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::buffer::PointsBuffer;
use crate::depth::DepthBuffer;
use crate::frame::FRAME_WGSL;
use crate::mesh_pipeline::{ObjectBinding, object_layout};

/// Per-cloud uniform (group 1). 80 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PointsUniform {
    pub model: [[f32; 4]; 4],
    /// rgb = color (linear), w = point size in CSS pixels.
    pub color_size: [f32; 4],
}

impl PointsUniform {
    pub const SIZE: u64 = std::mem::size_of::<PointsUniform>() as u64;

    pub fn new(model: Mat4, color: [f32; 3], size: f32) -> Self {
        let [r, g, b] = color;
        Self {
            model: model.to_cols_array_2d(),
            color_size: [r, g, b, size],
        }
    }
}

/// Clip-space offset of a quad corner for a point of `size_px` physical
/// pixels, before multiplying by `w`. Mirrors the vertex shader.
pub fn corner_offset(corner: [f32; 2], size_px: f32, viewport: [f32; 2]) -> [f32; 2] {
    [
        corner[0] * size_px * 2.0 / viewport[0],
        corner[1] * size_px * 2.0 / viewport[1],
    ]
}

/// Render pipeline for point clouds. Groups: 0 = frame, 1 = [`PointsUniform`].
pub struct PointsPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub object_layout: wgpu::BindGroupLayout,
}

impl PointsPipeline {
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        sample_count: u32,
        frame_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("points-shader"),
            source: wgpu::ShaderSource::Wgsl(points_shader_source().into()),
        });

        let object_layout = object_layout(device, "points-object-layout", PointsUniform::SIZE);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("points-pipeline-layout"),
            bind_group_layouts: &[frame_layout, &object_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("points-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[PointsBuffer::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
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

    pub fn draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        object: &ObjectBinding,
        points: &PointsBuffer,
    ) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(1, &object.bind_group, &[]);
        points.draw(render_pass);
    }
}

/// Full WGSL source: frame declarations plus the points stages.
pub fn points_shader_source() -> String {
    format!("{FRAME_WGSL}{POINTS_SHADER_BODY}")
}

const POINTS_SHADER_BODY: &str = r#"
struct Cloud {
    model: mat4x4<f32>,
    color_size: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> cloud: Cloud;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32, @location(0) point: vec3<f32>) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>( 0.5, -0.5),
        vec2<f32>( 0.5,  0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>( 0.5,  0.5),
        vec2<f32>(-0.5,  0.5),
    );
    let world = cloud.model * vec4<f32>(point, 1.0);
    let clip = frame.view_proj * world;
    let size_px = cloud.color_size.w * frame.viewport.z;
    let offset = corners[idx] * size_px * 2.0 / frame.viewport.xy;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(clip.xy + offset * clip.w, clip.zw);
    out.world_pos = world.xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(apply_fog(cloud.color_size.rgb, in.world_pos), 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_uniform_size() {
        assert_eq!(PointsUniform::SIZE, 80);
    }

    #[test]
    fn test_corner_offset_spans_requested_pixels() {
        let viewport = [800.0, 600.0];
        let left = corner_offset([-0.5, 0.0], 2.0, viewport);
        let right = corner_offset([0.5, 0.0], 2.0, viewport);
        // NDC spans 2 units across 800 px.
        let width_px = (right[0] - left[0]) * viewport[0] / 2.0;
        assert!((width_px - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_pixel_ratio_scales_point_size() {
        let viewport = [1600.0, 1200.0];
        let single = corner_offset([0.5, 0.5], 1.0, viewport);
        let double = corner_offset([0.5, 0.5], 2.0, viewport);
        assert!((double[0] - 2.0 * single[0]).abs() < 1e-7);
        assert!((double[1] - 2.0 * single[1]).abs() < 1e-7);
    }

    #[test]
    fn test_uniform_packs_size_in_w() {
        let uniform = PointsUniform::new(Mat4::IDENTITY, [0.1, 0.1, 0.1], 2.0);
        assert_eq!(uniform.color_size, [0.1, 0.1, 0.1, 2.0]);
    }

    #[test]
    fn test_shader_source_declares_cloud() {
        let source = points_shader_source();
        assert!(source.contains("var<uniform> cloud: Cloud"));
        assert!(source.contains("fn apply_fog"));
    }
}
