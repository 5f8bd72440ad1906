//! Per-frame uniform shared by the mesh and points pipelines (group 0).

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

use crate::camera::PerspectiveCamera;
use crate::viewport::Viewport;

/// `exp2` fog: `factor = 1 - exp(-(density * depth)^2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FogUniform {
    pub color: [f32; 3],
    pub density: f32,
}

impl FogUniform {
    /// Fraction of fog color mixed in at the given view distance.
    pub fn factor(&self, depth: f32) -> f32 {
        let d = self.density * depth;
        1.0 - (-d * d).exp().clamp(0.0, 1.0)
    }
}

/// The single point light of the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLightUniform {
    pub position: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    /// Cutoff distance. Zero means the light never falls off.
    pub range: f32,
    pub decay: f32,
}

impl PointLightUniform {
    /// A light that contributes nothing.
    pub const NONE: Self = Self {
        position: Vec3::ZERO,
        color: [0.0; 3],
        intensity: 0.0,
        range: 0.0,
        decay: 0.0,
    };

    /// Distance attenuation, mirrored by the WGSL `attenuation` function.
    pub fn attenuation(&self, distance: f32) -> f32 {
        if self.range <= 0.0 {
            return 1.0;
        }
        (1.0 - distance / self.range).clamp(0.0, 1.0).powf(self.decay)
    }
}

/// GPU layout of the frame uniform. 160 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = camera position.
    pub camera_pos: [f32; 4],
    /// rgb = fog color, w = density.
    pub fog: [f32; 4],
    /// x = width, y = height (physical pixels), z = pixel ratio.
    pub viewport: [f32; 4],
    /// xyz = light position, w = range.
    pub light_position: [f32; 4],
    /// rgb = light color, w = intensity.
    pub light_color: [f32; 4],
    /// x = decay.
    pub light_params: [f32; 4],
}

impl FrameUniform {
    pub const SIZE: u64 = std::mem::size_of::<FrameUniform>() as u64;

    pub fn new(
        camera: &PerspectiveCamera,
        viewport: &Viewport,
        fog: &FogUniform,
        light: &PointLightUniform,
    ) -> Self {
        let p = camera.position;
        let [fr, fg, fb] = fog.color;
        let [lr, lg, lb] = light.color;
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: [p.x, p.y, p.z, 1.0],
            fog: [fr, fg, fb, fog.density],
            viewport: [
                viewport.width() as f32,
                viewport.height() as f32,
                viewport.pixel_ratio(),
                0.0,
            ],
            light_position: [
                light.position.x,
                light.position.y,
                light.position.z,
                light.range,
            ],
            light_color: [lr, lg, lb, light.intensity],
            light_params: [light.decay, 0.0, 0.0, 0.0],
        }
    }
}

/// WGSL declaration matching [`FrameUniform`], prepended to scene shaders.
pub const FRAME_WGSL: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    fog: vec4<f32>,
    viewport: vec4<f32>,
    light_position: vec4<f32>,
    light_color: vec4<f32>,
    light_params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

fn fog_factor(depth: f32) -> f32 {
    let d = frame.fog.w * depth;
    return 1.0 - clamp(exp(-d * d), 0.0, 1.0);
}

fn apply_fog(color: vec3<f32>, world_pos: vec3<f32>) -> vec3<f32> {
    let depth = distance(world_pos, frame.camera_pos.xyz);
    return mix(color, frame.fog.rgb, fog_factor(depth));
}
"#;

/// Frame uniform buffer plus its bind group.
pub struct FrameBindings {
    pub layout: wgpu::BindGroupLayout,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl FrameBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bind-group-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(FrameUniform::SIZE),
                },
                count: None,
            }],
        });

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame-uniform"),
            contents: bytemuck::bytes_of(&FrameUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            layout,
            buffer,
            bind_group,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniform: &FrameUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniform));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_uniform_size() {
        assert_eq!(FrameUniform::SIZE, 160);
        assert_eq!(FrameUniform::SIZE % 16, 0);
    }

    #[test]
    fn test_fog_factor_grows_with_depth() {
        let fog = FogUniform {
            color: [0.0; 3],
            density: 2.5e-7,
        };
        assert_eq!(fog.factor(0.0), 0.0);
        let near = fog.factor(31_855.0);
        let far = fog.factor(2_000_000.0);
        assert!(near < 0.001, "near = {near}");
        assert!(far > near && far < 1.0);
    }

    #[test]
    fn test_zero_density_disables_fog() {
        let fog = FogUniform {
            color: [1.0; 3],
            density: 0.0,
        };
        assert_eq!(fog.factor(1e9), 0.0);
    }

    #[test]
    fn test_infinite_range_light_does_not_attenuate() {
        let light = PointLightUniform {
            position: Vec3::ZERO,
            color: [1.0; 3],
            intensity: 1.0,
            range: 0.0,
            decay: 2.0,
        };
        assert_eq!(light.attenuation(1e6), 1.0);
    }

    #[test]
    fn test_finite_range_light_falls_off() {
        let light = PointLightUniform {
            range: 100.0,
            decay: 2.0,
            ..PointLightUniform::NONE
        };
        assert!((light.attenuation(50.0) - 0.25).abs() < 1e-6);
        assert_eq!(light.attenuation(150.0), 0.0);
    }

    #[test]
    fn test_uniform_packs_viewport_and_light() {
        let camera = PerspectiveCamera::new(25.0, 800.0 / 600.0, 50.0, 1e7);
        let viewport = Viewport::new(800, 600, 2.0);
        let fog = FogUniform {
            color: [0.0; 3],
            density: 2.5e-7,
        };
        let light = PointLightUniform {
            position: Vec3::new(6371.0, 0.0, 0.0),
            color: [1.0, 0.9, 0.5],
            intensity: 1.0,
            range: 0.0,
            decay: 2.0,
        };
        let uniform = FrameUniform::new(&camera, &viewport, &fog, &light);
        assert_eq!(uniform.viewport[..3], [800.0, 600.0, 2.0]);
        assert_eq!(uniform.light_position, [6371.0, 0.0, 0.0, 0.0]);
        assert_eq!(uniform.light_params[0], 2.0);
        assert_eq!(uniform.fog[3], 2.5e-7);
    }
}
