//! Film grain and scanline post-processing pass.

use bytemuck::{Pod, Zeroable};
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

use crate::composer::{
    ComposerPass, FULLSCREEN_VS_WGSL, PassFrame, RenderTarget, create_fullscreen_pipeline,
};

/// Film effect parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilmParams {
    /// Grain strength, clamped to 0..=1.
    pub noise_intensity: f32,
    pub scanline_intensity: f32,
    pub scanline_count: f32,
    pub grayscale: bool,
}

impl Default for FilmParams {
    fn default() -> Self {
        Self {
            noise_intensity: 0.35,
            scanline_intensity: 0.75,
            scanline_count: 2048.0,
            grayscale: false,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct FilmUniform {
    time: f32,
    noise_intensity: f32,
    scanline_intensity: f32,
    scanline_count: f32,
    grayscale: u32,
    _padding: [u32; 3],
}

impl FilmUniform {
    fn new(params: &FilmParams, time: f32) -> Self {
        Self {
            time,
            noise_intensity: params.noise_intensity,
            scanline_intensity: params.scanline_intensity,
            scanline_count: params.scanline_count,
            grayscale: params.grayscale as u32,
            _padding: [0; 3],
        }
    }
}

const FILM_FS_WGSL: &str = r#"
struct Film {
    time: f32,
    noise_intensity: f32,
    scanline_intensity: f32,
    scanline_count: f32,
    grayscale: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
};

@group(0) @binding(0) var<uniform> film: Film;
@group(1) @binding(0) var input_tex: texture_2d<f32>;
@group(1) @binding(1) var input_sampler: sampler;

fn rand(co: vec2<f32>) -> f32 {
    return fract(sin(dot(co, vec2<f32>(12.9898, 78.233))) * 43758.5453);
}

@fragment
fn fs_film(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let source = textureSample(input_tex, input_sampler, in.uv);
    let c = source.rgb;

    let grain = rand(in.uv + vec2<f32>(film.time));
    var result = c + c * clamp(0.1 + grain, 0.0, 1.0);

    let sc = vec2<f32>(sin(in.uv.y * film.scanline_count), cos(in.uv.y * film.scanline_count));
    result += c * vec3<f32>(sc.x, sc.y, sc.x) * film.scanline_intensity;

    result = c + clamp(film.noise_intensity, 0.0, 1.0) * (result - c);

    if film.grayscale != 0u {
        result = vec3<f32>(dot(result, vec3<f32>(0.3, 0.59, 0.11)));
    }
    return vec4<f32>(result, source.a);
}
"#;

/// CPU mirror of the `fs_film` fragment shader.
pub fn film_grain(color: [f32; 3], uv: [f32; 2], params: &FilmParams, time: f32) -> [f32; 3] {
    let rand = |x: f32, y: f32| {
        let v = (x * 12.9898 + y * 78.233).sin() * 43758.547;
        v - v.floor()
    };
    let grain = rand(uv[0] + time, uv[1] + time);
    let (s, c) = (uv[1] * params.scanline_count).sin_cos();
    let scan = [s, c, s];
    let amount = params.noise_intensity.clamp(0.0, 1.0);

    let mut out = [0.0; 3];
    for i in 0..3 {
        let base = color[i];
        let mut result = base + base * (0.1 + grain).clamp(0.0, 1.0);
        result += base * scan[i] * params.scanline_intensity;
        out[i] = base + amount * (result - base);
    }
    if params.grayscale {
        let luma = out[0] * 0.3 + out[1] * 0.59 + out[2] * 0.11;
        out = [luma; 3];
    }
    out
}

/// Full-screen film grain pass. Its noise seed advances with frame time.
pub struct FilmPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    params: FilmParams,
    time: f32,
    enabled: bool,
}

impl FilmPass {
    pub fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        input_layout: &wgpu::BindGroupLayout,
        params: FilmParams,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("film-shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{FULLSCREEN_VS_WGSL}{FILM_FS_WGSL}").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("film-uniform-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<FilmUniform>() as u64),
                },
                count: None,
            }],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("film-pipeline-layout"),
            bind_group_layouts: &[&uniform_layout, input_layout],
            immediate_size: 0,
        });

        let pipeline =
            create_fullscreen_pipeline(device, &shader, &layout, "fs_film", target_format, "film");

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("film-uniform"),
            contents: bytemuck::bytes_of(&FilmUniform::new(&params, 0.0)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("film-uniform-bg"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            params,
            time: 0.0,
            enabled: true,
        }
    }

    pub fn params(&self) -> &FilmParams {
        &self.params
    }

    pub fn set_params(&mut self, params: FilmParams) {
        self.params = params;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Accumulated time fed to the noise function.
    pub fn time(&self) -> f32 {
        self.time
    }
}

impl ComposerPass for FilmPass {
    fn label(&self) -> &str {
        "film"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_size(&mut self, _device: &wgpu::Device, _width: u32, _height: u32) {}

    fn render(&mut self, frame: &mut PassFrame<'_>, input: &RenderTarget, output: &wgpu::TextureView) {
        self.time += frame.delta.max(0.0);
        frame.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&FilmUniform::new(&self.params, self.time)),
        );

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("film-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, &input.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_film_uniform_is_32_bytes() {
        assert_eq!(std::mem::size_of::<FilmUniform>(), 32);
    }

    #[test]
    fn test_default_params() {
        let params = FilmParams::default();
        assert_eq!(params.noise_intensity, 0.35);
        assert_eq!(params.scanline_intensity, 0.75);
        assert_eq!(params.scanline_count, 2048.0);
        assert!(!params.grayscale);
    }

    #[test]
    fn test_black_stays_black() {
        let out = film_grain([0.0; 3], [0.3, 0.7], &FilmParams::default(), 12.5);
        assert_eq!(out, [0.0; 3]);
    }

    #[test]
    fn test_zero_noise_intensity_is_identity() {
        let params = FilmParams {
            noise_intensity: 0.0,
            ..FilmParams::default()
        };
        let color = [0.2, 0.4, 0.6];
        assert_eq!(film_grain(color, [0.5, 0.5], &params, 3.0), color);
    }

    #[test]
    fn test_noise_intensity_is_clamped() {
        let color = [0.5, 0.5, 0.5];
        let one = FilmParams {
            noise_intensity: 1.0,
            ..FilmParams::default()
        };
        let over = FilmParams {
            noise_intensity: 5.0,
            ..FilmParams::default()
        };
        assert_eq!(
            film_grain(color, [0.1, 0.9], &one, 1.0),
            film_grain(color, [0.1, 0.9], &over, 1.0)
        );
    }

    #[test]
    fn test_grain_varies_with_time() {
        let params = FilmParams {
            scanline_intensity: 0.0,
            ..FilmParams::default()
        };
        let a = film_grain([0.5; 3], [0.25, 0.25], &params, 0.0);
        let b = film_grain([0.5; 3], [0.25, 0.25], &params, 0.37);
        assert_ne!(a, b);
    }

    #[test]
    fn test_grayscale_equalizes_channels() {
        let params = FilmParams {
            grayscale: true,
            ..FilmParams::default()
        };
        let [r, g, b] = film_grain([0.9, 0.1, 0.3], [0.4, 0.6], &params, 2.0);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_grain_only_brightens() {
        let params = FilmParams {
            scanline_intensity: 0.0,
            ..FilmParams::default()
        };
        let out = film_grain([0.4; 3], [0.8, 0.2], &params, 5.0);
        assert!(out.iter().all(|&c| c >= 0.4));
    }
}
