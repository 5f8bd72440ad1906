//! Post-processing chain.
//!
//! [`EffectComposer`] runs an ordered list of [`ComposerPass`]es, ping-ponging
//! between two off-screen targets. The last enabled pass writes straight to
//! the output view. The first pass is normally a [`ScenePass`], which draws
//! the scene through a [`SceneDrawer`] into the chain.

use crate::depth::DepthBuffer;
use crate::resizable::Resizable;

/// Draws the renderable world into an already-begun render pass.
pub trait SceneDrawer {
    fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>);
}

/// Everything a pass may touch while recording one frame.
pub struct PassFrame<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub scene: &'a dyn SceneDrawer,
    /// Seconds since the previous frame.
    pub delta: f32,
}

/// One stage of the post-processing chain.
pub trait ComposerPass {
    fn label(&self) -> &str;

    /// Disabled passes are skipped without swapping targets.
    fn enabled(&self) -> bool {
        true
    }

    /// Recreate size-dependent resources.
    fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32);

    /// Record the pass. `input` holds the previous pass's result.
    fn render(&mut self, frame: &mut PassFrame<'_>, input: &RenderTarget, output: &wgpu::TextureView);
}

/// An off-screen color target with a bind group for sampling it.
pub struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
}

impl RenderTarget {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        Self {
            texture,
            view,
            bind_group,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Ordered post-processing chain with two ping-pong targets.
pub struct EffectComposer {
    device: wgpu::Device,
    format: wgpu::TextureFormat,
    target_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    targets: [RenderTarget; 2],
    read_index: usize,
    passes: Vec<Box<dyn ComposerPass>>,
    width: u32,
    height: u32,
}

impl EffectComposer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let target_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("composer-target-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("composer-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let targets = Self::create_targets(device, &target_layout, &sampler, format, width, height);

        Self {
            device: device.clone(),
            format,
            target_layout,
            sampler,
            targets,
            read_index: 0,
            passes: Vec::new(),
            width: width.max(1),
            height: height.max(1),
        }
    }

    fn create_targets(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> [RenderTarget; 2] {
        [
            RenderTarget::new(device, layout, sampler, format, width, height, "composer-target-a"),
            RenderTarget::new(device, layout, sampler, format, width, height, "composer-target-b"),
        ]
    }

    /// Append a pass to the end of the chain.
    pub fn add_pass(&mut self, mut pass: Box<dyn ComposerPass>) {
        pass.set_size(&self.device, self.width, self.height);
        log::debug!("Composer pass added: {}", pass.label());
        self.passes.push(pass);
    }

    /// Layout passes use to sample their input target (texture + sampler).
    pub fn target_layout(&self) -> &wgpu::BindGroupLayout {
        &self.target_layout
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn pass_labels(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.label()).collect()
    }

    /// Dimensions of the internal targets.
    pub fn target_size(&self) -> (u32, u32) {
        self.targets[0].size()
    }

    /// Record every enabled pass into `encoder`, ending on `output`.
    pub fn render(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        scene: &dyn SceneDrawer,
        delta: f32,
    ) {
        let Self {
            device,
            targets,
            read_index,
            passes,
            ..
        } = self;

        let Some(last) = passes.iter().rposition(|p| p.enabled()) else {
            return;
        };

        let mut frame = PassFrame {
            device,
            queue,
            encoder,
            scene,
            delta,
        };

        for (index, pass) in passes.iter_mut().enumerate().take(last + 1) {
            if !pass.enabled() {
                continue;
            }
            let read = &targets[*read_index];
            let write = &targets[1 - *read_index];
            if index == last {
                pass.render(&mut frame, read, output);
            } else {
                pass.render(&mut frame, read, &write.view);
                *read_index = 1 - *read_index;
            }
        }
    }
}

impl Resizable for EffectComposer {
    fn set_size(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.width = width;
        self.height = height;
        self.targets = Self::create_targets(
            &self.device,
            &self.target_layout,
            &self.sampler,
            self.format,
            width,
            height,
        );
        for pass in &mut self.passes {
            pass.set_size(&self.device, width, height);
        }
        log::debug!("Composer resized to {width}x{height}");
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Renders the scene (with MSAA when enabled) into the chain.
pub struct ScenePass {
    format: wgpu::TextureFormat,
    sample_count: u32,
    clear_color: wgpu::Color,
    multisampled: Option<wgpu::TextureView>,
    depth: Option<DepthBuffer>,
}

impl ScenePass {
    /// Sample counts every renderable sRGB format supports.
    pub fn supported_sample_count(requested: u32) -> u32 {
        match requested {
            0 | 1 => 1,
            4 => 4,
            other => {
                log::warn!("MSAA x{other} is not supported, using x4");
                4
            }
        }
    }

    pub fn new(format: wgpu::TextureFormat, sample_count: u32, clear_color: wgpu::Color) -> Self {
        Self {
            format,
            sample_count: Self::supported_sample_count(sample_count),
            clear_color,
            multisampled: None,
            depth: None,
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

impl ComposerPass for ScenePass {
    fn label(&self) -> &str {
        "scene"
    }

    fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        match &mut self.depth {
            Some(depth) => depth.resize(device, width, height),
            None => self.depth = Some(DepthBuffer::new(device, width, height, self.sample_count)),
        }

        self.multisampled = (self.sample_count > 1).then(|| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("scene-msaa"),
                    size: wgpu::Extent3d {
                        width: width.max(1),
                        height: height.max(1),
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: self.sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format: self.format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        });
    }

    fn render(&mut self, frame: &mut PassFrame<'_>, _input: &RenderTarget, output: &wgpu::TextureView) {
        let Some(depth) = &self.depth else {
            log::warn!("Scene pass rendered before it was sized");
            return;
        };

        let (view, resolve_target, store) = match &self.multisampled {
            Some(msaa) => (msaa, Some(output), wgpu::StoreOp::Discard),
            None => (output, None, wgpu::StoreOp::Store),
        };

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        frame.scene.draw(&mut pass);
    }
}

/// Vertex stage shared by full-screen passes: one oversized triangle.
pub const FULLSCREEN_VS_WGSL: &str = r#"
struct FullscreenOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> FullscreenOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: FullscreenOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}
"#;

/// Create a full-screen render pipeline with the given fragment entry point.
pub fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    target_format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn create_test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .ok()?;
            adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .ok()
        })
    }

    struct NoScene;

    impl SceneDrawer for NoScene {
        fn draw(&self, _render_pass: &mut wgpu::RenderPass<'_>) {}
    }

    /// Records the order it ran in and the size it was given.
    struct RecordingPass {
        name: &'static str,
        enabled: bool,
        log: Rc<std::cell::RefCell<Vec<&'static str>>>,
        size: Rc<Cell<(u32, u32)>>,
    }

    impl ComposerPass for RecordingPass {
        fn label(&self) -> &str {
            self.name
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        fn set_size(&mut self, _device: &wgpu::Device, width: u32, height: u32) {
            self.size.set((width, height));
        }

        fn render(&mut self, _frame: &mut PassFrame<'_>, _input: &RenderTarget, _output: &wgpu::TextureView) {
            self.log.borrow_mut().push(self.name);
        }
    }

    #[test]
    fn test_supported_sample_counts() {
        assert_eq!(ScenePass::supported_sample_count(0), 1);
        assert_eq!(ScenePass::supported_sample_count(1), 1);
        assert_eq!(ScenePass::supported_sample_count(4), 4);
        assert_eq!(ScenePass::supported_sample_count(8), 4);
    }

    #[test]
    fn test_passes_run_in_order_and_skip_disabled() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let mut composer = EffectComposer::new(&device, format, 64, 32);
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));
        for (name, enabled) in [("first", true), ("off", false), ("last", true)] {
            composer.add_pass(Box::new(RecordingPass {
                name,
                enabled,
                log: log.clone(),
                size: Rc::new(Cell::new((0, 0))),
            }));
        }
        assert_eq!(composer.pass_labels(), vec!["first", "off", "last"]);

        let output = RenderTarget::new(
            &device,
            composer.target_layout(),
            &composer.sampler,
            format,
            64,
            32,
            "output",
        );
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        composer.render(&queue, &mut encoder, &output.view, &NoScene, 0.016);
        assert_eq!(*log.borrow(), vec!["first", "last"]);
    }

    #[test]
    fn test_set_size_propagates_to_targets_and_passes() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mut composer = EffectComposer::new(&device, wgpu::TextureFormat::Rgba8UnormSrgb, 800, 600);
        let size = Rc::new(Cell::new((0, 0)));
        composer.add_pass(Box::new(RecordingPass {
            name: "recorder",
            enabled: true,
            log: Rc::new(std::cell::RefCell::new(Vec::new())),
            size: size.clone(),
        }));
        assert_eq!(size.get(), (800, 600));

        composer.set_size(1024, 768);
        assert_eq!(composer.size(), (1024, 768));
        assert_eq!(composer.target_size(), (1024, 768));
        assert_eq!(size.get(), (1024, 768));
    }

    #[test]
    fn test_scene_pass_allocates_msaa_on_size() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mut pass = ScenePass::new(wgpu::TextureFormat::Rgba8UnormSrgb, 4, wgpu::Color::BLACK);
        assert!(pass.depth.is_none());
        pass.set_size(&device, 320, 200);
        assert!(pass.multisampled.is_some());
        let depth = pass.depth.as_ref().unwrap();
        assert_eq!((depth.width(), depth.height()), (320, 200));
        assert_eq!(depth.sample_count(), 4);
    }
}
