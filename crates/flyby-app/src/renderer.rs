//! GPU half of the viewer: surface, scene renderer and post-processing chain.

use std::sync::Arc;

use flyby_config::{Config, FilmConfig};
use flyby_render::{
    EffectComposer, FilmParams, FilmPass, RenderContext, RenderContextError, Resizable,
    ScenePass, SurfaceError, init_render_context_blocking,
};
use flyby_scene::SceneRenderer;
use winit::window::Window;

use crate::context::SceneContext;

/// Owns everything needed to turn a [`SceneContext`] into pixels.
pub struct FrameRenderer {
    pub context: RenderContext,
    pub composer: EffectComposer,
    pub scene_renderer: SceneRenderer,
}

impl FrameRenderer {
    /// Initialize the GPU for `window` and build the pass chain.
    ///
    /// # Errors
    ///
    /// Returns [`RenderContextError`] if no adapter, device or surface can
    /// be created.
    pub fn new(window: Arc<Window>, config: &Config) -> Result<Self, RenderContextError> {
        let context = init_render_context_blocking(window, config.window.vsync)?;
        let format = context.surface_format;
        let (width, height) = context.surface_size();
        let sample_count = ScenePass::supported_sample_count(config.render.msaa_samples);

        let mut composer = EffectComposer::new(&context.device, format, width, height);
        composer.add_pass(Box::new(ScenePass::new(
            format,
            sample_count,
            wgpu::Color::BLACK,
        )));
        if config.render.film.enabled {
            let film = FilmPass::new(
                &context.device,
                format,
                composer.target_layout(),
                film_params(&config.render.film),
            );
            composer.add_pass(Box::new(film));
        }

        let scene_renderer =
            SceneRenderer::new(&context.device, &context.queue, format, sample_count);

        tracing::info!(
            "Renderer ready: {width}x{height}, MSAA x{sample_count}, passes {:?}",
            composer.pass_labels()
        );

        Ok(Self {
            context,
            composer,
            scene_renderer,
        })
    }

    /// Upload scene changes and draw one frame to the window.
    pub fn render(&mut self, scene: &SceneContext, delta: f32) -> Result<(), SurfaceError> {
        let device = &self.context.device;
        let queue = &self.context.queue;

        self.scene_renderer
            .prepare(device, queue, &scene.scene, &scene.camera, &scene.viewport);

        let frame = self.context.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("flyby-frame-encoder"),
        });

        self.composer
            .render(queue, &mut encoder, &view, &self.scene_renderer, delta);

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// The surface and the composer, both sized to the viewport.
    pub fn targets_mut(&mut self) -> [&mut dyn Resizable; 2] {
        [&mut self.context, &mut self.composer]
    }
}

pub fn film_params(config: &FilmConfig) -> FilmParams {
    FilmParams {
        noise_intensity: config.noise_intensity,
        scanline_intensity: config.scanline_intensity,
        scanline_count: config.scanline_count,
        grayscale: config.grayscale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_film_params() {
        let params = film_params(&FilmConfig::default());
        assert_eq!(params, FilmParams::default());
        assert_eq!(params.noise_intensity, 0.35);
        assert_eq!(params.scanline_intensity, 0.75);
        assert_eq!(params.scanline_count, 2048.0);
        assert!(!params.grayscale);
    }
}
