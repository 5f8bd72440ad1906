//! Window creation and event handling via winit.
//!
//! [`FlybyApp`] implements winit's [`ApplicationHandler`]: it creates the
//! window and GPU state on resume, routes input to the fly controls and
//! ticks the [`RenderLoop`] on every redraw request.

use std::path::PathBuf;
use std::sync::Arc;

use flyby_config::Config;
use flyby_controls::RawKeyEvent;
use flyby_render::{SurfaceError, Viewport};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::context::SceneContext;
use crate::error::AppError;
use crate::render_loop::{FrameStep, LoopState, RenderLoop};
use crate::renderer::FrameRenderer;
use crate::resize::handle_resize;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attributes = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(LogicalSize::new(
            f64::from(config.window.width),
            f64::from(config.window.height),
        ));
    if config.window.fullscreen {
        attributes.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attributes
    }
}

/// One frame's view of the GPU and scene state.
struct Frame<'a> {
    renderer: &'a mut FrameRenderer,
    scene: &'a mut SceneContext,
}

impl FrameStep for Frame<'_> {
    fn update_controls(&mut self, delta: f32) {
        let SceneContext {
            controls, camera, ..
        } = &mut *self.scene;
        controls.update(delta, camera);
    }

    fn draw(&mut self, delta: f32) -> Result<(), SurfaceError> {
        self.renderer.render(self.scene, delta)
    }
}

/// `config.ron` as last read from disk, re-read when the window regains
/// focus.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub config_dir: PathBuf,
    pub on_disk: Config,
}

/// Viewer state owned by the event loop.
pub struct FlybyApp {
    /// On-disk config with CLI overrides applied.
    config: Config,
    source: Option<ConfigSource>,
    window: Option<Arc<Window>>,
    renderer: Option<FrameRenderer>,
    scene: Option<SceneContext>,
    render_loop: RenderLoop,
    error: Option<AppError>,
}

impl FlybyApp {
    pub fn new(config: Config) -> Self {
        let render_loop = RenderLoop::new(config.debug.max_frames);
        Self {
            config,
            source: None,
            window: None,
            renderer: None,
            scene: None,
            render_loop,
            error: None,
        }
    }

    /// Reload `config.ron` from `source` on focus.
    pub fn with_config_source(mut self, source: ConfigSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Re-read `config.ron` and apply the sections that can change live.
    /// Returns whether anything changed.
    fn reload_config(&mut self) -> bool {
        let Some(source) = &mut self.source else {
            return false;
        };
        let fresh = match source.on_disk.reload(&source.config_dir) {
            Ok(Some(fresh)) => fresh,
            Ok(None) => return false,
            Err(e) => {
                warn!("Config not reloaded: {e}");
                return false;
            }
        };
        // CLI flags never touch these sections, so the file wins.
        self.config.controls = fresh.controls.clone();
        self.config.render.fog = fresh.render.fog.clone();
        if let Some(scene) = &mut self.scene {
            scene.apply_live_config(&self.config);
        }
        info!("Applied fog and controls from reloaded config");
        source.on_disk = fresh;
        true
    }

    /// Consume the app, returning the error that stopped it, if any.
    pub fn into_result(self) -> Result<(), AppError> {
        self.error.map_or(Ok(()), Err)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: AppError) {
        error!("{e}");
        self.render_loop.token().cancel();
        self.error = Some(e);
        event_loop.exit();
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (Some(renderer), Some(scene)) = (&mut self.renderer, &mut self.scene) else {
            return;
        };
        handle_resize(
            &mut scene.camera,
            &mut scene.viewport,
            &mut renderer.targets_mut(),
            width,
            height,
        );
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(renderer), Some(scene)) =
            (&self.window, &mut self.renderer, &mut self.scene)
        else {
            return;
        };

        scene.poll_model();

        let mut frame = Frame { renderer, scene };
        match self.render_loop.tick(&mut frame) {
            Ok(LoopState::Running) => window.request_redraw(),
            Ok(LoopState::Stopped) => event_loop.exit(),
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e.into()),
        }
    }
}

impl ApplicationHandler for FlybyApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let renderer = match FrameRenderer::new(window.clone(), &self.config) {
            Ok(renderer) => renderer,
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let size = window.inner_size();
        let scale_factor = window.scale_factor();
        info!(
            "Window created: {}x{} (scale: {:.2})",
            size.width, size.height, scale_factor
        );
        let viewport = Viewport::new(size.width, size.height, scale_factor as f32);

        self.scene = Some(SceneContext::build(viewport, &self.config));
        self.renderer = Some(renderer);
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.render_loop.token().cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => self.resize(new_size.width, new_size.height),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(scene) = &mut self.scene {
                    scene.viewport.set_pixel_ratio(scale_factor as f32);
                }
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.resize(size.width, size.height);
                }
            }
            WindowEvent::Focused(false) => {
                if let Some(scene) = &mut self.scene {
                    scene.controls.reset();
                }
            }
            WindowEvent::Focused(true) => {
                self.reload_config();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(scene) = &mut self.scene {
                    scene.controls.on_key(RawKeyEvent::from(&event));
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(scene) = &mut self.scene {
                    scene.controls.on_pointer_button(button, state);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(scene) = &mut self.scene {
                    let (width, height) = (scene.viewport.width(), scene.viewport.height());
                    scene
                        .controls
                        .on_pointer_move(position.x, position.y, width, height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        info!(
            "Exiting after {} frames ({:.1}s)",
            self.render_loop.frame_count(),
            self.render_loop.total_time()
        );
        // Drops any in-flight model load without waiting for it.
        self.scene = None;
        self.renderer = None;
    }
}

/// Create the event loop and run the viewer until the window closes.
///
/// With a `source`, edits to `config.ron` are picked up when the window
/// regains focus.
///
/// # Errors
///
/// Returns an [`AppError`] if the event loop, window or GPU cannot be
/// created, or if rendering stops on an unrecoverable surface error.
pub fn run(config: Config, source: Option<ConfigSource>) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = FlybyApp::new(config);
    if let Some(source) = source {
        app = app.with_config_source(source);
    }
    event_loop.run_app(&mut app)?;
    app.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_attributes_from_config() {
        let mut config = Config::default();
        config.window.title = "Test".to_string();
        let attributes = window_attributes_from_config(&config);
        assert_eq!(attributes.title, "Test");
        assert!(attributes.fullscreen.is_none());

        config.window.fullscreen = true;
        let attributes = window_attributes_from_config(&config);
        assert!(matches!(attributes.fullscreen, Some(Fullscreen::Borderless(None))));
    }

    #[test]
    fn test_focus_reload_applies_file_edits() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = Config::load_or_create(dir.path()).unwrap();
        let mut config = on_disk.clone();
        config.window.width = 1920;
        let mut app = FlybyApp::new(config).with_config_source(ConfigSource {
            config_dir: dir.path().to_path_buf(),
            on_disk: on_disk.clone(),
        });
        assert!(!app.reload_config());

        let mut edited = on_disk;
        edited.controls.movement_speed = 42.0;
        edited.render.fog.density = 0.0;
        edited.save(dir.path()).unwrap();

        assert!(app.reload_config());
        assert_eq!(app.config.controls.movement_speed, 42.0);
        assert_eq!(app.config.render.fog.density, 0.0);
        assert_eq!(app.config.window.width, 1920);
        assert!(!app.reload_config());
    }

    #[test]
    fn test_focus_reload_keeps_config_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = Config::load_or_create(dir.path()).unwrap();
        let mut app = FlybyApp::new(on_disk.clone()).with_config_source(ConfigSource {
            config_dir: dir.path().to_path_buf(),
            on_disk,
        });
        std::fs::write(dir.path().join("config.ron"), "(controls: (").unwrap();
        assert!(!app.reload_config());
        assert_eq!(app.config, Config::default());
    }

    #[test]
    fn test_new_app_has_no_error() {
        let app = FlybyApp::new(Config::default());
        assert!(app.window.is_none());
        assert_eq!(app.render_loop.frame_count(), 0);
        assert!(app.into_result().is_ok());
    }
}
