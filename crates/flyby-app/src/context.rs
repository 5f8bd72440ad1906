//! CPU-side scene setup: camera, scene graph, controls and the pending
//! model load.

use std::f32::consts::FRAC_PI_4;
use std::time::Duration;

use flyby_config::Config;
use flyby_controls::FlyControls;
use flyby_render::{PerspectiveCamera, Viewport};
use flyby_scene::{
    AssetError, Fog, LoadedModel, ModelLoader, ModelRequest, PendingModel, Scene, StarField,
    Transform, build_sun,
};
use glam::{Quat, Vec3};

/// Where the model sits relative to the starting camera position.
pub const MODEL_OFFSET: Vec3 = Vec3::new(-50.0, 0.0, -200.0);
/// Uniform scale applied to the loaded model.
pub const MODEL_SCALE: f32 = 0.1;

/// Everything the render loop mutates between frames.
pub struct SceneContext {
    pub camera: PerspectiveCamera,
    pub scene: Scene,
    pub controls: FlyControls,
    pub viewport: Viewport,
    pending_model: Option<PendingModel>,
    model_placement: Transform,
    seed: u64,
}

impl SceneContext {
    /// Build the camera, sun, star field and controls, and start the model
    /// load in the background.
    pub fn build(viewport: Viewport, config: &Config) -> Self {
        let radius = config.scene.radius;

        let mut camera = PerspectiveCamera::new(
            config.camera.fov_degrees,
            viewport.aspect(),
            config.camera.near,
            config.camera.far,
        );
        camera.position = Vec3::new(0.0, 0.0, radius * config.camera.distance_in_radii);

        let mut scene = Scene::new(Fog {
            color: config.render.fog.color,
            density: config.render.fog.density,
        });
        scene.add(build_sun(radius, camera.position));

        let seed = config.scene.seed.unwrap_or_else(rand::random);
        let stars = StarField::generate(
            radius,
            [config.scene.sparse_star_count, config.scene.dense_star_count],
            seed,
        );
        for node in stars.nodes() {
            scene.add(node);
        }
        tracing::info!(
            seed,
            layers = stars.layers.len(),
            "Star field generated"
        );

        let model_placement = Transform {
            position: camera.position + MODEL_OFFSET,
            rotation: Quat::from_rotation_z(-FRAC_PI_4),
            scale: Vec3::splat(MODEL_SCALE),
        };
        let pending_model = model_request(config).map(ModelLoader::spawn);
        if pending_model.is_none() {
            tracing::info!("No model configured");
        }

        Self {
            camera,
            scene,
            controls: FlyControls::from_config(&config.controls),
            viewport,
            pending_model,
            model_placement,
            seed,
        }
    }

    /// Append the model once its background load finishes. Returns whether
    /// a node was added this call.
    pub fn poll_model(&mut self) -> bool {
        let outcome = self.pending_model.as_mut().and_then(PendingModel::poll);
        self.complete(outcome)
    }

    /// Like [`poll_model`](Self::poll_model) but blocks up to `timeout`.
    pub fn wait_for_model(&mut self, timeout: Duration) -> bool {
        let outcome = self
            .pending_model
            .as_mut()
            .and_then(|pending| pending.wait(timeout));
        self.complete(outcome)
    }

    fn complete(&mut self, outcome: Option<Result<LoadedModel, AssetError>>) -> bool {
        let Some(outcome) = outcome else {
            return false;
        };
        self.pending_model = None;
        self.scene.complete_model_load(outcome, self.model_placement)
    }

    pub fn is_model_pending(&self) -> bool {
        self.pending_model.is_some()
    }

    pub fn model_placement(&self) -> Transform {
        self.model_placement
    }

    /// Apply the settings that take effect without rebuilding the scene:
    /// fog and fly controls. Held keys and pointer drags are dropped.
    pub fn apply_live_config(&mut self, config: &Config) {
        self.scene.fog = Fog {
            color: config.render.fog.color,
            density: config.render.fog.density,
        };
        self.controls = FlyControls::from_config(&config.controls);
    }

    /// Seed the star field was generated from.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

fn model_request(config: &Config) -> Option<ModelRequest> {
    let assets = &config.assets;
    if assets.model_path.as_os_str().is_empty() {
        return None;
    }
    let texture_path =
        (!assets.texture_path.as_os_str().is_empty()).then(|| assets.texture_path.clone());
    Some(ModelRequest {
        model_path: assets.model_path.clone(),
        texture_path,
    })
}
