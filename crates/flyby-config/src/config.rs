//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Rendering and post-processing settings.
    pub render: RenderConfig,
    /// Camera projection and placement.
    pub camera: CameraConfig,
    /// Fly controls tuning.
    pub controls: ControlsConfig,
    /// Scene layout.
    pub scene: SceneConfig,
    /// Asset locations.
    pub assets: AssetConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// MSAA sample count for the scene pass (1 or 4).
    pub msaa_samples: u32,
    /// Exponential-squared fog.
    pub fog: FogConfig,
    /// Film grain post-processing.
    pub film: FilmConfig,
}

/// `exp2` fog parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FogConfig {
    /// Linear RGB fog color.
    pub color: [f32; 3],
    /// Fog density. Zero disables fog.
    pub density: f32,
}

/// Film grain pass parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilmConfig {
    /// Skip the film pass entirely and present the scene directly.
    pub enabled: bool,
    /// Noise strength, clamped to 0..=1 by the shader.
    pub noise_intensity: f32,
    /// Scanline strength.
    pub scanline_intensity: f32,
    /// Number of scanlines across the screen.
    pub scanline_count: f32,
    /// Convert the output to grayscale.
    pub grayscale: bool,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Starting distance from the origin along +Z, in scene radii.
    pub distance_in_radii: f32,
}

/// Fly controls configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    /// Translation speed in units per second.
    pub movement_speed: f32,
    /// Rotation speed in radians per second.
    pub roll_speed: f32,
    /// Keep moving forward without input.
    pub auto_forward: bool,
    /// Only look around while a pointer button is held.
    pub drag_to_look: bool,
}

/// Scene layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// World-scale reference radius. Sun size, star field and camera
    /// placement are all derived from it.
    pub radius: f32,
    /// Seed for star placement. `None` picks a fresh seed every run.
    pub seed: Option<u64>,
    /// Point count of the sparse star buffer.
    pub sparse_star_count: usize,
    /// Point count of the dense star buffer.
    pub dense_star_count: usize,
}

/// Asset paths, relative to the working directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// glTF model to place in front of the camera.
    pub model_path: PathBuf,
    /// Color texture applied to every mesh of the model.
    pub texture_path: PathBuf,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Stop after this many frames. Zero runs until the window closes.
    pub max_frames: u64,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Flyby".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            msaa_samples: 4,
            fog: FogConfig::default(),
            film: FilmConfig::default(),
        }
    }
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0],
            density: 0.000_000_25,
        }
    }
}

impl Default for FilmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            noise_intensity: 0.35,
            scanline_intensity: 0.75,
            scanline_count: 2048.0,
            grayscale: false,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 25.0,
            near: 50.0,
            far: 1e7,
            distance_in_radii: 5.0,
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            movement_speed: 100.0,
            roll_speed: std::f32::consts::PI / 24.0,
            auto_forward: false,
            drag_to_look: true,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            radius: 6371.0,
            seed: None,
            sparse_star_count: 250,
            dense_star_count: 1500,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets/models/plane/scene.gltf"),
            texture_path: PathBuf::from("assets/models/plane/textures/internal_ground_ao_texture.jpeg"),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            max_frames: 0,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        let write_error = |source| ConfigError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_error)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty)?;

        std::fs::write(&path, serialized).map_err(write_error)
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
