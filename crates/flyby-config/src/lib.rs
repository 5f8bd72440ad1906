//! Configuration for the flyby viewer.
//!
//! Settings persist to disk as a RON file next to the platform config
//! directory. Every section defaults sensibly, so partial files load and
//! unknown keys from newer versions are ignored. CLI flags override
//! whatever was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AssetConfig, CameraConfig, Config, ControlsConfig, DebugConfig, FilmConfig, FogConfig,
    RenderConfig, SceneConfig, WindowConfig,
};
pub use error::ConfigError;
