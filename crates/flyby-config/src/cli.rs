//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Flyby command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "flyby", about = "Fly through a decorative space scene")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in fullscreen.
    #[arg(long)]
    pub fullscreen: Option<bool>,

    /// glTF model to load.
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Texture applied to the model.
    #[arg(long)]
    pub texture: Option<PathBuf>,

    /// Star placement seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// MSAA sample count (1 or 4).
    #[arg(long)]
    pub msaa: Option<u32>,

    /// Disable the film grain pass.
    #[arg(long)]
    pub no_film: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Exit after rendering this many frames.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(fs) = args.fullscreen {
            self.window.fullscreen = fs;
        }
        if let Some(ref model) = args.model {
            self.assets.model_path = model.clone();
        }
        if let Some(ref texture) = args.texture {
            self.assets.texture_path = texture.clone();
        }
        if args.seed.is_some() {
            self.scene.seed = args.seed;
        }
        if let Some(msaa) = args.msaa {
            self.render.msaa_samples = msaa;
        }
        if args.no_film {
            self.render.film.enabled = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(frames) = args.frames {
            self.debug.max_frames = frames;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(800),
            seed: Some(7),
            model: Some(PathBuf::from("x.glb")),
            no_film: true,
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.scene.seed, Some(7));
        assert_eq!(config.assets.model_path, PathBuf::from("x.glb"));
        assert!(!config.render.film.enabled);
        // Non-overridden fields retain defaults
        assert_eq!(config.window.height, 720);
        assert_eq!(config.render.msaa_samples, 4);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["flyby", "--width", "1024", "--frames", "3", "--no-film"]);
        assert_eq!(args.width, Some(1024));
        assert_eq!(args.frames, Some(3));
        assert!(args.no_film);
    }
}
