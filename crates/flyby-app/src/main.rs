//! Opens the flyby window: a sun, a layered star field and a model,
//! explored with fly controls through a film-grain filter.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI
//! flags, e.g. `flyby --width 1920 --height 1080 --seed 42`.

use std::process::ExitCode;

use clap::Parser;
use flyby_app::ConfigSource;
use flyby_config::{CliArgs, Config};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let dirs = match flyby_app::resolve_dirs(args.config.clone()) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to resolve config directory: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to create {}: {e}", dirs.config_dir.display());
    }

    let on_disk = Config::load_or_create(&dirs.config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    let mut config = on_disk.clone();
    config.apply_cli_overrides(&args);

    flyby_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    tracing::info!("Config directory: {}", dirs.config_dir.display());

    let source = ConfigSource {
        config_dir: dirs.config_dir,
        on_disk,
    };
    match flyby_app::run(config, Some(source)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
