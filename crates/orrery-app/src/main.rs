//! The `orrery` binary: load configuration, install logging, run the viewer.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use orrery_config::{CliArgs, Config, ConfigSource};
use tracing::{error, info};

const DEFAULT_CONFIG_FILE: &str = "config.ron";

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let (mut config, source) = match Config::load(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", config_path.display());
            return ExitCode::from(1);
        }
    };
    config.apply_cli_overrides(&args);

    let log_dir = dirs::data_local_dir().map(|dir| dir.join("orrery").join("logs"));
    orrery_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));
    match source {
        ConfigSource::File => info!("Loaded config from {}", config_path.display()),
        ConfigSource::Defaults => info!("No config at {}, using defaults", config_path.display()),
    }
    info!(
        "Orrery starting: {}x{}, assets at {}",
        config.window.width,
        config.window.height,
        config.assets.root.display()
    );

    match orrery_app::run(config) {
        Ok(()) => {
            info!("Orrery exited normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Orrery failed: {e}");
            ExitCode::from(1)
        }
    }
}
