//! Configuration for the orrery viewer.
//!
//! Settings are read from an optional RON file and can be overridden from the
//! command line via clap. Nothing is ever written back to disk.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AssetConfig, CameraConfig, Config, ConfigSource, DebugConfig, PlanetTextures, WindowConfig,
};
pub use error::ConfigError;
