//! Configuration structs with defaults matching the stock scene.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window and viewport settings.
    pub window: WindowConfig,
    /// First-person camera settings.
    pub camera: CameraConfig,
    /// Shader and texture locations.
    pub assets: AssetConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration. Width and height also fix the projection aspect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Viewport width in logical pixels.
    pub width: u32,
    /// Viewport height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Degrees of yaw/pitch per unit of relative pointer motion.
    pub mouse_sensitivity: f32,
    /// Movement speed in world units per second.
    pub move_speed: f32,
    /// Initial camera position.
    pub start_position: [f32; 3],
    /// Initial yaw in degrees. 270 looks down -Z.
    pub start_yaw: f32,
    /// Initial pitch in degrees.
    pub start_pitch: f32,
}

/// Texture paths for the planet's five surface maps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetTextures {
    pub day: PathBuf,
    pub night: PathBuf,
    pub roughness: PathBuf,
    pub clouds: PathBuf,
    pub normal: PathBuf,
}

/// Asset locations. Relative paths are resolved against `root`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Base directory for every other asset path.
    pub root: PathBuf,
    /// Directory holding the `.wgsl` shader sources.
    pub shader_dir: PathBuf,
    /// Planet surface maps.
    pub planet: PlanetTextures,
    /// Texture wrapped around the star sphere.
    pub star_texture: PathBuf,
    /// Skybox faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub skybox_faces: [PathBuf; 6],
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter override (e.g., "debug", "info,wgpu=warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            vsync: true,
            title: "Orrery".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.1,
            move_speed: 1.0,
            start_position: [0.0, 0.0, 3.0],
            start_yaw: 270.0,
            start_pitch: 0.0,
        }
    }
}

impl Default for PlanetTextures {
    fn default() -> Self {
        Self {
            day: PathBuf::from("textures/earth/day16k.png"),
            night: PathBuf::from("textures/earth/night8k.png"),
            roughness: PathBuf::from("textures/earth/roughness.png"),
            clouds: PathBuf::from("textures/earth/clouds8k.png"),
            normal: PathBuf::from("textures/earth/normal8k.png"),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            shader_dir: PathBuf::from("shaders"),
            planet: PlanetTextures::default(),
            star_texture: PathBuf::from("textures/2k_sun.png"),
            skybox_faces: [
                PathBuf::from("textures/skybox/right.png"),
                PathBuf::from("textures/skybox/left.png"),
                PathBuf::from("textures/skybox/top.png"),
                PathBuf::from("textures/skybox/bottom.png"),
                PathBuf::from("textures/skybox/front.png"),
                PathBuf::from("textures/skybox/back.png"),
            ],
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info,wgpu=warn,naga=warn".to_string(),
        }
    }
}

impl WindowConfig {
    /// Width over height of the configured viewport.
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

impl AssetConfig {
    /// Resolves an asset path against the asset root.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Full path of a shader source file.
    #[must_use]
    pub fn shader_path(&self, file_name: &str) -> PathBuf {
        self.root.join(&self.shader_dir).join(file_name)
    }

    /// Skybox face paths resolved against the asset root, in cube-face order.
    #[must_use]
    pub fn resolved_skybox_faces(&self) -> [PathBuf; 6] {
        self.skybox_faces.each_ref().map(|face| self.resolve(face))
    }
}

// --- Load ---

/// Where a loaded [`Config`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Defaults,
}

impl Config {
    /// Parses a config from RON text. Missing sections fall back to defaults.
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(ConfigError::ParseError)
    }

    /// Loads the config at `path`, reporting whether it came from the file or
    /// from defaults. A missing file is not an error.
    pub fn load(path: &Path) -> Result<(Self, ConfigSource), ConfigError> {
        if !path.exists() {
            return Ok((Config::default(), ConfigSource::Defaults));
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron_str(&contents)?;
        Ok((config, ConfigSource::File))
    }

    /// Loads the config at `path`, or returns defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        Self::load(path).map(|(config, _)| config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("height: 720"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.camera.move_speed = 4.0;
        config.assets.root = PathBuf::from("/srv/orrery");
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized = Config::from_ron_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_camera_defaults_match_stock_scene() {
        let camera = CameraConfig::default();
        assert_eq!(camera.mouse_sensitivity, 0.1);
        assert_eq!(camera.move_speed, 1.0);
        assert_eq!(camera.start_position, [0.0, 0.0, 3.0]);
        assert_eq!(camera.start_yaw, 270.0);
        assert_eq!(camera.start_pitch, 0.0);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let config = Config::from_ron_str("(window: (width: 800))").unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.assets, AssetConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        assert!(Config::from_ron_str("(future_setting: true)").is_ok());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result = Config::from_ron_str("{{not valid}}");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("config.ron")).unwrap();
        assert_eq!(config, Config::default());
        assert!(!dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_load_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "// viewer\n(camera: (mouse_sensitivity: 0.25))").unwrap();
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.camera.mouse_sensitivity, 0.25);
    }

    #[test]
    fn test_load_reports_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        let (_, source) = Config::load(&path).unwrap();
        assert_eq!(source, ConfigSource::Defaults);

        std::fs::write(&path, "(window: (width: 640))").unwrap();
        let (config, source) = Config::load(&path).unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.window.width, 640);
    }

    #[test]
    fn test_asset_paths_resolve_against_root() {
        let assets = AssetConfig {
            root: PathBuf::from("/data"),
            ..AssetConfig::default()
        };
        assert_eq!(
            assets.shader_path("skybox.vert.wgsl"),
            PathBuf::from("/data/shaders/skybox.vert.wgsl")
        );
        let faces = assets.resolved_skybox_faces();
        assert_eq!(faces[0], PathBuf::from("/data/textures/skybox/right.png"));
        assert_eq!(faces[5], PathBuf::from("/data/textures/skybox/back.png"));
    }

    #[test]
    fn test_aspect_ratio() {
        let window = WindowConfig::default();
        assert!((window.aspect_ratio() - 1280.0 / 720.0).abs() < 1e-6);
        let degenerate = WindowConfig {
            height: 0,
            ..WindowConfig::default()
        };
        assert!(degenerate.aspect_ratio().is_finite());
    }
}
