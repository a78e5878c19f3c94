use orrery_render::{ShaderError, TextureError};
use thiserror::Error;

/// Startup failures while building the scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Texture(#[from] TextureError),
}
