//! The orrery scene: a textured planet orbiting a glowing star inside a
//! cube-mapped skybox, drawn in three ordered passes.

pub mod error;
pub mod geometry;
pub mod params;
pub mod passes;
pub mod renderer;
pub mod transform;

pub use error::SceneError;
pub use passes::{MeshId, PLANET_PASS, PassDescriptor, PassId, SCENE_PASSES, SKYBOX_PASS, STAR_PASS};
pub use renderer::{SceneRenderer, SceneToggles};
