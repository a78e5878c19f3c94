//! wgpu rendering layer: GPU context, shading-program compilation and linking,
//! texture upload, static meshes, and per-frame command encoding.

pub mod depth;
pub mod gpu;
pub mod mesh;
pub mod pass;
pub mod program;
pub mod shader;
pub mod texture;

pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use mesh::{Mesh, VertexPosition, VertexPositionNormal};
pub use pass::{FrameEncoder, RenderPassBuilder};
pub use program::{ParamHandle, ParamKind, ProgramDescriptor, ShadingProgram, link};
pub use shader::{CompiledStage, ShaderError, StageKind, compile_stage, compile_stage_file};
pub use texture::{
    CUBE_FACE_ORDER, CubeFaces, DecodedImage, DefaultBindings, Texture, TextureError, TextureKind,
    decode_rgba8, linear_repeat_sampler, load_cube_map, load_flat, load_flat_from_path,
};
