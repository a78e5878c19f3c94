//! Per-stage WGSL compilation.
//!
//! Each stage is parsed and validated with naga before any GPU object exists,
//! so a broken shader is reported with the translator's full diagnostic instead
//! of a device validation panic. A [`CompiledStage`] is consumed by
//! [`link`](crate::program::link).

use std::fmt;
use std::path::{Path, PathBuf};

use log::{error, info};
use naga::valid::{Capabilities, ValidationFlags, Validator};
use thiserror::Error;

/// Error types for shader compilation and linking.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{stage} stage '{path}' failed to compile:\n{diagnostic}")]
    Compile {
        stage: StageKind,
        path: String,
        diagnostic: String,
    },

    #[error("program '{program}' failed to link: {diagnostic}")]
    Link { program: String, diagnostic: String },

    #[error("failed to read shader file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The pipeline stage a source file is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    pub(crate) fn naga_stage(self) -> naga::ShaderStage {
        match self {
            StageKind::Vertex => naga::ShaderStage::Vertex,
            StageKind::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub(crate) fn wgpu_stage(self) -> wgpu::ShaderStages {
        match self {
            StageKind::Vertex => wgpu::ShaderStages::VERTEX,
            StageKind::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// A parsed and validated shader stage with exactly one entry point.
#[derive(Debug)]
pub struct CompiledStage {
    kind: StageKind,
    path: String,
    source: String,
    module: naga::Module,
    entry_point: usize,
}

impl CompiledStage {
    #[must_use]
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Source path or label the stage was compiled from.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name of the stage's entry point function.
    #[must_use]
    pub fn entry_point_name(&self) -> &str {
        &self.module.entry_points[self.entry_point].name
    }

    pub(crate) fn entry_point(&self) -> &naga::EntryPoint {
        &self.module.entry_points[self.entry_point]
    }

    pub(crate) fn module(&self) -> &naga::Module {
        &self.module
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }
}

/// Compile one stage from WGSL source text.
///
/// `path` labels the stage in diagnostics. On failure nothing of the stage
/// survives and the diagnostic is logged at error level.
pub fn compile_stage(path: &str, source: &str, kind: StageKind) -> Result<CompiledStage, ShaderError> {
    info!("Compiling {kind} stage '{path}'");

    let fail = |diagnostic: String| {
        error!("{kind} stage '{path}' failed to compile:\n{diagnostic}");
        ShaderError::Compile {
            stage: kind,
            path: path.to_string(),
            diagnostic,
        }
    };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| fail(e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| fail(e.emit_to_string(source)))?;

    let mut matching = module
        .entry_points
        .iter()
        .enumerate()
        .filter(|(_, ep)| ep.stage == kind.naga_stage())
        .map(|(index, _)| index);
    let entry_point = match (matching.next(), matching.next()) {
        (Some(index), None) => index,
        (None, _) => return Err(fail(format!("no @{kind} entry point found"))),
        (Some(_), Some(_)) => {
            return Err(fail(format!("more than one @{kind} entry point found")));
        }
    };

    Ok(CompiledStage {
        kind,
        path: path.to_string(),
        source: source.to_string(),
        module,
        entry_point,
    })
}

/// Read a WGSL file in full and compile it.
pub fn compile_stage_file(path: &Path, kind: StageKind) -> Result<CompiledStage, ShaderError> {
    let source = std::fs::read_to_string(path).map_err(|source| {
        error!("Failed to read shader {}: {source}", path.display());
        ShaderError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?;
    compile_stage(&path.display().to_string(), &source, kind)
}
