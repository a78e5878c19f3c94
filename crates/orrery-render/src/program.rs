//! Shading programs: two compiled stages linked into a render pipeline, with
//! named parameters resolved against the reflected bind group.
//!
//! Every resource lives in bind group 0. Each `var<uniform>` global gets its
//! own buffer; a uniform of struct type also exposes its members as
//! `global.member`. Texture globals resolve by name, and sampler globals are
//! bound to the shared sampler automatically. Booleans are declared as `u32`.
//!
//! Parameters are resolved once, after linking, into [`ParamHandle`]s. A name
//! that does not resolve yields [`ParamHandle::INVALID`], and every setter
//! ignores invalid handles.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU64;

use glam::{Mat3, Mat4, Vec3};
use log::{debug, error, info, warn};
use naga::{AddressSpace, Binding, ImageClass, ImageDimension, ScalarKind, TypeInner, VectorSize};

use crate::depth::DepthBuffer;
use crate::mesh::Mesh;
use crate::shader::{CompiledStage, ShaderError, StageKind};
use crate::texture::{DefaultBindings, Texture, TextureKind};

/// The value type behind a resolved parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    F32,
    U32,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    Texture(TextureKind),
}

impl ParamKind {
    /// Bytes a value of this kind occupies in a uniform buffer, `None` for
    /// textures.
    #[must_use]
    pub fn byte_size(self) -> Option<u32> {
        match self {
            Self::F32 | Self::U32 => Some(4),
            Self::Vec3 => Some(12),
            Self::Vec4 => Some(16),
            Self::Mat3 => Some(48),
            Self::Mat4 => Some(64),
            Self::Texture(_) => None,
        }
    }

    fn from_type(inner: &TypeInner) -> Option<Self> {
        let f32_scalar = naga::Scalar::F32;
        match *inner {
            TypeInner::Scalar(scalar) if scalar == f32_scalar => Some(Self::F32),
            TypeInner::Scalar(scalar) if scalar == naga::Scalar::U32 => Some(Self::U32),
            TypeInner::Vector {
                size: VectorSize::Tri,
                scalar,
            } if scalar == f32_scalar => Some(Self::Vec3),
            TypeInner::Vector {
                size: VectorSize::Quad,
                scalar,
            } if scalar == f32_scalar => Some(Self::Vec4),
            TypeInner::Matrix {
                columns: VectorSize::Tri,
                rows: VectorSize::Tri,
                scalar,
            } if scalar == f32_scalar => Some(Self::Mat3),
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar == f32_scalar => Some(Self::Mat4),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Uniform {
        buffer: usize,
        offset: u32,
        kind: ParamKind,
    },
    Texture {
        index: usize,
        kind: TextureKind,
    },
}

/// A resolved parameter location, or the invalid sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamHandle(Option<Slot>);

impl ParamHandle {
    pub const INVALID: Self = Self(None);

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// Type of the parameter, `None` for the invalid handle.
    #[must_use]
    pub fn kind(&self) -> Option<ParamKind> {
        match self.0? {
            Slot::Uniform { kind, .. } => Some(kind),
            Slot::Texture { kind, .. } => Some(ParamKind::Texture(kind)),
        }
    }
}

/// Fixed pipeline state for a program.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor<'a> {
    pub label: &'a str,
    pub vertex_layout: wgpu::VertexBufferLayout<'a>,
    pub color_format: wgpu::TextureFormat,
    pub depth_write: bool,
    pub depth_compare: wgpu::CompareFunction,
    pub cull_mode: Option<wgpu::Face>,
}

#[derive(Debug, Clone, PartialEq)]
enum ResourceKind {
    Uniform { size: u32 },
    Texture(TextureKind),
    Sampler,
}

#[derive(Debug, Clone)]
struct ReflectedBinding {
    name: String,
    kind: ResourceKind,
    visibility: wgpu::ShaderStages,
    params: Vec<(String, u32, ParamKind)>,
}

impl ReflectedBinding {
    fn same_declaration(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind && self.params == other.params
    }
}

/// Bindings of both stages after interface checks, keyed by binding index.
#[derive(Debug)]
struct Reflection {
    bindings: BTreeMap<u32, ReflectedBinding>,
}

struct UniformSlot {
    binding: u32,
    buffer: wgpu::Buffer,
    staging: Vec<u8>,
    dirty: bool,
}

struct TextureSlot {
    binding: u32,
    name: String,
    view: wgpu::TextureView,
}

/// A linked, usable shading program.
pub struct ShadingProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    uniforms: Vec<UniformSlot>,
    textures: Vec<TextureSlot>,
    sampler_bindings: Vec<u32>,
    sampler: wgpu::Sampler,
    params: HashMap<String, ParamHandle>,
}

/// Link a vertex and a fragment stage into a program.
///
/// Both stages are consumed whether or not linking succeeds. Fails when a
/// fragment input is not produced by the vertex stage with the same type, when
/// a vertex input has no matching mesh attribute, or when the stages declare
/// one binding differently.
pub fn link(
    device: &wgpu::Device,
    desc: &ProgramDescriptor<'_>,
    defaults: &DefaultBindings,
    vertex: CompiledStage,
    fragment: CompiledStage,
) -> Result<ShadingProgram, ShaderError> {
    info!(
        "Linking program '{}' ({} + {})",
        desc.label,
        vertex.path(),
        fragment.path()
    );

    let reflection = reflect(&vertex, &fragment, &desc.vertex_layout).map_err(|diagnostic| {
        error!("Program '{}' failed to link: {diagnostic}", desc.label);
        ShaderError::Link {
            program: desc.label.to_string(),
            diagnostic,
        }
    })?;

    let program = ShadingProgram::create(device, desc, defaults, &vertex, &fragment, reflection);
    info!(
        "Linked program '{}' ({} parameters)",
        program.label,
        program.params.len()
    );
    Ok(program)
}

fn reflect(
    vertex: &CompiledStage,
    fragment: &CompiledStage,
    layout: &wgpu::VertexBufferLayout<'_>,
) -> Result<Reflection, String> {
    if vertex.kind() != StageKind::Vertex {
        return Err(format!("'{}' is not a vertex stage", vertex.path()));
    }
    if fragment.kind() != StageKind::Fragment {
        return Err(format!("'{}' is not a fragment stage", fragment.path()));
    }

    check_vertex_inputs(vertex, layout)?;
    check_stage_interface(vertex, fragment)?;

    let mut bindings = BTreeMap::new();
    reflect_stage(vertex, &mut bindings)?;
    reflect_stage(fragment, &mut bindings)?;
    Ok(Reflection { bindings })
}

fn collect_locations(
    module: &naga::Module,
    binding: Option<&Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut BTreeMap<u32, TypeInner>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.insert(*location, module.types[ty].inner.clone());
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.binding.as_ref(), member.ty, out);
                }
            }
        }
    }
}

fn stage_inputs(stage: &CompiledStage) -> BTreeMap<u32, TypeInner> {
    let mut locations = BTreeMap::new();
    for argument in &stage.entry_point().function.arguments {
        collect_locations(
            stage.module(),
            argument.binding.as_ref(),
            argument.ty,
            &mut locations,
        );
    }
    locations
}

fn stage_outputs(stage: &CompiledStage) -> BTreeMap<u32, TypeInner> {
    let mut locations = BTreeMap::new();
    if let Some(result) = &stage.entry_point().function.result {
        collect_locations(
            stage.module(),
            result.binding.as_ref(),
            result.ty,
            &mut locations,
        );
    }
    locations
}

fn component_count(inner: &TypeInner) -> Option<u32> {
    match *inner {
        TypeInner::Scalar(_) => Some(1),
        TypeInner::Vector { size, .. } => Some(size as u32),
        _ => None,
    }
}

fn format_component_count(format: wgpu::VertexFormat) -> Option<u32> {
    match format {
        wgpu::VertexFormat::Float32 => Some(1),
        wgpu::VertexFormat::Float32x2 => Some(2),
        wgpu::VertexFormat::Float32x3 => Some(3),
        wgpu::VertexFormat::Float32x4 => Some(4),
        _ => None,
    }
}

fn check_vertex_inputs(
    vertex: &CompiledStage,
    layout: &wgpu::VertexBufferLayout<'_>,
) -> Result<(), String> {
    for (location, inner) in stage_inputs(vertex) {
        let Some(attribute) = layout
            .attributes
            .iter()
            .find(|attribute| attribute.shader_location == location)
        else {
            return Err(format!(
                "vertex input @location({location}) has no matching mesh attribute"
            ));
        };
        if let (Some(expected), Some(supplied)) = (
            component_count(&inner),
            format_component_count(attribute.format),
        ) && expected != supplied
        {
            return Err(format!(
                "vertex input @location({location}) expects {expected} components but the mesh supplies {supplied}"
            ));
        }
    }
    Ok(())
}

fn check_stage_interface(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<(), String> {
    let outputs = stage_outputs(vertex);
    for (location, input) in stage_inputs(fragment) {
        match outputs.get(&location) {
            None => {
                return Err(format!(
                    "fragment input @location({location}) is not written by the vertex stage"
                ));
            }
            Some(output) if *output != input => {
                return Err(format!(
                    "@location({location}) is {output:?} in the vertex stage but {input:?} in the fragment stage"
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn reflect_stage(
    stage: &CompiledStage,
    bindings: &mut BTreeMap<u32, ReflectedBinding>,
) -> Result<(), String> {
    let module = stage.module();
    for (_, global) in module.global_variables.iter() {
        let Some(resource) = &global.binding else {
            continue;
        };
        if resource.group != 0 {
            return Err(format!(
                "'{}' uses bind group {}; only group 0 is supported",
                stage.path(),
                resource.group
            ));
        }

        let name = global
            .name
            .clone()
            .unwrap_or_else(|| format!("binding{}", resource.binding));
        let inner = &module.types[global.ty].inner;

        let (kind, params) = match global.space {
            AddressSpace::Uniform => {
                let size = inner.size(module.to_ctx());
                let mut params = Vec::new();
                if let Some(kind) = ParamKind::from_type(inner) {
                    params.push((name.clone(), 0, kind));
                }
                if let TypeInner::Struct { members, .. } = inner {
                    for member in members {
                        let member_inner = &module.types[member.ty].inner;
                        if let (Some(member_name), Some(kind)) =
                            (&member.name, ParamKind::from_type(member_inner))
                        {
                            params.push((format!("{name}.{member_name}"), member.offset, kind));
                        }
                    }
                }
                (ResourceKind::Uniform { size }, params)
            }
            AddressSpace::Handle => match *inner {
                TypeInner::Image {
                    dim,
                    arrayed: false,
                    class:
                        ImageClass::Sampled {
                            kind: ScalarKind::Float,
                            multi: false,
                        },
                } => {
                    let texture_kind = match dim {
                        ImageDimension::D2 => TextureKind::Flat2D,
                        ImageDimension::Cube => TextureKind::CubeMap,
                        other => {
                            return Err(format!("texture '{name}' has unsupported dimension {other:?}"));
                        }
                    };
                    (
                        ResourceKind::Texture(texture_kind),
                        vec![(name.clone(), 0, ParamKind::Texture(texture_kind))],
                    )
                }
                TypeInner::Sampler { comparison: false } => (ResourceKind::Sampler, Vec::new()),
                _ => return Err(format!("resource '{name}' has an unsupported type")),
            },
            other => {
                return Err(format!(
                    "resource '{name}' is in unsupported address space {other:?}"
                ));
            }
        };

        let reflected = ReflectedBinding {
            name,
            kind,
            visibility: stage.kind().wgpu_stage(),
            params,
        };
        match bindings.entry(resource.binding) {
            Entry::Vacant(slot) => {
                slot.insert(reflected);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if !existing.same_declaration(&reflected) {
                    return Err(format!(
                        "@binding({}) is declared as '{}' and '{}' with different types",
                        resource.binding, existing.name, reflected.name
                    ));
                }
                existing.visibility |= reflected.visibility;
            }
        }
    }
    Ok(())
}

/// Uniform buffers are at least 16 bytes and a multiple of 16.
fn padded_uniform_size(size: u32) -> u64 {
    u64::from(size.max(16).div_ceil(16) * 16)
}

fn create_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    uniforms: &[UniformSlot],
    textures: &[TextureSlot],
    sampler_bindings: &[u32],
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let mut entries: Vec<wgpu::BindGroupEntry> = Vec::new();
    entries.extend(uniforms.iter().map(|uniform| wgpu::BindGroupEntry {
        binding: uniform.binding,
        resource: uniform.buffer.as_entire_binding(),
    }));
    entries.extend(textures.iter().map(|texture| wgpu::BindGroupEntry {
        binding: texture.binding,
        resource: wgpu::BindingResource::TextureView(&texture.view),
    }));
    entries.extend(sampler_bindings.iter().map(|&binding| wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::Sampler(sampler),
    }));

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{label}-bind-group")),
        layout,
        entries: &entries,
    })
}

impl ShadingProgram {
    fn create(
        device: &wgpu::Device,
        desc: &ProgramDescriptor<'_>,
        defaults: &DefaultBindings,
        vertex: &CompiledStage,
        fragment: &CompiledStage,
        reflection: Reflection,
    ) -> Self {
        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = reflection
            .bindings
            .iter()
            .map(|(&binding, reflected)| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: reflected.visibility,
                ty: match reflected.kind {
                    ResourceKind::Uniform { size } => wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(u64::from(size)),
                    },
                    ResourceKind::Texture(kind) => wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: kind.view_dimension(),
                        multisampled: false,
                    },
                    ResourceKind::Sampler => {
                        wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                    }
                },
                count: None,
            })
            .collect();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{}-bind-group-layout", desc.label)),
            entries: &layout_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{}-pipeline-layout", desc.label)),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(vertex.path()),
            source: wgpu::ShaderSource::Wgsl(vertex.source().into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(fragment.path()),
            source: wgpu::ShaderSource::Wgsl(fragment.source().into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(vertex.entry_point_name()),
                buffers: std::slice::from_ref(&desc.vertex_layout),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: desc.cull_mode,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: desc.depth_write,
                depth_compare: desc.depth_compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(fragment.entry_point_name()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: desc.color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let mut uniforms = Vec::new();
        let mut textures = Vec::new();
        let mut sampler_bindings = Vec::new();
        let mut params = HashMap::new();

        for (binding, reflected) in reflection.bindings {
            match reflected.kind {
                ResourceKind::Uniform { size } => {
                    let padded = padded_uniform_size(size);
                    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(&format!("{}-{}", desc.label, reflected.name)),
                        size: padded,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    });
                    let index = uniforms.len();
                    for (name, offset, kind) in reflected.params {
                        params.insert(
                            name,
                            ParamHandle(Some(Slot::Uniform {
                                buffer: index,
                                offset,
                                kind,
                            })),
                        );
                    }
                    uniforms.push(UniformSlot {
                        binding,
                        buffer,
                        staging: vec![0; padded as usize],
                        dirty: false,
                    });
                }
                ResourceKind::Texture(kind) => {
                    let index = textures.len();
                    params.insert(
                        reflected.name.clone(),
                        ParamHandle(Some(Slot::Texture { index, kind })),
                    );
                    textures.push(TextureSlot {
                        binding,
                        name: reflected.name,
                        view: defaults.placeholder(kind).view.clone(),
                    });
                }
                ResourceKind::Sampler => sampler_bindings.push(binding),
            }
        }

        let sampler = defaults.sampler.clone();
        let bind_group = create_bind_group(
            device,
            desc.label,
            &bind_group_layout,
            &uniforms,
            &textures,
            &sampler_bindings,
            &sampler,
        );

        Self {
            label: desc.label.to_string(),
            pipeline,
            bind_group_layout,
            bind_group,
            uniforms,
            textures,
            sampler_bindings,
            sampler,
            params,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Resolve a parameter by name. Unknown names yield [`ParamHandle::INVALID`].
    #[must_use]
    pub fn param(&self, name: &str) -> ParamHandle {
        self.params
            .get(name)
            .copied()
            .unwrap_or(ParamHandle::INVALID)
    }

    /// Every resolvable parameter name, in no particular order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    fn write_uniform(&mut self, handle: ParamHandle, kind: ParamKind, bytes: &[u8]) {
        let Some(Slot::Uniform {
            buffer,
            offset,
            kind: declared,
        }) = handle.0
        else {
            return;
        };
        if declared != kind {
            debug!(
                "Program '{}': ignoring {kind:?} write to a {declared:?} parameter",
                self.label
            );
            return;
        }
        let Some(uniform) = self.uniforms.get_mut(buffer) else {
            return;
        };
        let start = offset as usize;
        if let Some(target) = uniform.staging.get_mut(start..start + bytes.len()) {
            target.copy_from_slice(bytes);
            uniform.dirty = true;
        }
    }

    pub fn set_f32(&mut self, handle: ParamHandle, value: f32) {
        self.write_uniform(handle, ParamKind::F32, bytemuck::bytes_of(&value));
    }

    /// Booleans are stored as `u32` 0 or 1.
    pub fn set_bool(&mut self, handle: ParamHandle, value: bool) {
        let value = u32::from(value);
        self.write_uniform(handle, ParamKind::U32, bytemuck::bytes_of(&value));
    }

    pub fn set_vec3(&mut self, handle: ParamHandle, value: Vec3) {
        self.write_uniform(handle, ParamKind::Vec3, bytemuck::cast_slice(&value.to_array()));
    }

    /// Columns are padded to 16 bytes to match the WGSL `mat3x3<f32>` layout.
    pub fn set_mat3(&mut self, handle: ParamHandle, value: &Mat3) {
        let mut padded = [0.0f32; 12];
        for (column, chunk) in value.to_cols_array_2d().iter().zip(padded.chunks_exact_mut(4)) {
            chunk[..3].copy_from_slice(column);
        }
        self.write_uniform(handle, ParamKind::Mat3, bytemuck::cast_slice(&padded));
    }

    pub fn set_mat4(&mut self, handle: ParamHandle, value: &Mat4) {
        self.write_uniform(handle, ParamKind::Mat4, bytemuck::cast_slice(&value.to_cols_array()));
    }

    /// Attach a texture to a texture parameter. A texture of the wrong kind is
    /// rejected with a warning and the slot keeps its previous contents.
    pub fn bind_texture(&mut self, device: &wgpu::Device, handle: ParamHandle, texture: &Texture) {
        let Some(Slot::Texture { index, kind }) = handle.0 else {
            return;
        };
        let Some(slot) = self.textures.get_mut(index) else {
            return;
        };
        if kind != texture.kind {
            warn!(
                "Program '{}': texture '{}' expects {kind:?} but got {:?}",
                self.label, slot.name, texture.kind
            );
            return;
        }
        slot.view = texture.view.clone();
        self.bind_group = create_bind_group(
            device,
            &self.label,
            &self.bind_group_layout,
            &self.uniforms,
            &self.textures,
            &self.sampler_bindings,
            &self.sampler,
        );
    }

    /// The CPU-side bytes last written to a uniform parameter.
    #[must_use]
    pub fn staged_bytes(&self, handle: ParamHandle) -> Option<&[u8]> {
        let Some(Slot::Uniform { buffer, offset, kind }) = handle.0 else {
            return None;
        };
        let start = offset as usize;
        let len = kind.byte_size()? as usize;
        self.uniforms.get(buffer)?.staging.get(start..start + len)
    }

    /// Upload every uniform buffer written since the last flush.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        for uniform in self.uniforms.iter_mut().filter(|uniform| uniform.dirty) {
            queue.write_buffer(&uniform.buffer, 0, &uniform.staging);
            uniform.dirty = false;
        }
    }

    /// Record a draw of `mesh` with this program's pipeline and bindings.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, mesh: &Mesh) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        mesh.draw(render_pass);
    }
}
