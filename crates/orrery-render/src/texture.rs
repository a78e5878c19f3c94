//! Image textures: decoding, 2D and cube-map upload, and the shared sampler.
//!
//! Decoding happens entirely on the CPU before any GPU call, so a cube map
//! with one unreadable face never creates a texture. Every texture is sampled
//! with the same linear, repeat-wrapped, non-mipmapped sampler.

use std::path::{Path, PathBuf};

/// Cube-map face order used for upload layers: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACE_ORDER: [&str; 6] = ["+X", "-X", "+Y", "-Y", "+Z", "-Z"];

/// Upload format for every image texture. Values pass through unconverted.
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const BYTES_PER_PIXEL: u32 = 4;

/// Errors that can occur while decoding or uploading textures.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// The image file could not be opened or decoded.
    #[error("failed to load texture {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Pixel data length doesn't match the expected size for the given dimensions.
    #[error("texture data size ({actual}) does not match expected ({expected}) for {width}x{height}")]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    /// Width or height is zero.
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    /// A cube face is not square.
    #[error("cube face {face} is not square ({width}x{height})")]
    NonSquareFace {
        face: &'static str,
        width: u32,
        height: u32,
    },

    /// Cube faces have different sizes.
    #[error("cube face {face} is {actual}px but face +X is {expected}px")]
    FaceSizeMismatch {
        face: &'static str,
        expected: u32,
        actual: u32,
    },

    /// A cube face file decoded but cannot be used as that face.
    #[error("invalid cube face {path}: {source}")]
    InvalidFace {
        path: PathBuf,
        #[source]
        source: Box<TextureError>,
    },
}

/// Whether a texture is sampled as a plain 2D image or as a cube map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Flat2D,
    CubeMap,
}

impl TextureKind {
    pub(crate) fn view_dimension(self) -> wgpu::TextureViewDimension {
        match self {
            TextureKind::Flat2D => wgpu::TextureViewDimension::D2,
            TextureKind::CubeMap => wgpu::TextureViewDimension::Cube,
        }
    }
}

/// A GPU texture and its sampling view.
#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub kind: TextureKind,
    /// Width and height in texels (per face for cube maps).
    pub dimensions: (u32, u32),
}

/// A decoded RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decode an image file into tightly packed RGBA8 pixels.
pub fn decode_rgba8(path: &Path) -> Result<DecodedImage, TextureError> {
    let image = image::open(path)
        .map_err(|source| TextureError::Load {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();
    log::debug!("Decoded {} ({width}x{height})", path.display());
    Ok(DecodedImage {
        pixels: image.into_raw(),
        width,
        height,
    })
}

/// Six decoded, square, equally sized faces in [`CUBE_FACE_ORDER`].
#[derive(Debug, Clone)]
pub struct CubeFaces {
    faces: [DecodedImage; 6],
    size: u32,
}

impl CubeFaces {
    /// Validate six faces given in [`CUBE_FACE_ORDER`].
    pub fn from_faces(faces: [DecodedImage; 6]) -> Result<Self, TextureError> {
        let size = faces[0].width;
        for (&face, image) in CUBE_FACE_ORDER.iter().zip(&faces) {
            validate_dimensions(image.width, image.height)?;
            if image.width != image.height {
                return Err(TextureError::NonSquareFace {
                    face,
                    width: image.width,
                    height: image.height,
                });
            }
            if image.width != size {
                return Err(TextureError::FaceSizeMismatch {
                    face,
                    expected: size,
                    actual: image.width,
                });
            }
            validate_data_size(&image.pixels, image.width, image.height)?;
        }
        Ok(Self { faces, size })
    }

    /// Decode six face files. The first failure aborts the whole set, and a
    /// face with the wrong shape is reported with its file path.
    pub fn decode<P: AsRef<Path>>(paths: &[P; 6]) -> Result<Self, TextureError> {
        let [px, nx, py, ny, pz, nz] = paths;
        let faces = [
            decode_rgba8(px.as_ref())?,
            decode_rgba8(nx.as_ref())?,
            decode_rgba8(py.as_ref())?,
            decode_rgba8(ny.as_ref())?,
            decode_rgba8(pz.as_ref())?,
            decode_rgba8(nz.as_ref())?,
        ];
        Self::from_faces(faces).map_err(|source| {
            let face = match source {
                TextureError::NonSquareFace { face, .. }
                | TextureError::FaceSizeMismatch { face, .. } => face,
                _ => return source,
            };
            match CUBE_FACE_ORDER.iter().position(|&name| name == face) {
                Some(index) => TextureError::InvalidFace {
                    path: paths[index].as_ref().to_path_buf(),
                    source: Box::new(source),
                },
                None => source,
            }
        })
    }

    /// Edge length of every face in texels.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[must_use]
    pub fn faces(&self) -> &[DecodedImage; 6] {
        &self.faces
    }
}

/// Upload an RGBA8 pixel buffer as a 2D texture.
pub fn load_flat(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    pixels: &[u8],
    width: u32,
    height: u32,
) -> Result<Texture, TextureError> {
    validate_dimensions(width, height)?;
    validate_data_size(pixels, width, height)?;

    let texture = create_texture(device, label, width, height, 1);
    write_layer(queue, &texture, pixels, width, height, 0);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    log::info!("Created texture '{label}' ({width}x{height})");
    Ok(Texture {
        texture,
        view,
        kind: TextureKind::Flat2D,
        dimensions: (width, height),
    })
}

/// Decode an image file and upload it as a 2D texture.
pub fn load_flat_from_path(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    path: &Path,
) -> Result<Texture, TextureError> {
    let image = decode_rgba8(path)?;
    let label = path.display().to_string();
    load_flat(device, queue, &label, &image.pixels, image.width, image.height)
}

/// Upload six validated faces as one cube-map texture.
pub fn load_cube_map(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    faces: &CubeFaces,
) -> Result<Texture, TextureError> {
    let size = faces.size();
    validate_dimensions(size, size)?;

    let texture = create_texture(device, label, size, size, 6);
    for (layer, face) in faces.faces().iter().enumerate() {
        write_layer(queue, &texture, &face.pixels, size, size, layer as u32);
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some(label),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });

    log::info!("Created cube map '{label}' ({size}x{size} per face)");
    Ok(Texture {
        texture,
        view,
        kind: TextureKind::CubeMap,
        dimensions: (size, size),
    })
}

/// The sampler shared by every texture binding: linear filtering, repeat wrap
/// on all axes, no mipmaps, no anisotropy.
pub fn linear_repeat_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("sampler-linear-repeat"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

/// Resources bound to a program's slots before real textures are attached:
/// the shared sampler plus 1x1 black placeholders.
pub struct DefaultBindings {
    pub sampler: wgpu::Sampler,
    pub flat: Texture,
    pub cube: Texture,
}

impl DefaultBindings {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Self, TextureError> {
        const BLACK: [u8; 4] = [0, 0, 0, 255];
        let flat = load_flat(device, queue, "placeholder-2d", &BLACK, 1, 1)?;
        let black = DecodedImage {
            pixels: BLACK.to_vec(),
            width: 1,
            height: 1,
        };
        let faces = CubeFaces::from_faces(std::array::from_fn(|_| black.clone()))?;
        let cube = load_cube_map(device, queue, "placeholder-cube", &faces)?;
        Ok(Self {
            sampler: linear_repeat_sampler(device),
            flat,
            cube,
        })
    }

    /// Placeholder texture for a slot of the given kind.
    #[must_use]
    pub fn placeholder(&self, kind: TextureKind) -> &Texture {
        match kind {
            TextureKind::Flat2D => &self.flat,
            TextureKind::CubeMap => &self.cube,
        }
    }
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    layers: u32,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: layers,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn write_layer(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    pixels: &[u8],
    width: u32,
    height: u32,
    layer: u32,
) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * BYTES_PER_PIXEL),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

/// Validates that width and height are non-zero.
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    Ok(())
}

/// Validates that RGBA8 pixel data matches the expected size.
pub fn validate_data_size(data: &[u8], width: u32, height: u32) -> Result<(), TextureError> {
    let expected = width as usize * height as usize * BYTES_PER_PIXEL as usize;
    if data.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: data.len(),
            expected,
            width,
            height,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device_queue;

    fn solid(size: u32, rgba: [u8; 4]) -> DecodedImage {
        DecodedImage {
            pixels: rgba.repeat((size * size) as usize),
            width: size,
            height: size,
        }
    }

    fn write_png(dir: &Path, name: &str, size: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbaImage::from_pixel(size, size, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_decode_png_to_rgba8() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "tile.png", 4);
        let image = decode_rgba8(&path).unwrap();
        assert_eq!((image.width, image.height), (4, 4));
        assert_eq!(image.pixels.len(), 64);
        assert_eq!(&image.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        match decode_rgba8(&path) {
            Err(TextureError::Load { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn test_cube_decode_fails_if_any_face_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths: Vec<PathBuf> = (0..6)
            .map(|i| write_png(dir.path(), &format!("face{i}.png"), 2))
            .collect();
        let corrupt = dir.path().join("corrupt.png");
        std::fs::write(&corrupt, b"definitely not a png").unwrap();
        paths[3] = corrupt.clone();
        let paths: [PathBuf; 6] = paths.try_into().unwrap();

        match CubeFaces::decode(&paths) {
            Err(TextureError::Load { path, .. }) => assert_eq!(path, corrupt),
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn test_cube_decode_all_faces() {
        let dir = tempfile::tempdir().unwrap();
        let paths: [PathBuf; 6] =
            std::array::from_fn(|i| write_png(dir.path(), &format!("face{i}.png"), 2));
        let faces = CubeFaces::decode(&paths).unwrap();
        assert_eq!(faces.size(), 2);
    }

    #[test]
    fn test_cube_decode_reports_path_of_misshapen_face() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths: [PathBuf; 6] =
            std::array::from_fn(|i| write_png(dir.path(), &format!("face{i}.png"), 4));
        let small = write_png(dir.path(), "small.png", 2);
        paths[4] = small.clone();

        match CubeFaces::decode(&paths) {
            Err(TextureError::InvalidFace { path, source }) => {
                assert_eq!(path, small);
                assert!(matches!(
                    *source,
                    TextureError::FaceSizeMismatch { face: "+Z", expected: 4, actual: 2 }
                ));
            }
            other => panic!("expected invalid face error, got {other:?}"),
        }
    }

    #[test]
    fn test_cube_decode_reports_path_of_non_square_face() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths: [PathBuf; 6] =
            std::array::from_fn(|i| write_png(dir.path(), &format!("face{i}.png"), 2));
        let wide = dir.path().join("wide.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([0, 0, 0, 255]))
            .save(&wide)
            .unwrap();
        paths[1] = wide.clone();

        let err = CubeFaces::decode(&paths).unwrap_err();
        assert!(err.to_string().contains("wide.png"), "{err}");
        assert!(matches!(err, TextureError::InvalidFace { path, .. } if path == wide));
    }

    #[test]
    fn test_cube_rejects_mismatched_face_sizes() {
        let mut faces: [DecodedImage; 6] = std::array::from_fn(|_| solid(4, [0, 0, 0, 255]));
        faces[5] = solid(2, [0, 0, 0, 255]);
        let result = CubeFaces::from_faces(faces);
        assert!(matches!(
            result,
            Err(TextureError::FaceSizeMismatch { face: "-Z", expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_cube_rejects_non_square_face() {
        let mut faces: [DecodedImage; 6] = std::array::from_fn(|_| solid(2, [0, 0, 0, 255]));
        faces[1] = DecodedImage {
            pixels: vec![0; 2 * 4 * 4],
            width: 2,
            height: 4,
        };
        let result = CubeFaces::from_faces(faces);
        assert!(matches!(result, Err(TextureError::NonSquareFace { face: "-X", .. })));
    }

    #[test]
    fn test_validate_rejects_zero_dimensions() {
        assert!(matches!(
            validate_dimensions(0, 16),
            Err(TextureError::ZeroDimensions { width: 0, height: 16 })
        ));
    }

    #[test]
    fn test_validate_rejects_short_buffer() {
        let result = validate_data_size(&[0u8; 12], 2, 2);
        assert!(matches!(
            result,
            Err(TextureError::DataSizeMismatch { actual: 12, expected: 16, .. })
        ));
    }

    #[test]
    fn test_load_flat_creates_2d_texture() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let image = solid(4, [255, 255, 255, 255]);
        let texture = load_flat(&device, &queue, "white", &image.pixels, 4, 4).unwrap();
        assert_eq!(texture.kind, TextureKind::Flat2D);
        assert_eq!(texture.dimensions, (4, 4));
        assert_eq!(texture.texture.format(), TEXTURE_FORMAT);
        assert_eq!(texture.texture.depth_or_array_layers(), 1);
    }

    #[test]
    fn test_load_flat_rejects_size_mismatch() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let result = load_flat(&device, &queue, "short", &[0u8; 8], 4, 4);
        assert!(matches!(result, Err(TextureError::DataSizeMismatch { .. })));
    }

    #[test]
    fn test_load_cube_map_has_six_layers() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let faces = CubeFaces::from_faces(std::array::from_fn(|i| {
            solid(8, [i as u8 * 40, 0, 0, 255])
        }))
        .unwrap();
        let texture = load_cube_map(&device, &queue, "sky", &faces).unwrap();
        assert_eq!(texture.kind, TextureKind::CubeMap);
        assert_eq!(texture.texture.depth_or_array_layers(), 6);
        assert_eq!(texture.dimensions, (8, 8));
    }

    #[test]
    fn test_default_bindings_placeholders() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let defaults = DefaultBindings::new(&device, &queue).unwrap();
        assert_eq!(defaults.placeholder(TextureKind::Flat2D).kind, TextureKind::Flat2D);
        assert_eq!(defaults.placeholder(TextureKind::CubeMap).kind, TextureKind::CubeMap);
    }
}
