//! Injected collaborators: mesh simplification, buffer compression, and
//! image decode/resize.
//!
//! The pipeline never hard-codes a particular simplifier or codec backend;
//! it calls through `&dyn Simplifier`/`&dyn BufferCodec`/`&dyn ImageCodec`,
//! the same way an importer might abstract buffer access behind a `Source`
//! trait. Every method is fallible: a failure here degrades the pipeline
//! locally (identity transform, uncompressed view, untouched image bytes)
//! rather than aborting the whole call.

use std::fmt;

use meshopt::{
    encode_index_buffer, encode_vertex_buffer, generate_vertex_remap, optimize_overdraw_in_place,
    optimize_vertex_cache, optimize_vertex_fetch_remap, remap_index_buffer, simplify,
    SimplifyOptions, VertexDataAdapter,
};

/// A capability backend failed; the pipeline recovers locally instead of
/// propagating this as an [`crate::Error`].
#[derive(Debug)]
pub enum CapabilityError {
    /// No simplifier was available, or it refused the input.
    SimplifierUnavailable(String),
    /// Vertex or index buffer compression failed.
    CompressionFailed(String),
    /// An image could not be decoded.
    ImageDecodeFailed(String),
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CapabilityError::SimplifierUnavailable(msg) => write!(f, "simplifier unavailable: {msg}"),
            CapabilityError::CompressionFailed(msg) => write!(f, "buffer compression failed: {msg}"),
            CapabilityError::ImageDecodeFailed(msg) => write!(f, "image decode failed: {msg}"),
        }
    }
}

impl std::error::Error for CapabilityError {}

/// A vertex-index remap: `remap[oldIndex] = newIndex`, alongside the
/// resulting unique vertex count.
#[derive(Clone, Debug)]
pub struct Remap {
    /// `remap[oldIndex]` gives the vertex's slot in the compacted buffer.
    pub remap: Vec<u32>,
    /// Number of distinct vertices after the remap is applied.
    pub unique_count: usize,
}

/// Inputs to a single simplification pass.
pub struct SimplifyParams<'a> {
    /// Triangle list to simplify.
    pub indices: &'a [u32],
    /// Vertex positions, one per vertex referenced by `indices`.
    pub positions: &'a [[f32; 3]],
    /// Optional UV coordinates, same length as `positions`.
    pub uvs: Option<&'a [[f32; 2]]>,
    /// Weight applied to UV distortion in the error metric, per channel.
    pub uv_weight: f32,
    /// Optional per-vertex lock mask; locked vertices must not be collapsed.
    pub vertex_lock: Option<&'a [bool]>,
    /// Desired index count; callers clamp this to a multiple of 3, `>= 3`.
    pub target_index_count: usize,
    /// Maximum allowed error in parameter space.
    pub error_threshold: f32,
    /// Whether open mesh borders should be locked against collapse.
    pub lock_border: bool,
}

/// Outcome of a simplification pass.
pub struct SimplifyResult {
    /// The simplified index buffer, still indexing the original vertices.
    pub indices: Vec<u32>,
    /// The error actually introduced, in the same units as `error_threshold`.
    pub achieved_error: f32,
}

/// Mesh simplification backend: vertex compaction, cache-friendly
/// reordering, and importance-aware edge-collapse simplification.
pub trait Simplifier {
    /// Deduplicates vertices referenced by `indices`/`positions`, returning
    /// a remap from old to new (compacted) vertex indices.
    fn compact(&self, indices: &[u32], positions: &[[f32; 3]]) -> Result<Remap, CapabilityError>;

    /// Reorders `indices` in place for GPU vertex-cache locality (when
    /// `optimize_vertex_cache` is set) and returns a vertex fetch remap.
    fn reorder(
        &self,
        indices: &mut [u32],
        positions: &[[f32; 3]],
        optimize_vertex_cache: bool,
    ) -> Result<Remap, CapabilityError>;

    /// Runs edge-collapse simplification, honoring `vertex_lock` and
    /// `error_threshold`.
    fn simplify(&self, params: &SimplifyParams) -> Result<SimplifyResult, CapabilityError>;
}

/// Buffer compression backend, applied per bufferView at write time.
pub trait BufferCodec {
    /// Encodes a triangle index buffer. `stride` is always 4 (`u32`
    /// indices); implementations that need a narrower on-disk width widen
    /// afterwards.
    fn encode_index_buffer(&self, indices: &[u32], vertex_count: usize) -> Result<Vec<u8>, CapabilityError>;

    /// Encodes an interleaved vertex buffer of `count` elements, each
    /// `stride` bytes wide. `stride` must be divisible by 4 and `<= 256`.
    fn encode_vertex_buffer(&self, data: &[u8], count: usize, stride: usize) -> Result<Vec<u8>, CapabilityError>;
}

/// A decoded raster image.
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed, row-major RGBA8 pixels.
    pub rgba8: Vec<u8>,
}

/// A re-encoded, resized raster image.
pub struct ResizedImage {
    /// Re-encoded bytes, in the same MIME type as the input.
    pub bytes: Vec<u8>,
    /// Width in pixels after resizing.
    pub width: u32,
    /// Height in pixels after resizing.
    pub height: u32,
}

/// Image decode/resize backend used by the texture-space importance
/// analyzer and by `textureScale` downsampling.
pub trait ImageCodec {
    /// Decodes `bytes` (of the given MIME type) to RGBA8 pixels.
    fn decode(&self, bytes: &[u8], mime: &str) -> Result<DecodedImage, CapabilityError>;

    /// Resizes `bytes` by `scale` (in `(0,1]`), re-encoding to the same MIME type.
    fn resize(&self, bytes: &[u8], mime: &str, scale: f32) -> Result<ResizedImage, CapabilityError>;
}

/// Default [`Simplifier`] backed by the `meshopt` bindings to
/// meshoptimizer: vertex-remap generation for compaction, the recommended
/// cache/overdraw/fetch pipeline for reordering, and `simplify` for
/// edge-collapse.
///
/// This backend does not honor `vertex_lock` or UV-weighted error (the
/// bundled meshoptimizer version exposes neither); callers that need
/// seam-aware locking must inject their own `Simplifier`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSimplifier;

impl Simplifier for DefaultSimplifier {
    fn compact(&self, indices: &[u32], positions: &[[f32; 3]]) -> Result<Remap, CapabilityError> {
        if positions.is_empty() {
            return Ok(Remap { remap: Vec::new(), unique_count: 0 });
        }
        let (unique_count, remap) = generate_vertex_remap(indices, positions);
        Ok(Remap { remap, unique_count })
    }

    fn reorder(
        &self,
        indices: &mut [u32],
        positions: &[[f32; 3]],
        optimize_vertex_cache: bool,
    ) -> Result<Remap, CapabilityError> {
        let vertex_count = positions.len();
        if vertex_count == 0 || indices.is_empty() {
            return Ok(Remap { remap: (0..vertex_count as u32).collect(), unique_count: vertex_count });
        }

        if optimize_vertex_cache {
            let cache_optimized = optimize_vertex_cache(indices, vertex_count);
            indices.copy_from_slice(&cache_optimized);

            let position_bytes: &[u8] = bytemuck::cast_slice(positions);
            if let Ok(adapter) = VertexDataAdapter::new(position_bytes, std::mem::size_of::<[f32; 3]>(), 0) {
                optimize_overdraw_in_place(indices, &adapter, 1.05);
            }
        }

        let remap = optimize_vertex_fetch_remap(indices, vertex_count);
        let new_indices = remap_index_buffer(Some(indices), vertex_count, &remap);
        indices.copy_from_slice(&new_indices);
        Ok(Remap { remap, unique_count: vertex_count })
    }

    fn simplify(&self, params: &SimplifyParams) -> Result<SimplifyResult, CapabilityError> {
        if params.positions.is_empty() || params.indices.is_empty() {
            return Ok(SimplifyResult { indices: params.indices.to_vec(), achieved_error: 0.0 });
        }
        let position_bytes: &[u8] = bytemuck::cast_slice(params.positions);
        let adapter = VertexDataAdapter::new(position_bytes, std::mem::size_of::<[f32; 3]>(), 0)
            .map_err(|e| CapabilityError::SimplifierUnavailable(format!("{e:?}")))?;

        let options = if params.lock_border {
            SimplifyOptions::LockBorder
        } else {
            SimplifyOptions::None
        };

        let mut achieved_error = 0.0f32;
        let indices = simplify(
            params.indices,
            &adapter,
            params.target_index_count,
            params.error_threshold,
            options,
            Some(&mut achieved_error),
        );
        Ok(SimplifyResult { indices, achieved_error })
    }
}

/// Default [`BufferCodec`] backed by `meshopt`'s vertex/index buffer
/// encoders (the `EXT_meshopt_compression` bitstream).
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultBufferCodec;

impl BufferCodec for DefaultBufferCodec {
    fn encode_index_buffer(&self, indices: &[u32], vertex_count: usize) -> Result<Vec<u8>, CapabilityError> {
        encode_index_buffer(indices, vertex_count)
            .map_err(|e| CapabilityError::CompressionFailed(format!("{e:?}")))
    }

    fn encode_vertex_buffer(&self, data: &[u8], count: usize, stride: usize) -> Result<Vec<u8>, CapabilityError> {
        if stride == 0 || stride % 4 != 0 || stride > 256 {
            return Err(CapabilityError::CompressionFailed(format!(
                "stride {stride} is not a multiple of 4 in (0, 256]"
            )));
        }
        if data.len() != count * stride {
            return Err(CapabilityError::CompressionFailed(
                "vertex buffer length does not match count * stride".into(),
            ));
        }
        encode_vertex_buffer(data, count, stride)
            .map_err(|e| CapabilityError::CompressionFailed(format!("{e:?}")))
    }
}

/// Default [`ImageCodec`] backed by the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultImageCodec;

impl ImageCodec for DefaultImageCodec {
    fn decode(&self, bytes: &[u8], mime: &str) -> Result<DecodedImage, CapabilityError> {
        let format = mime_to_image_format(mime)
            .ok_or_else(|| CapabilityError::ImageDecodeFailed(format!("unsupported MIME type {mime}")))?;
        let img = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| CapabilityError::ImageDecodeFailed(e.to_string()))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Ok(DecodedImage { width, height, rgba8: img.into_raw() })
    }

    fn resize(&self, bytes: &[u8], mime: &str, scale: f32) -> Result<ResizedImage, CapabilityError> {
        let format = mime_to_image_format(mime)
            .ok_or_else(|| CapabilityError::ImageDecodeFailed(format!("unsupported MIME type {mime}")))?;
        let img = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| CapabilityError::ImageDecodeFailed(e.to_string()))?;
        let (src_w, src_h) = (img.width(), img.height());
        let dst_w = ((src_w as f32 * scale).round() as u32).max(1);
        let dst_h = ((src_h as f32 * scale).round() as u32).max(1);
        let resized = img.resize_exact(dst_w, dst_h, image::imageops::FilterType::Lanczos3);

        let mut bytes_out = std::io::Cursor::new(Vec::new());
        resized
            .write_to(&mut bytes_out, format)
            .map_err(|e| CapabilityError::ImageDecodeFailed(e.to_string()))?;
        Ok(ResizedImage { bytes: bytes_out.into_inner(), width: dst_w, height: dst_h })
    }
}

fn mime_to_image_format(mime: &str) -> Option<image::ImageFormat> {
    match mime {
        "image/png" => Some(image::ImageFormat::Png),
        "image/jpeg" => Some(image::ImageFormat::Jpeg),
        _ => None,
    }
}
