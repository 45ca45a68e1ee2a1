//! The binary glTF container codec: header/chunk framing plus the
//! accessor/bufferView addressing model layered on top of it.

use std::borrow::Cow;
use std::fmt;

use crate::binary;
use gltf_json as json;
use json::accessor::{Accessor, ComponentType, Type};
use json::buffer;
use json::mesh::{Mesh, Primitive, Semantic};
use json::validation::Checked;
use json::Index;

/// A parsed binary glTF asset: the JSON document plus its single binary blob.
///
/// Mirrors `Glb` but with the JSON chunk already deserialized into
/// [`json::Root`] and the BIN chunk normalized to an owned byte vector (an
/// input with no BIN chunk yields an empty one).
#[derive(Clone, Debug)]
pub struct Asset {
    /// The deserialized JSON document.
    pub root: json::Root,
    /// The binary payload every bufferView ultimately addresses into.
    pub bin: Vec<u8>,
}

/// Aggregate counts over a parsed asset, as reported by [`Asset::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of meshes.
    pub meshes: usize,
    /// Number of primitives across all meshes.
    pub primitives: usize,
    /// Total vertex count, summed over primitives (`POSITION.count`).
    pub vertices: usize,
    /// Total triangle count, summed over triangle-mode primitives.
    pub triangles: usize,
}

/// Errors that can occur while parsing or addressing a binary glTF asset.
#[derive(Debug)]
pub enum ContainerError {
    /// The 12-byte header did not start with `glTF`.
    BadMagic,
    /// The header declared a version other than 2.
    UnsupportedVersion(u32),
    /// A chunk's declared length ran past the end of the buffer.
    TruncatedChunk,
    /// The asset had no JSON chunk.
    MissingJsonChunk,
    /// The JSON chunk did not parse as a glTF document.
    InvalidJson(json::Error),
    /// An accessor, bufferView, or index addressed bytes outside `bin`.
    AccessorOutOfRange {
        /// The offending accessor's index.
        accessor: usize,
    },
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ContainerError::BadMagic => write!(f, "not a glTF-Binary asset"),
            ContainerError::UnsupportedVersion(v) => write!(f, "unsupported glTF version {v}"),
            ContainerError::TruncatedChunk => write!(f, "chunk length exceeds buffer length"),
            ContainerError::MissingJsonChunk => write!(f, "asset has no JSON chunk"),
            ContainerError::InvalidJson(e) => write!(f, "malformed JSON chunk: {e}"),
            ContainerError::AccessorOutOfRange { accessor } => {
                write!(f, "accessor {accessor} addresses data outside the buffer")
            }
        }
    }
}

impl std::error::Error for ContainerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContainerError::InvalidJson(e) => Some(e),
            _ => None,
        }
    }
}

impl From<binary::Error> for ContainerError {
    fn from(e: binary::Error) -> Self {
        match e {
            binary::Error::Magic(_) => ContainerError::BadMagic,
            binary::Error::Version(v) => ContainerError::UnsupportedVersion(v),
            binary::Error::ChunkType(binary::ChunkType::Json) => ContainerError::MissingJsonChunk,
            binary::Error::Length { .. }
            | binary::Error::ChunkLength { .. }
            | binary::Error::ChunkType(_)
            | binary::Error::UnknownChunkType(_)
            | binary::Error::Io(_) => ContainerError::TruncatedChunk,
        }
    }
}

/// Parses a binary glTF (`.glb`) byte slice into an [`Asset`].
///
/// Follows the container's parse algorithm: header validation, chunk
/// iteration via [`binary::Glb::from_slice`], then JSON deserialization of
/// the mandatory JSON chunk. A missing BIN chunk is normalized to an empty
/// blob rather than an error, since meshes with no indexed geometry (e.g.
/// sparse-only assets) are otherwise well-formed.
pub fn parse(bytes: &[u8]) -> Result<Asset, ContainerError> {
    let glb = binary::Glb::from_slice(bytes)?;
    let root = json::Root::from_slice(&glb.json).map_err(ContainerError::InvalidJson)?;
    let bin = glb.bin.map(Cow::into_owned).unwrap_or_default();
    Ok(Asset { root, bin })
}

impl Asset {
    /// Serializes this asset back to a GLB byte vector without optimization.
    ///
    /// Used by callers that only need a parse/reserialize round-trip (e.g.
    /// validating that `write` preserves byte-exact framing); the real
    /// output path goes through [`crate::writer`].
    pub fn to_glb_vec(&self) -> std::io::Result<Vec<u8>> {
        let json = self.root.to_vec().expect("in-memory Root always serializes");
        let glb = binary::Glb {
            header: binary::Header {
                magic: *b"glTF",
                version: 2,
                length: 0,
            },
            json: Cow::Owned(json),
            bin: if self.bin.is_empty() {
                None
            } else {
                Some(Cow::Borrowed(&self.bin))
            },
        };
        glb.to_vec()
    }

    /// Resolves a bufferView's addressed byte range.
    ///
    /// Returns a borrowed slice; a zero-copy typed view is only possible
    /// when the caller also knows the accessor's stride equals its element
    /// size (see [`Asset::accessor_bytes`]).
    pub fn buffer_view_slice(&self, view: Index<buffer::View>) -> Result<&[u8], ContainerError> {
        let view = self
            .root
            .buffer_views
            .get(view.value())
            .ok_or(ContainerError::TruncatedChunk)?;
        let start = view.byte_offset.map(|o| o.0 as usize).unwrap_or(0);
        let end = start + view.byte_length.0 as usize;
        self.bin.get(start..end).ok_or(ContainerError::TruncatedChunk)
    }

    /// Resolves an accessor to its addressed bytes, honoring `byteStride`.
    ///
    /// Returns a borrowed slice when the data is tightly packed (no stride,
    /// or stride equal to the element size); otherwise gathers each
    /// element into a freshly owned, tightly packed copy.
    pub fn accessor_bytes(&self, accessor_index: usize) -> Result<Cow<[u8]>, ContainerError> {
        let accessor = self
            .root
            .accessors
            .get(accessor_index)
            .ok_or(ContainerError::AccessorOutOfRange { accessor: accessor_index })?;
        let view_index = accessor
            .buffer_view
            .ok_or(ContainerError::AccessorOutOfRange { accessor: accessor_index })?;
        let view_bytes = self.buffer_view_slice(view_index)?;
        let view = &self.root.buffer_views[view_index.value()];

        let component_size = component_type(accessor)
            .ok_or(ContainerError::AccessorOutOfRange { accessor: accessor_index })?
            .size();
        let multiplicity = accessor_type(accessor)
            .ok_or(ContainerError::AccessorOutOfRange { accessor: accessor_index })?
            .multiplicity();
        let element_size = component_size * multiplicity;
        let count = accessor.count.0 as usize;
        let byte_offset = accessor.byte_offset.map(|o| o.0 as usize).unwrap_or(0);
        let stride = view
            .byte_stride
            .map(|s| s.0)
            .filter(|&s| s != 0)
            .unwrap_or(element_size);

        let needed = byte_offset + stride * count.saturating_sub(1) + element_size;
        if needed > view_bytes.len() {
            return Err(ContainerError::AccessorOutOfRange { accessor: accessor_index });
        }

        if stride == element_size {
            let start = byte_offset;
            let end = start + element_size * count;
            Ok(Cow::Borrowed(&view_bytes[start..end]))
        } else {
            let mut out = Vec::with_capacity(element_size * count);
            for i in 0..count {
                let start = byte_offset + i * stride;
                out.extend_from_slice(&view_bytes[start..start + element_size]);
            }
            Ok(Cow::Owned(out))
        }
    }

    /// Decodes an accessor into a flat `f32` array of `count * multiplicity`
    /// elements, converting integer component types per the glTF
    /// normalization rule (`normalized` maps the type's range onto `[-1,1]`
    /// or `[0,1]`; otherwise components are simply widened to `f32`).
    pub fn read_f32_attribute(&self, accessor_index: Index<Accessor>) -> Result<Vec<f32>, ContainerError> {
        let idx = accessor_index.value();
        let accessor = self
            .root
            .accessors
            .get(idx)
            .ok_or(ContainerError::AccessorOutOfRange { accessor: idx })?;
        let ty = component_type(accessor).ok_or(ContainerError::AccessorOutOfRange { accessor: idx })?;
        let multiplicity = accessor_type(accessor)
            .ok_or(ContainerError::AccessorOutOfRange { accessor: idx })?
            .multiplicity();
        let count = accessor.count.0 as usize;
        let bytes = self.accessor_bytes(idx)?;
        let normalized = accessor.normalized;

        let mut out = Vec::with_capacity(count * multiplicity);
        for chunk in bytes.chunks_exact(ty.size()) {
            let raw = match ty {
                ComponentType::I8 => chunk[0] as i8 as f32,
                ComponentType::U8 => chunk[0] as f32,
                ComponentType::I16 => i16::from_le_bytes([chunk[0], chunk[1]]) as f32,
                ComponentType::U16 => u16::from_le_bytes([chunk[0], chunk[1]]) as f32,
                ComponentType::U32 => {
                    u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f32
                }
                ComponentType::F32 => f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
            };
            let value = if normalized {
                match ty {
                    ComponentType::I8 => (raw / 127.0).max(-1.0),
                    ComponentType::U8 => raw / 255.0,
                    ComponentType::I16 => (raw / 32767.0).max(-1.0),
                    ComponentType::U16 => raw / 65535.0,
                    _ => raw,
                }
            } else {
                raw
            };
            out.push(value);
        }
        Ok(out)
    }

    /// Decodes an index accessor (`u8`, `u16`, or `u32` scalar) to `u32`.
    pub fn read_indices(&self, accessor_index: Index<Accessor>) -> Result<Vec<u32>, ContainerError> {
        let idx = accessor_index.value();
        let accessor = self
            .root
            .accessors
            .get(idx)
            .ok_or(ContainerError::AccessorOutOfRange { accessor: idx })?;
        let ty = component_type(accessor).ok_or(ContainerError::AccessorOutOfRange { accessor: idx })?;
        let bytes = self.accessor_bytes(idx)?;
        let out = match ty {
            ComponentType::U8 => bytes.iter().map(|&b| b as u32).collect(),
            ComponentType::U16 => bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]) as u32)
                .collect(),
            ComponentType::U32 => bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            ComponentType::I8 | ComponentType::I16 | ComponentType::F32 => {
                return Err(ContainerError::AccessorOutOfRange { accessor: idx })
            }
        };
        Ok(out)
    }

    /// Reads `POSITION` and, if present, `indices` for a primitive. Missing
    /// indices are synthesized as the identity permutation `[0..vertexCount)`
    /// per the pipeline's ingest stage.
    pub fn read_indices_or_identity(
        &self,
        primitive: &Primitive,
        vertex_count: usize,
    ) -> Result<Vec<u32>, ContainerError> {
        match primitive.indices {
            Some(accessor) => self.read_indices(accessor),
            None => Ok((0..vertex_count as u32).collect()),
        }
    }

    /// Looks up a named vertex attribute's accessor index on a primitive.
    pub fn attribute(&self, primitive: &Primitive, semantic: Semantic) -> Option<Index<Accessor>> {
        primitive
            .attributes
            .get(&Checked::Valid(semantic))
            .copied()
    }

    /// Iterates over every primitive in the asset, paired with its owning
    /// mesh and primitive indices.
    pub fn primitives(&self) -> impl Iterator<Item = (usize, usize, &Mesh, &Primitive)> {
        self.root.meshes.iter().enumerate().flat_map(|(mesh_idx, mesh)| {
            mesh.primitives
                .iter()
                .enumerate()
                .map(move |(prim_idx, prim)| (mesh_idx, prim_idx, mesh, prim))
        })
    }

    /// Aggregate mesh/primitive/vertex/triangle counts over the asset.
    pub fn stats(&self) -> Stats {
        let mut stats = Stats {
            meshes: self.root.meshes.len(),
            ..Stats::default()
        };
        for (_, _, _, primitive) in self.primitives() {
            stats.primitives += 1;
            if let Some(accessor) = self.attribute(primitive, Semantic::Positions) {
                let vertex_count = self
                    .root
                    .accessors
                    .get(accessor.value())
                    .map(|a| a.count.0 as usize)
                    .unwrap_or(0);
                stats.vertices += vertex_count;
                let index_count = primitive
                    .indices
                    .and_then(|i| self.root.accessors.get(i.value()))
                    .map(|a| a.count.0 as usize)
                    .unwrap_or(vertex_count);
                if matches!(primitive.mode, Checked::Valid(json::mesh::Mode::Triangles)) {
                    stats.triangles += index_count / 3;
                }
            }
        }
        stats
    }
}

fn component_type(accessor: &Accessor) -> Option<ComponentType> {
    match accessor.component_type {
        Checked::Valid(json::accessor::GenericComponentType(ty)) => Some(ty),
        Checked::Invalid => None,
    }
}

fn accessor_type(accessor: &Accessor) -> Option<Type> {
    match accessor.type_ {
        Checked::Valid(ty) => Some(ty),
        Checked::Invalid => None,
    }
}
