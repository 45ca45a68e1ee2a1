//! LOD chain data model and generator.
//!
//! A [`LodChain`] is the unit a caller picks from: one entry per requested
//! ratio, sharing the primitive's dedupe/reorder/importance work but each
//! independently simplified, quantized, and index-width-minimized.

use gltf_json::accessor::{ComponentType, Type};
use gltf_json::mesh::Semantic;

use crate::capability::{CapabilityError, Simplifier};
use crate::error::Advisory;
use crate::options::Options;
use crate::quantize::{self, PositionQuantization, QuantizedAttribute, UvRemap};
use crate::simplify::{simplify_primitive, SimplifyRequest};

/// A non-standard attribute (`COLOR_n`, `JOINTS_n`, `WEIGHTS_n`, or any
/// other passthrough semantic) carried through every stage as tightly
/// packed raw bytes, untouched except for vertex reindexing.
#[derive(Clone, Debug)]
pub struct PassthroughAttribute {
    /// The attribute's semantic.
    pub semantic: Semantic,
    /// Original component type (never reinterpreted).
    pub component_type: ComponentType,
    /// Original vector shape.
    pub type_: Type,
    /// Whether the source accessor was marked `normalized`.
    pub normalized: bool,
    /// Bytes per vertex element (`component_type.size() * type_.multiplicity()`).
    pub element_size: usize,
    /// Tightly packed, one element per vertex.
    pub bytes: Vec<u8>,
}

/// One simplified, quantized variant of a primitive, at a given triangle
/// ratio relative to the source.
pub struct LodEntry {
    /// Ratio of this entry's triangle count to the source primitive's.
    pub ratio: f32,
    /// Number of vertices in this entry's (compacted) attribute arrays.
    pub vertex_count: usize,
    /// Triangle count (`indices.len() / 3`).
    pub triangle_count: usize,
    /// Narrowed index component type.
    pub index_component_type: ComponentType,
    /// Narrowed, tightly packed little-endian index bytes.
    pub index_bytes: Vec<u8>,
    /// Quantized `POSITION`, always present.
    pub position: PositionQuantization,
    /// Quantized `NORMAL`, if the source had one and quantization is enabled.
    pub normal: Option<QuantizedAttribute>,
    /// Quantized `TANGENT`, if the source had one and quantization is enabled.
    pub tangent: Option<QuantizedAttribute>,
    /// Quantized `TEXCOORD_n` sets, keyed by set index, each with its
    /// optional out-of-range remap.
    pub uvs: Vec<(u32, QuantizedAttribute, Option<UvRemap>)>,
    /// Passthrough attributes, reindexed to this entry's vertex buffer.
    pub passthrough: Vec<PassthroughAttribute>,
}

/// The full LOD chain for one (mesh, primitive).
pub struct LodChain {
    /// Owning mesh index.
    pub mesh: usize,
    /// Primitive index within the mesh.
    pub primitive: usize,
    /// The primitive's material, carried through unchanged.
    pub material: Option<usize>,
    /// Entries in the order `options.lod_levels` was given, descending by
    /// convention (highest ratio first).
    pub entries: Vec<LodEntry>,
}

/// The post-dedupe/reorder attribute state the LOD generator takes a fresh
/// copy of for every ratio.
pub struct BaseState {
    /// Triangle-list indices.
    pub indices: Vec<u32>,
    /// `POSITION`, one per vertex.
    pub positions: Vec<[f32; 3]>,
    /// `NORMAL`, if present.
    pub normals: Option<Vec<[f32; 3]>>,
    /// `TANGENT`, if present.
    pub tangents: Option<Vec<[f32; 4]>>,
    /// `TEXCOORD_n` sets, keyed by set index.
    pub uvs: Vec<(u32, Vec<[f32; 2]>)>,
    /// Non-standard attributes.
    pub passthrough: Vec<PassthroughAttribute>,
}

/// Generates a [`LodChain`] from a primitive's post-dedupe/reorder state:
/// for each ratio in `options.lod_levels`, simplifies (skipped at ratio
/// 1.0), quantizes, and narrows indices.
///
/// `importance` is the merged per-vertex score, shared across
/// every ratio; pass an all-zero vector when `textureAware` is disabled and
/// no view-space score was computed.
pub fn generate(
    mesh: usize,
    primitive: usize,
    material: Option<usize>,
    base: &BaseState,
    importance: &[f32],
    options: &Options,
    simplifier: &dyn Simplifier,
    advisories: &mut Vec<Advisory>,
) -> Result<LodChain, CapabilityError> {
    let mut entries = Vec::with_capacity(options.lod_levels.len());
    let primary_uv: Option<&[[f32; 2]]> = base.uvs.first().map(|(_, data)| data.as_slice());

    for &ratio in &options.lod_levels {
        let request = SimplifyRequest {
            indices: &base.indices,
            positions: &base.positions,
            uvs: primary_uv,
            importance,
            ratio,
            importance_threshold: options.importance_threshold,
            error_threshold: options.lod_error_threshold,
        };

        let outcome = match simplify_primitive(simplifier, &request) {
            Ok(outcome) => outcome,
            Err(e) => {
                advisories.push(Advisory::new(
                    "simplify",
                    format!("mesh {mesh} primitive {primitive} ratio {ratio}: {e}, falling back to identity"),
                ));
                fallback_outcome(&base.indices, base.positions.len())
            }
        };

        let vertex_count = outcome.remap.unique_count;
        let remap = &outcome.remap.remap;

        let positions = remap_floats::<3>(&base.positions, remap, vertex_count);
        let position = if options.quantize_positions {
            quantize::quantize_positions(&positions, options.position_bits)
        } else {
            quantize::position_passthrough(&positions)
        };

        let normal = if options.quantize_normals {
            base.normals
                .as_ref()
                .map(|n| quantize::quantize_normals(&remap_floats::<3>(n, remap, vertex_count)))
        } else {
            None
        };

        let tangent = if options.quantize_tangents {
            base.tangents
                .as_ref()
                .map(|t| quantize::quantize_tangents(&remap_floats::<4>(t, remap, vertex_count)))
        } else {
            None
        };

        let uvs = if options.quantize_uvs {
            base.uvs
                .iter()
                .map(|(set, data)| {
                    let remapped = remap_floats::<2>(data, remap, vertex_count);
                    let (attribute, uv_remap) = quantize::quantize_uvs(&remapped);
                    (*set, attribute, uv_remap)
                })
                .collect()
        } else {
            Vec::new()
        };

        let passthrough = base
            .passthrough
            .iter()
            .map(|attr| PassthroughAttribute {
                semantic: attr.semantic.clone(),
                component_type: attr.component_type,
                type_: attr.type_,
                normalized: attr.normalized,
                element_size: attr.element_size,
                bytes: remap_attribute_bytes(&attr.bytes, attr.element_size, remap, vertex_count),
            })
            .collect();

        let (index_component_type, index_bytes) = quantize::narrow_indices(&outcome.indices, vertex_count);

        entries.push(LodEntry {
            ratio,
            vertex_count,
            triangle_count: outcome.indices.len() / 3,
            index_component_type,
            index_bytes,
            position,
            normal,
            tangent,
            uvs,
            passthrough,
        });
    }

    Ok(LodChain { mesh, primitive, material, entries })
}

fn fallback_outcome(indices: &[u32], vertex_count: usize) -> crate::simplify::SimplifyOutcome {
    crate::simplify::SimplifyOutcome {
        indices: indices.to_vec(),
        remap: crate::capability::Remap {
            remap: (0..vertex_count as u32).collect(),
            unique_count: vertex_count,
        },
        achieved_error: 0.0,
    }
}

/// Writes each old vertex's data into its new slot.
/// Colliding old indices that map to the same new slot simply overwrite each
/// other with identical data, which is tolerated.
pub fn remap_attribute_bytes(bytes: &[u8], element_size: usize, remap: &[u32], new_count: usize) -> Vec<u8> {
    let mut out = vec![0u8; new_count * element_size];
    for (old_index, &new_index) in remap.iter().enumerate() {
        let src = &bytes[old_index * element_size..(old_index + 1) * element_size];
        let dst_start = new_index as usize * element_size;
        out[dst_start..dst_start + element_size].copy_from_slice(src);
    }
    out
}

pub(crate) fn remap_floats<const N: usize>(data: &[[f32; N]], remap: &[u32], new_count: usize) -> Vec<[f32; N]> {
    let mut out = vec![[0.0f32; N]; new_count];
    for (old_index, &new_index) in remap.iter().enumerate() {
        out[new_index as usize] = data[old_index];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::DefaultSimplifier;

    fn base_quad() -> BaseState {
        BaseState {
            indices: vec![0, 1, 2, 0, 2, 3],
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            normals: None,
            tangents: None,
            uvs: Vec::new(),
            passthrough: Vec::new(),
        }
    }

    #[test]
    fn generates_one_entry_per_requested_ratio() {
        let base = base_quad();
        let importance = vec![0.0; 4];
        let mut options = Options::default();
        options.lod_levels = vec![1.0, 0.5];
        let mut advisories = Vec::new();
        let chain = generate(0, 0, None, &base, &importance, &options, &DefaultSimplifier, &mut advisories)
            .expect("generate");
        assert_eq!(chain.entries.len(), 2);
        assert_eq!(chain.entries[0].ratio, 1.0);
        assert_eq!(chain.entries[0].triangle_count, 2);
    }

    #[test]
    fn remap_attribute_bytes_writes_old_vertex_into_new_slot() {
        let bytes: Vec<u8> = vec![1, 2, 3, 4];
        let remap = vec![1, 0];
        let out = remap_attribute_bytes(&bytes, 2, &remap, 2);
        assert_eq!(out, vec![3, 4, 1, 2]);
    }
}
