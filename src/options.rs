//! Pipeline configuration.
//!
//! `Options` is a plain, serde-serializable value type with no dependency
//! on the CLI layer; `bin/gltf-optimize.rs` builds one from parsed
//! command-line flags the same way an importer might build its own
//! `Config` from caller-supplied fields before `import()` ever touches it.

use serde::{Deserialize, Serialize};

/// The ratios (relative to the source mesh's triangle count) at which LOD
/// entries are generated, and the knobs controlling how aggressively each
/// primitive is optimized along the way.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Drop duplicate vertices (by exact attribute match) before any other
    /// stage runs.
    pub deduplicate_vertices: bool,
    /// Reorder indices/vertices for GPU vertex-cache and fetch locality.
    pub optimize_vertex_cache: bool,
    /// Quantize `POSITION` to a per-mesh affine + `i8`/`i16`.
    pub quantize_positions: bool,
    /// Bit width used when `quantize_positions` is set: `8` or `16`.
    pub position_bits: u8,
    /// Quantize `NORMAL` to normalized `i8` vec3.
    pub quantize_normals: bool,
    /// Quantize `TANGENT` to normalized `i8` vec4.
    pub quantize_tangents: bool,
    /// Quantize `TEXCOORD_n` to normalized `u16` vec2.
    pub quantize_uvs: bool,
    /// Apply `EXT_meshopt_compression` to every bufferView at write time.
    pub meshopt_compression: bool,
    /// Run the texture-space importance analyzer (requires bound images to
    /// be decodable; silently skipped otherwise).
    pub texture_aware: bool,
    /// Importance score above which a vertex is locked against collapse.
    pub importance_threshold: f32,
    /// Maximum geometric error simplification may introduce, per LOD level.
    pub lod_error_threshold: f32,
    /// Uniform scale applied to material images before re-encoding, in
    /// `(0, 1]`. `1.0` leaves images untouched.
    pub texture_scale: f32,
    /// Triangle-count ratios (relative to the source) at which LOD entries
    /// are generated. `1.0` always denotes the unsimplified base level.
    pub lod_levels: Vec<f32>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            deduplicate_vertices: true,
            optimize_vertex_cache: true,
            quantize_positions: true,
            position_bits: 16,
            quantize_normals: true,
            quantize_tangents: true,
            quantize_uvs: true,
            meshopt_compression: true,
            texture_aware: false,
            importance_threshold: 0.5,
            lod_error_threshold: 0.02,
            texture_scale: 1.0,
            lod_levels: vec![1.0, 0.9, 0.8, 0.7, 0.5, 0.25],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_full_base_level() {
        let options = Options::default();
        assert_eq!(options.lod_levels.first(), Some(&1.0));
    }

    #[test]
    fn round_trips_through_json() {
        let options = Options::default();
        let json = serde_json::to_string(&options).expect("serialize");
        let parsed: Options = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(options, parsed);
    }
}
