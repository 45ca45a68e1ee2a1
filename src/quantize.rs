//! Pure numeric quantization transforms: float attribute arrays
//! to integer arrays, plus the metadata a caller needs to undo the lossy
//! step (a de-quantization affine for positions, an optional UV remap for
//! out-of-range texture coordinates).
//!
//! Every function here is a pure `f32` slice -> owned buffer transform; none
//! of them touch the container or any capability trait.

use gltf_json::accessor::{ComponentType, Type};

/// The `(scale, translation)` affine that recovers a de-quantized position:
/// `p = scale * q + translation`, applied componentwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionAffine {
    /// Per-axis scale.
    pub scale: [f32; 3],
    /// Per-axis translation (the bounding box center).
    pub translation: [f32; 3],
}

impl Default for PositionAffine {
    fn default() -> Self {
        PositionAffine { scale: [1.0; 3], translation: [0.0; 3] }
    }
}

/// A quantized attribute, ready to be packed into a bufferView: its
/// component type/shape, tightly packed little-endian bytes, and (when
/// meaningful) the accessor's `min`/`max`.
#[derive(Clone, Debug)]
pub struct QuantizedAttribute {
    /// The integer component type the bytes are encoded as.
    pub component_type: ComponentType,
    /// The accessor's vector shape (always `Vec2`/`Vec3`/`Vec4` here).
    pub type_: Type,
    /// Whether the accessor should be marked `normalized`.
    pub normalized: bool,
    /// Tightly packed, little-endian component data: `count * multiplicity`
    /// components.
    pub bytes: Vec<u8>,
    /// Accessor `min`, one entry per component. Empty when not required.
    pub min: Vec<f64>,
    /// Accessor `max`, one entry per component. Empty when not required.
    pub max: Vec<f64>,
}

/// Output of [`quantize_positions`]: the quantized attribute plus the affine
/// needed to recover world-space positions.
#[derive(Clone, Debug)]
pub struct PositionQuantization {
    /// The quantized `POSITION` attribute.
    pub attribute: QuantizedAttribute,
    /// `p_world = affine.scale * q + affine.translation`, applied per axis.
    pub affine: PositionAffine,
}

/// The offset/scale needed to bring out-of-range UVs into `[0, 1]` before
/// quantizing them (§4.2, UVs). Recorded as advisory metadata; per §9 open
/// question 1 the default writer does not rewrite material texture
/// transforms to compensate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvRemap {
    /// Per-axis offset subtracted before scaling into `[0, 1]`.
    pub offset: [f32; 2],
    /// Per-axis scale (the original UV range along that axis).
    pub scale: [f32; 2],
}

/// Quantizes positions to `i8` or `i16`, per-axis, via a symmetric affine
/// about the bounding-box center.
///
/// `bits` selects the integer width: `8` for `i8`, anything else for `i16`.
/// A degenerate (zero-range) axis quantizes to a constant with `scale = 1`,
/// so de-quantization recovers the exact value.
pub fn quantize_positions(positions: &[[f32; 3]], bits: u8) -> PositionQuantization {
    let max_value: f32 = if bits <= 8 { i8::MAX as f32 } else { i16::MAX as f32 };
    let component_type = if bits <= 8 { ComponentType::I8 } else { ComponentType::I16 };

    let mut min = [0.0f32; 3];
    let mut max = [0.0f32; 3];
    if !positions.is_empty() {
        min = [f32::INFINITY; 3];
        max = [f32::NEG_INFINITY; 3];
        for p in positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
    }

    let mut translation = [0.0f32; 3];
    let mut scale = [1.0f32; 3];
    for axis in 0..3 {
        translation[axis] = (min[axis] + max[axis]) / 2.0;
        let range = max[axis] - min[axis];
        scale[axis] = if range == 0.0 { 1.0 } else { range / (2.0 * max_value) };
    }

    let bytes_per_component = if bits <= 8 { 1 } else { 2 };
    let mut bytes = Vec::with_capacity(positions.len() * 3 * bytes_per_component);
    for p in positions {
        for axis in 0..3 {
            let q = ((p[axis] - translation[axis]) / scale[axis])
                .round()
                .clamp(-max_value, max_value) as i32;
            if bits <= 8 {
                bytes.push(q as i8 as u8);
            } else {
                bytes.extend_from_slice(&(q as i16).to_le_bytes());
            }
        }
    }

    // Accessor min/max reflect the quantizer's symmetric range, not the
    // achieved data extent: every axis can represent exactly [-maxValue,
    // maxValue] once center/scale are applied.
    let bound = max_value as f64;
    PositionQuantization {
        attribute: QuantizedAttribute {
            component_type,
            type_: Type::Vec3,
            normalized: false,
            bytes,
            min: vec![-bound; 3],
            max: vec![bound; 3],
        },
        affine: PositionAffine { scale, translation },
    }
}

/// Leaves positions as `f32`, for callers that disable position
/// quantization entirely. Still reports the bounding box via `min`/`max`
/// (glTF requires both on every `POSITION` accessor) and an identity affine.
pub fn position_passthrough(positions: &[[f32; 3]]) -> PositionQuantization {
    let mut min = [0.0f64; 3];
    let mut max = [0.0f64; 3];
    if !positions.is_empty() {
        let mut lo = [f32::INFINITY; 3];
        let mut hi = [f32::NEG_INFINITY; 3];
        for p in positions {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(p[axis]);
                hi[axis] = hi[axis].max(p[axis]);
            }
        }
        min = [lo[0] as f64, lo[1] as f64, lo[2] as f64];
        max = [hi[0] as f64, hi[1] as f64, hi[2] as f64];
    }

    let mut bytes = Vec::with_capacity(positions.len() * 3 * 4);
    for p in positions {
        for axis in 0..3 {
            bytes.extend_from_slice(&p[axis].to_le_bytes());
        }
    }

    PositionQuantization {
        attribute: QuantizedAttribute {
            component_type: ComponentType::F32,
            type_: Type::Vec3,
            normalized: false,
            bytes,
            min: min.to_vec(),
            max: max.to_vec(),
        },
        affine: PositionAffine::default(),
    }
}

fn normalize3(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 0.0]
    }
}

/// Quantizes unit vectors (normals) to normalized `i8` vec3s.
///
/// Inputs are re-normalized defensively before quantizing; a zero vector
/// (degenerate normal) quantizes to `(0, 0, 0)`.
pub fn quantize_normals(normals: &[[f32; 3]]) -> QuantizedAttribute {
    let mut bytes = Vec::with_capacity(normals.len() * 3);
    for n in normals {
        let n = normalize3(*n);
        for component in n {
            let q = (component * i8::MAX as f32).round().clamp(i8::MIN as f32, i8::MAX as f32);
            bytes.push(q as i8 as u8);
        }
    }
    QuantizedAttribute {
        component_type: ComponentType::I8,
        type_: Type::Vec3,
        normalized: true,
        bytes,
        min: Vec::new(),
        max: Vec::new(),
    }
}

/// Quantizes tangents (vec4, `w` = handedness sign) to normalized `i8`
/// vec4s. `xyz` is normalized and quantized like [`quantize_normals`]; `w`
/// is snapped to `+127`/`-127` so the sign bit survives quantization exactly.
pub fn quantize_tangents(tangents: &[[f32; 4]]) -> QuantizedAttribute {
    let mut bytes = Vec::with_capacity(tangents.len() * 4);
    for t in tangents {
        let xyz = normalize3([t[0], t[1], t[2]]);
        for component in xyz {
            let q = (component * i8::MAX as f32).round().clamp(i8::MIN as f32, i8::MAX as f32);
            bytes.push(q as i8 as u8);
        }
        let w: i8 = if t[3] >= 0.0 { i8::MAX } else { i8::MIN + 1 };
        bytes.push(w as u8);
    }
    QuantizedAttribute {
        component_type: ComponentType::I8,
        type_: Type::Vec4,
        normalized: true,
        bytes,
        min: Vec::new(),
        max: Vec::new(),
    }
}

/// Quantizes texture coordinates to normalized `u16` vec2s.
///
/// When every coordinate already lies in `[0, 1]` (the common case), emits
/// `round(uv * 65535)` directly. Otherwise offsets/scales the whole set into
/// `[0, 1]` first and returns the remap the caller would need to apply to
/// compensate in material texture transforms (the default writer does not).
pub fn quantize_uvs(uvs: &[[f32; 2]]) -> (QuantizedAttribute, Option<UvRemap>) {
    let in_range = uvs.iter().all(|uv| uv.iter().all(|&c| (0.0..=1.0).contains(&c)));

    let (normalized_uvs, remap) = if in_range || uvs.is_empty() {
        (uvs.to_vec(), None)
    } else {
        let mut min = [f32::INFINITY; 2];
        let mut max = [f32::NEG_INFINITY; 2];
        for uv in uvs {
            for axis in 0..2 {
                min[axis] = min[axis].min(uv[axis]);
                max[axis] = max[axis].max(uv[axis]);
            }
        }
        let mut scale = [1.0f32; 2];
        for axis in 0..2 {
            let range = max[axis] - min[axis];
            scale[axis] = if range == 0.0 { 1.0 } else { range };
        }
        let remapped: Vec<[f32; 2]> = uvs
            .iter()
            .map(|uv| {
                [
                    ((uv[0] - min[0]) / scale[0]).clamp(0.0, 1.0),
                    ((uv[1] - min[1]) / scale[1]).clamp(0.0, 1.0),
                ]
            })
            .collect();
        (remapped, Some(UvRemap { offset: min, scale }))
    };

    let mut bytes = Vec::with_capacity(normalized_uvs.len() * 2 * 2);
    for uv in &normalized_uvs {
        for &component in uv {
            let q = (component.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16;
            bytes.extend_from_slice(&q.to_le_bytes());
        }
    }

    let attribute = QuantizedAttribute {
        component_type: ComponentType::U16,
        type_: Type::Vec2,
        normalized: true,
        bytes,
        min: Vec::new(),
        max: Vec::new(),
    };
    (attribute, remap)
}

/// Picks the narrowest unsigned integer component type that can index
/// `vertex_count` vertices, and repacks `indices` into it.
pub fn narrow_indices(indices: &[u32], vertex_count: usize) -> (ComponentType, Vec<u8>) {
    if vertex_count <= 255 {
        (ComponentType::U8, indices.iter().map(|&i| i as u8).collect())
    } else if vertex_count <= 65535 {
        let mut bytes = Vec::with_capacity(indices.len() * 2);
        for &i in indices {
            bytes.extend_from_slice(&(i as u16).to_le_bytes());
        }
        (ComponentType::U16, bytes)
    } else {
        let mut bytes = Vec::with_capacity(indices.len() * 4);
        for &i in indices {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        (ComponentType::U32, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_round_trip_within_precision() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let q = quantize_positions(&positions, 16);
        let max_value = i16::MAX as f32;
        for (i, p) in positions.iter().enumerate() {
            for axis in 0..3 {
                let byte_offset = (i * 3 + axis) * 2;
                let raw = i16::from_le_bytes([
                    q.attribute.bytes[byte_offset],
                    q.attribute.bytes[byte_offset + 1],
                ]);
                let recovered = q.affine.scale[axis] * raw as f32 + q.affine.translation[axis];
                let tolerance = (p[axis].max(1.0)) / max_value + 1e-4;
                assert!((recovered - p[axis]).abs() <= tolerance);
            }
        }
    }

    #[test]
    fn flat_axis_falls_back_to_scale_one() {
        let positions = [[1.0, 2.0, 3.0], [1.0, 5.0, 3.0]];
        let q = quantize_positions(&positions, 16);
        assert_eq!(q.affine.scale[0], 1.0);
        assert_eq!(q.affine.scale[2], 1.0);
        assert_eq!(q.affine.translation[0], 1.0);
        assert_eq!(q.affine.translation[2], 3.0);
    }

    #[test]
    fn normals_quantize_to_unit_length_i8() {
        let normals = [[2.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let q = quantize_normals(&normals);
        assert_eq!(q.bytes[0] as i8, i8::MAX);
        assert_eq!(q.bytes[1] as i8, 0);
        assert_eq!(q.bytes[3] as i8, 0);
    }

    #[test]
    fn tangent_w_preserves_handedness() {
        let tangents = [[1.0, 0.0, 0.0, -1.0], [1.0, 0.0, 0.0, 1.0]];
        let q = quantize_tangents(&tangents);
        assert!((q.bytes[3] as i8) < 0);
        assert!((q.bytes[7] as i8) > 0);
    }

    #[test]
    fn uvs_in_range_need_no_remap() {
        let uvs = [[0.0, 0.0], [1.0, 0.5]];
        let (_, remap) = quantize_uvs(&uvs);
        assert!(remap.is_none());
    }

    #[test]
    fn uvs_out_of_range_are_remapped() {
        let uvs = [[-1.0, 2.0], [1.0, 0.0]];
        let (attribute, remap) = quantize_uvs(&uvs);
        let remap = remap.expect("out-of-range UVs must be remapped");
        assert_eq!(remap.offset, [-1.0, 0.0]);
        assert_eq!(remap.scale, [2.0, 2.0]);
        // first UV normalizes to (0, 1) -> (0, 65535)
        let u = u16::from_le_bytes([attribute.bytes[0], attribute.bytes[1]]);
        let v = u16::from_le_bytes([attribute.bytes[2], attribute.bytes[3]]);
        assert_eq!(u, 0);
        assert_eq!(v, 65535);
    }

    #[test]
    fn position_passthrough_keeps_exact_floats() {
        let positions = [[0.1, 0.2, 0.3], [1.5, -2.5, 3.5]];
        let q = position_passthrough(&positions);
        assert_eq!(q.attribute.component_type, ComponentType::F32);
        assert_eq!(q.affine, PositionAffine::default());
        let recovered = f32::from_le_bytes([
            q.attribute.bytes[4],
            q.attribute.bytes[5],
            q.attribute.bytes[6],
            q.attribute.bytes[7],
        ]);
        assert_eq!(recovered, 0.2);
    }

    #[test]
    fn index_width_picks_narrowest_type() {
        let indices: Vec<u32> = (0..10).collect();
        let (ty, bytes) = narrow_indices(&indices, 10);
        assert_eq!(ty, ComponentType::U8);
        assert_eq!(bytes.len(), 10);

        let (ty, bytes) = narrow_indices(&indices, 300);
        assert_eq!(ty, ComponentType::U16);
        assert_eq!(bytes.len(), 20);

        let (ty, bytes) = narrow_indices(&indices, 100_000);
        assert_eq!(ty, ComponentType::U32);
        assert_eq!(bytes.len(), 40);
    }
}
