//! Re-emits an optimized binary glTF asset at one LOD ratio.
//!
//! Starts from a clone of the parsed [`json::Root`] so every untouched part
//! of the document (materials, samplers, cameras, scene graph, animations,
//! skins) survives unchanged, then replaces each optimized primitive's
//! index/attribute accessors, folds the position de-quantization affine
//! into node transforms, carries forward image bytes and any accessor an
//! animation or skin still references, and finally serializes the result
//! the same way [`crate::container::Asset::to_glb_vec`] does.

use std::borrow::Cow;
use std::collections::HashMap;

use gltf_json as json;
use json::accessor::{Accessor, ComponentType, GenericComponentType, Type};
use json::buffer;
use json::validation::{Checked, USize64};
use json::{extensions, Index};

use crate::binary;
use crate::capability::{BufferCodec, ImageCodec};
use crate::container::Asset;
use crate::error::{Advisory, Error};
use crate::lod::{LodChain, LodEntry};
use crate::options::Options;
use crate::quantize::{PositionAffine, QuantizedAttribute};

/// Rewrites `asset` at `chains[..].entries[lod_index]` and serializes the
/// result to a fresh GLB byte vector.
///
/// `buffer_codec`/`image_codec` failures degrade locally (push an
/// [`Advisory`], fall back to uncompressed/untouched bytes) rather than
/// aborting the write.
pub fn write(
    asset: &Asset,
    chains: &[LodChain],
    lod_index: usize,
    options: &Options,
    buffer_codec: &dyn BufferCodec,
    image_codec: &dyn ImageCodec,
    advisories: &mut Vec<Advisory>,
) -> Result<Vec<u8>, Error> {
    let mut root = asset.root.clone();
    root.accessors.clear();
    root.buffer_views.clear();
    root.buffers.clear();
    root.extensions_used.clear();
    root.extensions_required.clear();

    let mut bin = Vec::new();
    let buffer_index = root.push(json::Buffer {
        byte_length: USize64(0),
        name: None,
        uri: None,
        extensions: None,
        extras: Default::default(),
    });

    let mut used_quantization = false;
    let mut used_compression = false;
    let mut mesh_affine: HashMap<usize, PositionAffine> = HashMap::new();

    for chain in chains {
        let entry = &chain.entries[lod_index];

        let position_accessor = write_position_attribute(
            &mut root,
            &mut bin,
            buffer_index,
            entry,
            options,
            buffer_codec,
            advisories,
            chain.mesh,
            chain.primitive,
            &mut used_quantization,
            &mut used_compression,
        );
        mesh_affine.entry(chain.mesh).or_insert(entry.position.affine);

        let mut attributes = std::collections::BTreeMap::new();
        attributes.insert(Checked::Valid(json::mesh::Semantic::Positions), position_accessor);

        if let Some(normal) = &entry.normal {
            let idx = write_quantized_attribute(
                &mut root,
                &mut bin,
                buffer_index,
                normal,
                entry.vertex_count,
                options,
                buffer_codec,
                advisories,
                chain.mesh,
                chain.primitive,
                "NORMAL",
                &mut used_quantization,
                &mut used_compression,
            );
            attributes.insert(Checked::Valid(json::mesh::Semantic::Normals), idx);
        }

        if let Some(tangent) = &entry.tangent {
            let idx = write_quantized_attribute(
                &mut root,
                &mut bin,
                buffer_index,
                tangent,
                entry.vertex_count,
                options,
                buffer_codec,
                advisories,
                chain.mesh,
                chain.primitive,
                "TANGENT",
                &mut used_quantization,
                &mut used_compression,
            );
            attributes.insert(Checked::Valid(json::mesh::Semantic::Tangents), idx);
        }

        for (set, attribute, _remap) in &entry.uvs {
            let idx = write_quantized_attribute(
                &mut root,
                &mut bin,
                buffer_index,
                attribute,
                entry.vertex_count,
                options,
                buffer_codec,
                advisories,
                chain.mesh,
                chain.primitive,
                "TEXCOORD",
                &mut used_quantization,
                &mut used_compression,
            );
            attributes.insert(Checked::Valid(json::mesh::Semantic::TexCoords(*set)), idx);
        }

        for passthrough in &entry.passthrough {
            let idx = write_passthrough_attribute(
                &mut root,
                &mut bin,
                buffer_index,
                passthrough,
                entry.vertex_count,
                options,
                buffer_codec,
                advisories,
                chain.mesh,
                chain.primitive,
                &mut used_compression,
            );
            attributes.insert(Checked::Valid(passthrough.semantic.clone()), idx);
        }

        let index_accessor = write_index_attribute(
            &mut root,
            &mut bin,
            buffer_index,
            entry,
            options,
            buffer_codec,
            advisories,
            chain.mesh,
            chain.primitive,
            &mut used_compression,
        );

        let primitive = &mut root.meshes[chain.mesh].primitives[chain.primitive];
        primitive.attributes = attributes;
        primitive.indices = Some(index_accessor);
    }

    fold_mesh_affines_into_nodes(&mut root, &mesh_affine, advisories);

    let mut accessor_remap: HashMap<usize, Index<Accessor>> = HashMap::new();
    carry_forward_animations_and_skins(&mut root, asset, buffer_index, &mut bin, &mut accessor_remap);

    carry_forward_images(&mut root, asset, buffer_index, &mut bin, options, image_codec, advisories);

    if used_quantization {
        root.extensions_used.push(extensions::KHR_MESH_QUANTIZATION.to_string());
        root.extensions_required.push(extensions::KHR_MESH_QUANTIZATION.to_string());
    }
    if used_compression {
        root.extensions_used.push(extensions::EXT_MESHOPT_COMPRESSION.to_string());
        root.extensions_required.push(extensions::EXT_MESHOPT_COMPRESSION.to_string());
    }

    root.buffers[buffer_index.value()].byte_length = USize64(bin.len() as u64);

    let json_bytes = root.to_vec().expect("rewritten Root always serializes");
    let glb = binary::Glb {
        header: binary::Header { magic: *b"glTF", version: 2, length: 0 },
        json: Cow::Owned(json_bytes),
        bin: if bin.is_empty() { None } else { Some(Cow::Owned(bin)) },
    };
    Ok(glb.to_vec().expect("in-memory GLB serialization is infallible"))
}

/// Appends `bytes` to `bin`, 4-byte-aligning the start first, and pushes a
/// plain (uncompressed) bufferView describing the result.
fn push_view(
    root: &mut json::Root,
    bin: &mut Vec<u8>,
    buffer_index: Index<json::Buffer>,
    bytes: &[u8],
) -> Index<buffer::View> {
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let offset = bin.len();
    bin.extend_from_slice(bytes);
    root.push(buffer::View {
        buffer: buffer_index,
        byte_length: USize64(bytes.len() as u64),
        byte_offset: Some(USize64(offset as u64)),
        byte_stride: None,
        name: None,
        target: None,
        extensions: None,
        extras: Default::default(),
    })
}

/// Same as [`push_view`] but attaches the `EXT_meshopt_compression` payload
/// describing the logical (decompressed) shape of `compressed`.
fn push_compressed_view(
    root: &mut json::Root,
    bin: &mut Vec<u8>,
    buffer_index: Index<json::Buffer>,
    compressed: &[u8],
    count: usize,
    stride: usize,
    mode: extensions::buffer::Mode,
) -> Index<buffer::View> {
    let view = push_view(root, bin, buffer_index, compressed);
    let byte_offset = root.buffer_views[view.value()].byte_offset.unwrap_or(USize64(0));
    root.buffer_views[view.value()].extensions = Some(extensions::buffer::View {
        buffer: buffer_index,
        byte_offset,
        byte_length: USize64(compressed.len() as u64),
        byte_stride: USize64(stride as u64),
        count: USize64(count as u64),
        mode: Checked::Valid(mode),
        filter: None,
    });
    view
}

fn push_accessor(
    root: &mut json::Root,
    view: Index<buffer::View>,
    count: usize,
    component_type: ComponentType,
    type_: Type,
    normalized: bool,
    min: Vec<f64>,
    max: Vec<f64>,
) -> Index<Accessor> {
    root.push(Accessor {
        buffer_view: Some(view),
        byte_offset: None,
        count: USize64(count as u64),
        component_type: Checked::Valid(GenericComponentType(component_type)),
        extensions: None,
        extras: Default::default(),
        type_: Checked::Valid(type_),
        min: value_array(&min),
        max: value_array(&max),
        name: None,
        normalized,
        sparse: None,
    })
}

fn value_array(values: &[f64]) -> Option<serde_json::Value> {
    if values.is_empty() {
        None
    } else {
        Some(serde_json::Value::Array(
            values.iter().map(|&v| serde_json::Number::from_f64(v).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null)).collect(),
        ))
    }
}

#[allow(clippy::too_many_arguments)]
fn write_position_attribute(
    root: &mut json::Root,
    bin: &mut Vec<u8>,
    buffer_index: Index<json::Buffer>,
    entry: &LodEntry,
    options: &Options,
    buffer_codec: &dyn BufferCodec,
    advisories: &mut Vec<Advisory>,
    mesh: usize,
    primitive: usize,
    used_quantization: &mut bool,
    used_compression: &mut bool,
) -> Index<Accessor> {
    let attr = &entry.position.attribute;
    if attr.component_type != ComponentType::F32 {
        *used_quantization = true;
    }
    let stride = attr.component_type.size() * attr.type_.multiplicity();
    let view = write_attribute_view(
        root,
        bin,
        buffer_index,
        &attr.bytes,
        entry.vertex_count,
        stride,
        options,
        buffer_codec,
        advisories,
        mesh,
        primitive,
        "POSITION",
        used_compression,
    );
    push_accessor(
        root,
        view,
        entry.vertex_count,
        attr.component_type,
        attr.type_,
        attr.normalized,
        attr.min.clone(),
        attr.max.clone(),
    )
}

#[allow(clippy::too_many_arguments)]
fn write_quantized_attribute(
    root: &mut json::Root,
    bin: &mut Vec<u8>,
    buffer_index: Index<json::Buffer>,
    attr: &QuantizedAttribute,
    vertex_count: usize,
    options: &Options,
    buffer_codec: &dyn BufferCodec,
    advisories: &mut Vec<Advisory>,
    mesh: usize,
    primitive: usize,
    label: &'static str,
    used_quantization: &mut bool,
    used_compression: &mut bool,
) -> Index<Accessor> {
    if attr.component_type != ComponentType::F32 {
        *used_quantization = true;
    }
    let stride = attr.component_type.size() * attr.type_.multiplicity();
    let view = write_attribute_view(
        root,
        bin,
        buffer_index,
        &attr.bytes,
        vertex_count,
        stride,
        options,
        buffer_codec,
        advisories,
        mesh,
        primitive,
        label,
        used_compression,
    );
    push_accessor(
        root,
        view,
        vertex_count,
        attr.component_type,
        attr.type_,
        attr.normalized,
        attr.min.clone(),
        attr.max.clone(),
    )
}

#[allow(clippy::too_many_arguments)]
fn write_passthrough_attribute(
    root: &mut json::Root,
    bin: &mut Vec<u8>,
    buffer_index: Index<json::Buffer>,
    attr: &crate::lod::PassthroughAttribute,
    vertex_count: usize,
    options: &Options,
    buffer_codec: &dyn BufferCodec,
    advisories: &mut Vec<Advisory>,
    mesh: usize,
    primitive: usize,
    used_compression: &mut bool,
) -> Index<Accessor> {
    let view = write_attribute_view(
        root,
        bin,
        buffer_index,
        &attr.bytes,
        vertex_count,
        attr.element_size,
        options,
        buffer_codec,
        advisories,
        mesh,
        primitive,
        "passthrough",
        used_compression,
    );
    push_accessor(root, view, vertex_count, attr.component_type, attr.type_, attr.normalized, Vec::new(), Vec::new())
}

/// Tries `EXT_meshopt_compression` when enabled and the stride is eligible
/// (a multiple of 4, `<= 256`); otherwise, or on codec failure, falls back
/// to an uncompressed view.
#[allow(clippy::too_many_arguments)]
fn write_attribute_view(
    root: &mut json::Root,
    bin: &mut Vec<u8>,
    buffer_index: Index<json::Buffer>,
    bytes: &[u8],
    count: usize,
    stride: usize,
    options: &Options,
    buffer_codec: &dyn BufferCodec,
    advisories: &mut Vec<Advisory>,
    mesh: usize,
    primitive: usize,
    label: &'static str,
    used_compression: &mut bool,
) -> Index<buffer::View> {
    if options.meshopt_compression && count > 0 && stride % 4 == 0 && stride <= 256 {
        match buffer_codec.encode_vertex_buffer(bytes, count, stride) {
            Ok(compressed) => {
                *used_compression = true;
                return push_compressed_view(
                    root,
                    bin,
                    buffer_index,
                    &compressed,
                    count,
                    stride,
                    extensions::buffer::Mode::Attributes,
                );
            }
            Err(e) => {
                advisories.push(Advisory::new(
                    "compress",
                    format!("mesh {mesh} primitive {primitive} {label}: {e}, writing uncompressed"),
                ));
            }
        }
    }
    push_view(root, bin, buffer_index, bytes)
}

#[allow(clippy::too_many_arguments)]
fn write_index_attribute(
    root: &mut json::Root,
    bin: &mut Vec<u8>,
    buffer_index: Index<json::Buffer>,
    entry: &LodEntry,
    options: &Options,
    buffer_codec: &dyn BufferCodec,
    advisories: &mut Vec<Advisory>,
    mesh: usize,
    primitive: usize,
    used_compression: &mut bool,
) -> Index<Accessor> {
    let index_count = entry.index_bytes.len() / entry.index_component_type.size();

    let view = if options.meshopt_compression && index_count > 0 {
        let widened = widen_indices(&entry.index_bytes, entry.index_component_type);
        match buffer_codec.encode_index_buffer(&widened, entry.vertex_count) {
            Ok(compressed) => {
                *used_compression = true;
                push_compressed_view(
                    root,
                    bin,
                    buffer_index,
                    &compressed,
                    index_count,
                    4,
                    extensions::buffer::Mode::Triangles,
                )
            }
            Err(e) => {
                advisories.push(Advisory::new(
                    "compress",
                    format!("mesh {mesh} primitive {primitive} indices: {e}, writing uncompressed"),
                ));
                push_view(root, bin, buffer_index, &entry.index_bytes)
            }
        }
    } else {
        push_view(root, bin, buffer_index, &entry.index_bytes)
    };

    push_accessor(root, view, index_count, entry.index_component_type, Type::Scalar, false, Vec::new(), Vec::new())
}

fn widen_indices(bytes: &[u8], component_type: ComponentType) -> Vec<u32> {
    match component_type {
        ComponentType::U8 => bytes.iter().map(|&b| b as u32).collect(),
        ComponentType::U16 => bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]) as u32).collect(),
        ComponentType::U32 => bytes.chunks_exact(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect(),
        ComponentType::I8 | ComponentType::I16 | ComponentType::F32 => Vec::new(),
    }
}

/// Folds each mesh's recorded de-quantization affine into every node that
/// references the mesh. A node using an explicit `matrix`
/// (rather than TRS) cannot absorb the affine without decomposing it;
/// that case is flagged as an advisory instead of silently applied.
fn fold_mesh_affines_into_nodes(
    root: &mut json::Root,
    mesh_affine: &HashMap<usize, PositionAffine>,
    advisories: &mut Vec<Advisory>,
) {
    let mut reference_counts: HashMap<usize, usize> = HashMap::new();
    for node in &root.nodes {
        if let Some(mesh) = node.mesh {
            *reference_counts.entry(mesh.value()).or_insert(0) += 1;
        }
    }

    for (node_index, node) in root.nodes.iter_mut().enumerate() {
        let Some(mesh_index) = node.mesh.map(|m| m.value()) else { continue };
        let Some(affine) = mesh_affine.get(&mesh_index) else { continue };
        if affine.scale == [1.0; 3] && affine.translation == [0.0; 3] {
            continue;
        }

        if node.matrix.is_some() {
            advisories.push(Advisory::new(
                "transform",
                format!("node {node_index}: mesh {mesh_index} quantized but the node uses an explicit matrix, skipping transform fixup"),
            ));
            continue;
        }

        if reference_counts.get(&mesh_index).copied().unwrap_or(0) > 1 {
            advisories.push(Advisory::new(
                "transform",
                format!("mesh {mesh_index} is referenced by multiple nodes; the position de-quantization fixup assumes a single orientation and may be incorrect for node {node_index}"),
            ));
        }

        let orig_scale = node.scale.unwrap_or([1.0, 1.0, 1.0]);
        let orig_translation = node.translation.unwrap_or([0.0, 0.0, 0.0]);
        let orig_rotation = node.rotation.unwrap_or_default();

        let new_scale = [
            orig_scale[0] * affine.scale[0],
            orig_scale[1] * affine.scale[1],
            orig_scale[2] * affine.scale[2],
        ];
        let scaled_translation = [
            orig_scale[0] * affine.translation[0],
            orig_scale[1] * affine.translation[1],
            orig_scale[2] * affine.translation[2],
        ];
        let rotated_translation = rotate_vector(orig_rotation.0, scaled_translation);
        let new_translation = [
            orig_translation[0] + rotated_translation[0],
            orig_translation[1] + rotated_translation[1],
            orig_translation[2] + rotated_translation[2],
        ];

        node.scale = Some(new_scale);
        node.translation = Some(new_translation);
        node.rotation = Some(orig_rotation);
    }
}

fn rotate_vector(q: [f32; 4], v: [f32; 3]) -> [f32; 3] {
    let axis = [q[0], q[1], q[2]];
    let uv = cross(axis, v);
    let uuv = cross(axis, uv);
    [
        v[0] + 2.0 * (q[3] * uv[0] + uuv[0]),
        v[1] + 2.0 * (q[3] * uv[1] + uuv[1]),
        v[2] + 2.0 * (q[3] * uv[2] + uuv[2]),
    ]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Copies every accessor an animation sampler or skin still points at
/// (these were cleared along with the mesh-primitive accessors) and
/// patches the references to the freshly pushed indices. Left uncompressed:
/// these are not the per-bufferView vertex/index streams
/// `EXT_meshopt_compression` targets.
fn carry_forward_animations_and_skins(
    root: &mut json::Root,
    asset: &Asset,
    buffer_index: Index<json::Buffer>,
    bin: &mut Vec<u8>,
    remap: &mut HashMap<usize, Index<Accessor>>,
) {
    for animation_idx in 0..root.animations.len() {
        for sampler_idx in 0..root.animations[animation_idx].samplers.len() {
            let input = root.animations[animation_idx].samplers[sampler_idx].input;
            let output = root.animations[animation_idx].samplers[sampler_idx].output;
            let new_input = carry_forward_accessor(root, asset, buffer_index, bin, remap, input.value());
            let new_output = carry_forward_accessor(root, asset, buffer_index, bin, remap, output.value());
            root.animations[animation_idx].samplers[sampler_idx].input = new_input;
            root.animations[animation_idx].samplers[sampler_idx].output = new_output;
        }
    }

    for skin_idx in 0..root.skins.len() {
        if let Some(ibm) = root.skins[skin_idx].inverse_bind_matrices {
            let new_ibm = carry_forward_accessor(root, asset, buffer_index, bin, remap, ibm.value());
            root.skins[skin_idx].inverse_bind_matrices = Some(new_ibm);
        }
    }
}

fn carry_forward_accessor(
    root: &mut json::Root,
    asset: &Asset,
    buffer_index: Index<json::Buffer>,
    bin: &mut Vec<u8>,
    remap: &mut HashMap<usize, Index<Accessor>>,
    old_index: usize,
) -> Index<Accessor> {
    if let Some(&existing) = remap.get(&old_index) {
        return existing;
    }

    let bytes = asset.accessor_bytes(old_index).map(Cow::into_owned).unwrap_or_default();
    let view = push_view(root, bin, buffer_index, &bytes);

    let mut new_accessor = asset.root.accessors[old_index].clone();
    new_accessor.buffer_view = Some(view);
    new_accessor.byte_offset = None;
    new_accessor.sparse = None;

    let new_index = root.push(new_accessor);
    remap.insert(old_index, new_index);
    new_index
}

/// Re-encodes every image bound through a bufferView at `options.texture_scale`
/// (a no-op at `1.0`) and patches `root.images[i].buffer_view`/`mime_type` to
/// the freshly pushed copy. Images that fail to decode are left untouched
/// and flagged with an advisory rather than dropped.
fn carry_forward_images(
    root: &mut json::Root,
    asset: &Asset,
    buffer_index: Index<json::Buffer>,
    bin: &mut Vec<u8>,
    options: &Options,
    image_codec: &dyn ImageCodec,
    advisories: &mut Vec<Advisory>,
) {
    for image_idx in 0..root.images.len() {
        let Some(old_view) = asset.root.images.get(image_idx).and_then(|i| i.buffer_view) else { continue };
        let Ok(original_bytes) = asset.buffer_view_slice(old_view) else { continue };
        let mime = asset.root.images[image_idx].mime_type.as_ref().map(|m| m.0.as_str()).unwrap_or("image/png").to_string();

        let bytes = if options.texture_scale < 1.0 {
            match image_codec.resize(original_bytes, &mime, options.texture_scale) {
                Ok(resized) => resized.bytes,
                Err(e) => {
                    advisories.push(Advisory::new(
                        "texture",
                        format!("image {image_idx}: {e}, carrying original bytes forward unscaled"),
                    ));
                    original_bytes.to_vec()
                }
            }
        } else {
            original_bytes.to_vec()
        };

        let new_view = push_view(root, bin, buffer_index, &bytes);
        root.images[image_idx].buffer_view = Some(new_view);
    }
}
