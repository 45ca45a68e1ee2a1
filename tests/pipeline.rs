//! End-to-end pipeline tests: run `optimize` over the in-memory fixtures in
//! `common` and check the invariants a caller can rely on regardless of
//! which concrete `Simplifier`/`BufferCodec`/`ImageCodec` is wired in.

mod common;

use gltf_optimize::json;
use json::accessor::ComponentType;
use json::mesh::Semantic;
use json::validation::Checked;

use gltf_optimize::pipeline::{CancellationToken, Capabilities};
use gltf_optimize::{container, DefaultBufferCodec, DefaultImageCodec, DefaultSimplifier, Options};

fn capabilities<'a>(
    simplifier: &'a DefaultSimplifier,
    buffer_codec: &'a DefaultBufferCodec,
    image_codec: &'a DefaultImageCodec,
) -> Capabilities<'a> {
    Capabilities { simplifier, buffer_codec, image_codec }
}

/// Quantized positions plus the node's folded-in affine must decode back
/// to (approximately) the original, untransformed coordinates.
#[test]
fn quantized_positions_round_trip_through_the_node_transform() {
    let bytes = common::triangle_glb();

    let mut options = Options::default();
    options.quantize_normals = false;
    options.quantize_tangents = false;
    options.quantize_uvs = false;
    options.meshopt_compression = false;
    options.optimize_vertex_cache = false;
    options.lod_levels = vec![1.0];

    let simplifier = DefaultSimplifier;
    let buffer_codec = DefaultBufferCodec;
    let image_codec = DefaultImageCodec;
    let caps = capabilities(&simplifier, &buffer_codec, &image_codec);
    let cancel = CancellationToken::new();

    let output = gltf_optimize::optimize(&bytes, &options, &caps, &cancel).expect("optimize");
    assert_eq!(output.lods.len(), 1);

    let asset = container::parse(&output.lods[0].glb).expect("reparse output");
    let mesh = &asset.root.meshes[0];
    let primitive = &mesh.primitives[0];

    let position_idx = asset
        .attribute(primitive, Semantic::Positions)
        .expect("POSITION attribute must survive quantization");
    let accessor = &asset.root.accessors[position_idx.value()];
    assert_eq!(accessor.component_type, Checked::Valid(json::accessor::GenericComponentType(ComponentType::I16)));

    let raw = asset.accessor_bytes(position_idx.value()).expect("position bytes");
    let mut quantized = Vec::with_capacity(3);
    for chunk in raw.chunks_exact(6) {
        let x = i16::from_le_bytes([chunk[0], chunk[1]]);
        let y = i16::from_le_bytes([chunk[2], chunk[3]]);
        let z = i16::from_le_bytes([chunk[4], chunk[5]]);
        quantized.push([x as f32, y as f32, z as f32]);
    }
    assert_eq!(quantized.len(), 3);

    let node = &asset.root.nodes[0];
    let scale = node.scale.unwrap_or([1.0, 1.0, 1.0]);
    let translation = node.translation.unwrap_or([0.0, 0.0, 0.0]);
    assert!(node.matrix.is_none(), "a single unshared mesh must fold into TRS, not a matrix");

    let decoded: Vec<[f32; 3]> = quantized
        .iter()
        .map(|p| [p[0] * scale[0] + translation[0], p[1] * scale[1] + translation[1], p[2] * scale[2] + translation[2]])
        .collect();

    let original = [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    for (d, o) in decoded.iter().zip(original.iter()) {
        for axis in 0..3 {
            assert!((d[axis] - o[axis]).abs() < 1e-3, "decoded {d:?} too far from original {o:?}");
        }
    }
}

/// Duplicate vertices along the shared diagonal must collapse, and the
/// index buffer must stay a valid permutation of the resulting vertex set.
#[test]
fn duplicate_vertices_are_deduplicated() {
    let bytes = common::quad_glb_with_duplicate_vertices();

    let mut options = Options::default();
    options.meshopt_compression = false;
    options.quantize_positions = false;
    options.lod_levels = vec![1.0];

    let simplifier = DefaultSimplifier;
    let buffer_codec = DefaultBufferCodec;
    let image_codec = DefaultImageCodec;
    let caps = capabilities(&simplifier, &buffer_codec, &image_codec);
    let cancel = CancellationToken::new();

    let output = gltf_optimize::optimize(&bytes, &options, &caps, &cancel).expect("optimize");
    let asset = container::parse(&output.lods[0].glb).expect("reparse output");
    let primitive = &asset.root.meshes[0].primitives[0];

    let position_idx = asset.attribute(primitive, Semantic::Positions).unwrap();
    let vertex_count = asset.root.accessors[position_idx.value()].count.0 as usize;
    assert_eq!(vertex_count, 4, "6 duplicated corners collapse to 4 unique positions");

    let index_idx = primitive.indices.expect("indices must survive");
    let indices = asset.read_indices(index_idx).expect("read indices");
    assert_eq!(indices.len(), 6, "triangle count is unaffected by vertex dedupe");
    assert!(indices.iter().all(|&i| (i as usize) < vertex_count));
    let max = indices.iter().copied().max().unwrap();
    assert_eq!(max as usize + 1, vertex_count, "every deduplicated vertex must still be referenced");
}

/// Triangle count must be non-increasing across descending LOD ratios, and
/// bounded above by the ratio applied to the source triangle count.
#[test]
fn lod_chain_triangle_counts_are_monotonic_and_bounded() {
    let bytes = common::fan_glb(1000);

    let mut options = Options::default();
    options.meshopt_compression = false;
    options.quantize_positions = false;
    // A flat, coplanar fan can be collapsed with near-zero geometric error,
    // so a generous threshold keeps this assertion independent of exactly
    // how aggressively the bundled simplifier is willing to act by default.
    options.lod_error_threshold = 1.0;
    options.lod_levels = vec![1.0, 0.5, 0.25];

    let simplifier = DefaultSimplifier;
    let buffer_codec = DefaultBufferCodec;
    let image_codec = DefaultImageCodec;
    let caps = capabilities(&simplifier, &buffer_codec, &image_codec);
    let cancel = CancellationToken::new();

    let output = gltf_optimize::optimize(&bytes, &options, &caps, &cancel).expect("optimize");
    assert_eq!(output.lods.len(), 3);

    let triangle_counts: Vec<usize> = output
        .lods
        .iter()
        .map(|lod| {
            let asset = container::parse(&lod.glb).expect("reparse lod output");
            let primitive = &asset.root.meshes[0].primitives[0];
            let index_idx = primitive.indices.expect("indices");
            asset.root.accessors[index_idx.value()].count.0 as usize / 3
        })
        .collect();

    assert_eq!(triangle_counts.len(), 3);
    assert!(triangle_counts[0] >= triangle_counts[1], "{triangle_counts:?}");
    assert!(triangle_counts[1] >= triangle_counts[2], "{triangle_counts:?}");

    let original = triangle_counts[0];
    for (ratio, &count) in output.lods.iter().map(|l| l.ratio).zip(triangle_counts.iter()) {
        let bound = (original as f32 * ratio).ceil() as usize + 1;
        assert!(count <= bound, "ratio {ratio}: {count} triangles exceeds bound {bound}");
    }
}

/// Running the same input through the same options twice must produce
/// byte-identical output: nothing in the pipeline may depend on wall-clock
/// time, iteration order over a hash map, or other non-deterministic state.
#[test]
fn identical_input_and_options_produce_identical_output() {
    let bytes = common::triangle_glb();
    let options = Options::default();

    let simplifier = DefaultSimplifier;
    let buffer_codec = DefaultBufferCodec;
    let image_codec = DefaultImageCodec;
    let caps = capabilities(&simplifier, &buffer_codec, &image_codec);

    let first = gltf_optimize::optimize(&bytes, &options, &caps, &CancellationToken::new()).expect("first run");
    let second = gltf_optimize::optimize(&bytes, &options, &caps, &CancellationToken::new()).expect("second run");

    assert_eq!(first.lods.len(), second.lods.len());
    for (a, b) in first.lods.iter().zip(second.lods.iter()) {
        assert_eq!(a.ratio, b.ratio);
        assert_eq!(a.glb, b.glb, "identical input/options must yield byte-identical output");
    }
}

/// A cancellation token that is already cancelled before the call starts
/// must short-circuit before any work is attempted.
#[test]
fn pre_cancelled_token_aborts_immediately() {
    let bytes = common::triangle_glb();
    let options = Options::default();

    let simplifier = DefaultSimplifier;
    let buffer_codec = DefaultBufferCodec;
    let image_codec = DefaultImageCodec;
    let caps = capabilities(&simplifier, &buffer_codec, &image_codec);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = gltf_optimize::optimize(&bytes, &options, &caps, &cancel).expect_err("must be cancelled");
    assert!(matches!(err, gltf_optimize::Error::Cancelled));
}
