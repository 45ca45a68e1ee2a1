//! Shared in-memory asset builders for integration tests.
//!
//! Every fixture here hand-assembles a `gltf_json::Root` plus a packed
//! binary blob and round-trips it through `binary::Glb` the same way a
//! real `.glb` file on disk would arrive, so the pipeline under test never
//! knows the difference.

use gltf_optimize::json;
use json::accessor::{Accessor, ComponentType, GenericComponentType, Type};
use json::buffer::{self, Buffer, Stride};
use json::mesh::{Mesh, Mode, Primitive, Semantic};
use json::root::Push;
use json::scene::{Node, Scene};
use json::validation::{Checked, USize64};
use json::{Asset as AssetMetadata, Index, Root};

/// Accumulates attribute/index bytes into one packed buffer and emits
/// matching bufferViews/accessors as it goes.
pub struct BufferBuilder {
    bytes: Vec<u8>,
    root: Root,
    buffer: Index<Buffer>,
}

impl BufferBuilder {
    pub fn new() -> Self {
        let mut root = Root::default();
        root.asset = AssetMetadata {
            version: "2.0".to_string(),
            ..AssetMetadata::default()
        };
        // Placeholder; byte_length is patched in to reflect the final
        // packed size once every attribute has been pushed.
        let buffer = root.push(Buffer {
            byte_length: USize64(0),
            name: None,
            uri: None,
            extensions: None,
            extras: Default::default(),
        });
        BufferBuilder { bytes: Vec::new(), root, buffer }
    }

    fn push_view(&mut self, data: &[u8]) -> Index<buffer::View> {
        let byte_offset = self.bytes.len();
        self.bytes.extend_from_slice(data);
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        self.root.push(buffer::View {
            buffer: self.buffer,
            byte_length: USize64(data.len() as u64),
            byte_offset: Some(USize64(byte_offset as u64)),
            byte_stride: None,
            name: None,
            target: None,
            extensions: None,
            extras: Default::default(),
        })
    }

    pub fn push_positions(&mut self, data: &[[f32; 3]]) -> Index<Accessor> {
        let mut bytes = Vec::with_capacity(data.len() * 12);
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in data {
            for (i, &c) in p.iter().enumerate() {
                bytes.extend_from_slice(&c.to_le_bytes());
                min[i] = min[i].min(c);
                max[i] = max[i].max(c);
            }
        }
        let view = self.push_view(&bytes);
        self.root.push(Accessor {
            buffer_view: Some(view),
            byte_offset: Some(USize64(0)),
            count: USize64(data.len() as u64),
            component_type: Checked::Valid(GenericComponentType(ComponentType::F32)),
            extensions: None,
            extras: Default::default(),
            type_: Checked::Valid(Type::Vec3),
            min: Some(serde_json::json!(min)),
            max: Some(serde_json::json!(max)),
            name: None,
            normalized: false,
            sparse: None,
        })
    }

    pub fn push_vec3(&mut self, data: &[[f32; 3]]) -> Index<Accessor> {
        let mut bytes = Vec::with_capacity(data.len() * 12);
        for v in data {
            for &c in v {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        let view = self.push_view(&bytes);
        self.root.push(Accessor {
            buffer_view: Some(view),
            byte_offset: Some(USize64(0)),
            count: USize64(data.len() as u64),
            component_type: Checked::Valid(GenericComponentType(ComponentType::F32)),
            extensions: None,
            extras: Default::default(),
            type_: Checked::Valid(Type::Vec3),
            min: None,
            max: None,
            name: None,
            normalized: false,
            sparse: None,
        })
    }

    pub fn push_vec4(&mut self, data: &[[f32; 4]]) -> Index<Accessor> {
        let mut bytes = Vec::with_capacity(data.len() * 16);
        for v in data {
            for &c in v {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        let view = self.push_view(&bytes);
        self.root.push(Accessor {
            buffer_view: Some(view),
            byte_offset: Some(USize64(0)),
            count: USize64(data.len() as u64),
            component_type: Checked::Valid(GenericComponentType(ComponentType::F32)),
            extensions: None,
            extras: Default::default(),
            type_: Checked::Valid(Type::Vec4),
            min: None,
            max: None,
            name: None,
            normalized: false,
            sparse: None,
        })
    }

    pub fn push_vec2(&mut self, data: &[[f32; 2]]) -> Index<Accessor> {
        let mut bytes = Vec::with_capacity(data.len() * 8);
        for v in data {
            for &c in v {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        let view = self.push_view(&bytes);
        self.root.push(Accessor {
            buffer_view: Some(view),
            byte_offset: Some(USize64(0)),
            count: USize64(data.len() as u64),
            component_type: Checked::Valid(GenericComponentType(ComponentType::F32)),
            extensions: None,
            extras: Default::default(),
            type_: Checked::Valid(Type::Vec2),
            min: None,
            max: None,
            name: None,
            normalized: false,
            sparse: None,
        })
    }

    pub fn push_indices(&mut self, data: &[u16]) -> Index<Accessor> {
        let mut bytes = Vec::with_capacity(data.len() * 2);
        for &i in data {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        let view = self.push_view(&bytes);
        self.root.push(Accessor {
            buffer_view: Some(view),
            byte_offset: Some(USize64(0)),
            count: USize64(data.len() as u64),
            component_type: Checked::Valid(GenericComponentType(ComponentType::U16)),
            extensions: None,
            extras: Default::default(),
            type_: Checked::Valid(Type::Scalar),
            min: None,
            max: None,
            name: None,
            normalized: false,
            sparse: None,
        })
    }

    pub fn finish(mut self, primitive: Primitive) -> (Root, Vec<u8>) {
        let mesh = self.root.push(Mesh {
            extensions: None,
            extras: Default::default(),
            name: None,
            primitives: vec![primitive],
            weights: None,
        });
        let node = self.root.push(Node {
            camera: None,
            children: None,
            extensions: None,
            extras: Default::default(),
            matrix: None,
            mesh: Some(mesh),
            name: None,
            rotation: None,
            scale: None,
            translation: None,
            skin: None,
            weights: None,
        });
        let scene = self.root.push(Scene {
            extensions: None,
            extras: Default::default(),
            name: None,
            nodes: vec![node],
        });
        self.root.scene = Some(scene);
        self.root.buffers[self.buffer.value()].byte_length = USize64(self.bytes.len() as u64);
        (self.root, self.bytes)
    }
}

/// Avoid an unused-import warning on `Stride` when no test exercises a
/// non-default `byteStride`.
#[allow(dead_code)]
fn _use_stride(_: Stride) {}

/// A single right triangle in the XY plane: `POSITION`, `NORMAL`, and
/// `TEXCOORD_0`, indexed, triangle-list mode.
pub fn triangle_glb() -> Vec<u8> {
    let mut builder = BufferBuilder::new();
    let positions = builder.push_positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let normals = builder.push_vec3(&[[0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]]);
    let uvs = builder.push_vec2(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
    let indices = builder.push_indices(&[0, 1, 2]);

    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert(Checked::Valid(Semantic::Positions), positions);
    attributes.insert(Checked::Valid(Semantic::Normals), normals);
    attributes.insert(Checked::Valid(Semantic::TexCoords(0)), uvs);

    let primitive = Primitive {
        attributes,
        extensions: None,
        extras: Default::default(),
        indices: Some(indices),
        material: None,
        mode: Checked::Valid(Mode::Triangles),
        targets: None,
    };

    let (root, bin) = builder.finish(primitive);
    to_glb(&root, &bin)
}

/// A quad (two triangles sharing an edge) with duplicated vertices along
/// the shared edge, so dedupe has something to collapse.
pub fn quad_glb_with_duplicate_vertices() -> Vec<u8> {
    let mut builder = BufferBuilder::new();
    // Two independent triangles, each with its own 3 vertices; vertices 1
    // and 2 of the second triangle exactly match vertices 1 and 2 of the
    // first (i.e. the shared diagonal is duplicated, not indexed).
    let positions = builder.push_positions(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]);
    let indices = builder.push_indices(&[0, 1, 2, 3, 4, 5]);

    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert(Checked::Valid(Semantic::Positions), positions);

    let primitive = Primitive {
        attributes,
        extensions: None,
        extras: Default::default(),
        indices: Some(indices),
        material: None,
        mode: Checked::Valid(Mode::Triangles),
        targets: None,
    };

    let (root, bin) = builder.finish(primitive);
    to_glb(&root, &bin)
}

/// A denser disc-shaped fan (`slices` triangles around a center vertex),
/// large enough that a 0.5 ratio simplification actually has triangles to
/// remove.
pub fn fan_glb(slices: usize) -> Vec<u8> {
    let mut builder = BufferBuilder::new();
    let mut positions = vec![[0.0f32, 0.0, 0.0]];
    for i in 0..slices {
        let theta = (i as f32) / (slices as f32) * std::f32::consts::TAU;
        positions.push([theta.cos(), theta.sin(), 0.0]);
    }
    let mut indices = Vec::with_capacity(slices * 3);
    for i in 0..slices {
        let a = 1 + i as u16;
        let b = 1 + ((i + 1) % slices) as u16;
        indices.extend_from_slice(&[0u16, a, b]);
    }

    let positions_idx = builder.push_positions(&positions);
    let indices_idx = builder.push_indices(&indices);

    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert(Checked::Valid(Semantic::Positions), positions_idx);

    let primitive = Primitive {
        attributes,
        extensions: None,
        extras: Default::default(),
        indices: Some(indices_idx),
        material: None,
        mode: Checked::Valid(Mode::Triangles),
        targets: None,
    };

    let (root, bin) = builder.finish(primitive);
    to_glb(&root, &bin)
}

fn to_glb(root: &Root, bin: &[u8]) -> Vec<u8> {
    let json = root.to_vec().expect("fixture root always serializes");
    let glb = gltf_optimize::binary::Glb {
        header: gltf_optimize::binary::Header {
            magic: *b"glTF",
            version: 2,
            length: 0,
        },
        json: std::borrow::Cow::Owned(json),
        bin: if bin.is_empty() {
            None
        } else {
            Some(std::borrow::Cow::Borrowed(bin))
        },
    };
    glb.to_vec().expect("fixture serializes to a GLB byte vector")
}
