//! Mesh optimization and LOD generation for glTF-Binary (`.glb`) assets.
//!
//! Parses a `.glb`, runs an optimization pipeline over its mesh primitives
//! (deduplication, cache-oblivious reordering, importance-aware
//! simplification, attribute quantization, buffer compression), and
//! re-emits a `.glb` at one or more level-of-detail ratios.

pub use gltf_json as json;

pub mod binary;
pub mod capability;
pub mod container;
pub mod error;
pub mod importance;
pub mod lod;
pub mod options;
pub mod pipeline;
pub mod quantize;
pub mod simplify;
pub mod writer;

pub use capability::{BufferCodec, DefaultBufferCodec, DefaultImageCodec, DefaultSimplifier, ImageCodec, Simplifier};
pub use container::{Asset, ContainerError};
pub use error::{Advisory, Error};
pub use lod::{LodChain, LodEntry};
pub use options::Options;
pub use pipeline::optimize;
