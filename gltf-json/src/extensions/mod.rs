/// Contains `Accessor` and other related data structures.
pub mod accessor;

/// Contains `Animation` and other related data structures.
pub mod animation;

/// Contains `Asset` metadata.
pub mod asset;

/// Contains `Buffer`, `View`, and the `EXT_meshopt_compression` payload.
pub mod buffer;

/// Contains `Camera` and other related data structures.
pub mod camera;

/// Contains `Image` and other related data structures.
pub mod image;

/// Contains `Material` and other related data structures.
pub mod material;

/// Contains `Mesh` and other related data structures.
pub mod mesh;

/// Contains `Root`.
pub mod root;

/// Contains `Scene`, `Node`, and other related data structures.
pub mod scene;

/// Contains `Skin` and other related data structures.
pub mod skin;

/// Contains `Texture`, `Sampler`, and other related data structures.
pub mod texture;

pub use self::root::Root;

/// The name used in `extensionsUsed`/`extensionsRequired` for quantized
/// vertex attributes (`POSITION` as `i8`/`i16`, `NORMAL`/`TANGENT` as
/// normalized `i8`, `TEXCOORD_n` as normalized `u16`).
pub const KHR_MESH_QUANTIZATION: &str = "KHR_mesh_quantization";

/// The name used in `extensionsUsed`/`extensionsRequired` for a bufferView
/// whose bytes are a meshopt-compressed vertex or index stream.
pub const EXT_MESHOPT_COMPRESSION: &str = "EXT_meshopt_compression";

/// Names of glTF 2.0 extensions supported by this library.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[KHR_MESH_QUANTIZATION, EXT_MESHOPT_COMPRESSION];
