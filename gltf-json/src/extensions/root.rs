use gltf_derive::Validate;
use serde_derive::{Deserialize, Serialize};

/// Root-level extension data. Neither `KHR_mesh_quantization` nor
/// `EXT_meshopt_compression` carry a root-level payload — both are declared
/// purely through `Root::extensions_used`/`extensions_required` — so this
/// struct exists only so unrecognized root extensions round-trip instead of
/// being rejected by serde.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
pub struct Root {}
