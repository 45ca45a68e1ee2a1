use gltf_derive::Validate;
use serde_derive::{Deserialize, Serialize};

/// Texture sampler properties for filtering and wrapping modes.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
pub struct Sampler {}

/// A texture and its sampler.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
pub struct Texture {}

/// Reference to a `Texture`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
pub struct Info {}
