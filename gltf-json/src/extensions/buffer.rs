use crate::validation::{Checked, USize64};
use gltf_derive::Validate as DeriveValidate;
use serde::{de, ser};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// A buffer points to binary data representing geometry, animations, or skins.
#[derive(Clone, Debug, Default, Deserialize, Serialize, DeriveValidate)]
pub struct Buffer {}

/// The compression mode of an `EXT_meshopt_compression` bufferView.
///
/// Index buffers use `Triangles`; vertex attribute buffers use `Attributes`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Delta-coded triangle indices (logical element stride of 4 bytes).
    Triangles,
    /// Per-attribute delta coding at the buffer view's native element stride.
    Attributes,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Attributes
    }
}

impl ser::Serialize for Mode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_str(match *self {
            Mode::Triangles => "TRIANGLES",
            Mode::Attributes => "ATTRIBUTES",
        })
    }
}

impl<'de> de::Deserialize<'de> for Checked<Mode> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct Visitor;
        impl<'de> de::Visitor<'de> for Visitor {
            type Value = Checked<Mode>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "TRIANGLES or ATTRIBUTES")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(match value {
                    "TRIANGLES" => Checked::Valid(Mode::Triangles),
                    "ATTRIBUTES" => Checked::Valid(Mode::Attributes),
                    _ => Checked::Invalid,
                })
            }
        }
        deserializer.deserialize_str(Visitor)
    }
}

/// The `EXT_meshopt_compression` payload attached to a `bufferView`.
///
/// The bufferView it decorates still describes the *compressed* bytes
/// (`byteOffset`/`byteLength` into the glTF buffer); this struct restates
/// the logical, decompressed shape of the stream so a consumer that doesn't
/// support the extension can at least see a well-formed (if undecodable)
/// view.
#[derive(Clone, Debug, Deserialize, Serialize, DeriveValidate)]
pub struct View {
    /// The buffer the compressed bytes ultimately decode from.
    pub buffer: crate::Index<crate::Buffer>,

    /// Offset into `buffer`, in bytes, of the compressed bytes.
    #[serde(rename = "byteOffset", default)]
    pub byte_offset: USize64,

    /// Length of the compressed byte range.
    #[serde(rename = "byteLength")]
    pub byte_length: USize64,

    /// Stride, in bytes, of one decompressed element.
    #[serde(rename = "byteStride")]
    pub byte_stride: USize64,

    /// Number of elements encoded.
    pub count: USize64,

    /// Whether this view holds delta-coded triangle indices or per-attribute data.
    #[serde(default)]
    pub mode: Checked<Mode>,

    /// Optional filter applied before the generic encoding (unused by the
    /// writer in this crate, but accepted on decode so third-party encoders'
    /// output round-trips instead of being rejected).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}
