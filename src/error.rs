use std::fmt;

use crate::container::ContainerError;

/// Schema-level errors, scoped to a single primitive.
///
/// The pipeline aborts the primitive on one of these but the enclosing
/// `optimize` call aborts entirely (no partial asset is ever emitted).
#[derive(Debug)]
pub enum SchemaError {
    /// A primitive had no `POSITION` attribute.
    MissingPositionAttribute {
        /// Mesh index.
        mesh: usize,
        /// Primitive index within the mesh.
        primitive: usize,
    },
    /// An accessor, bufferView, or index referenced data outside the asset's
    /// binary blob.
    AccessorOutOfRange {
        /// The offending accessor's index.
        accessor: usize,
    },
    /// An accessor declared a `componentType`/`type` pair the pipeline does
    /// not know how to quantize or pass through.
    UnsupportedComponentType {
        /// The offending accessor's index.
        accessor: usize,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SchemaError::MissingPositionAttribute { mesh, primitive } => write!(
                f,
                "mesh {mesh} primitive {primitive} has no POSITION attribute"
            ),
            SchemaError::AccessorOutOfRange { accessor } => {
                write!(f, "accessor {accessor} addresses data outside the buffer")
            }
            SchemaError::UnsupportedComponentType { accessor } => {
                write!(f, "accessor {accessor} has an unsupported component type")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// Top-level error returned by [`crate::optimize`].
#[derive(Debug)]
pub enum Error {
    /// The input could not be parsed as binary glTF.
    Container(ContainerError),
    /// The parsed asset violates the subset of the glTF schema this crate
    /// understands.
    Schema(SchemaError),
    /// The caller's cancellation token fired; no output was produced.
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Container(e) => write!(f, "container error: {e}"),
            Error::Schema(e) => write!(f, "schema error: {e}"),
            Error::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Container(e) => Some(e),
            Error::Schema(e) => Some(e),
            Error::Cancelled => None,
        }
    }
}

impl From<ContainerError> for Error {
    fn from(e: ContainerError) -> Self {
        Error::Container(e)
    }
}

impl From<SchemaError> for Error {
    fn from(e: SchemaError) -> Self {
        Error::Schema(e)
    }
}

/// A capability that degraded during a call to [`crate::optimize`].
///
/// Capability failures (`Simplifier`/`BufferCodec`/`ImageCodec` errors) are
/// never fatal: the pipeline falls back to an identity transform and records
/// what happened here instead of returning an `Error`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advisory {
    /// Pipeline stage the degradation happened in, e.g. `"simplify"`.
    pub stage: &'static str,
    /// Human-readable detail, e.g. which mesh/primitive was affected.
    pub detail: String,
}

impl Advisory {
    /// Constructs a new advisory and logs it at `warn` level.
    pub fn new(stage: &'static str, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        log::warn!("{stage}: {detail}");
        Advisory { stage, detail }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.detail)
    }
}
