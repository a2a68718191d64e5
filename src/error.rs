//! Error surface of the crate.
//!
//! Every failure is either a load-time problem with the weights archive, a
//! build-time binding problem, or a shape problem detected while wiring or
//! running the graph. None of these are transient; there is no retry path.

use thiserror::Error;

/// The weights archive could not be turned into a [`crate::WeightStore`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read weights archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed safetensors archive: {0}")]
    Format(#[from] safetensors::SafeTensorError),

    #[error("tensor `{name}` has unsupported dtype {dtype} (expected F32, F16 or BF16)")]
    UnsupportedDtype { name: String, dtype: String },

    #[error("key `{key}` does not follow the `<layer>.<param>` naming convention")]
    MalformedKey { key: String },

    #[error("key `{key}` names unknown parameter `{param}`")]
    UnknownParam { key: String, param: String },

    #[error("layer `{layer}` is structurally inconsistent: {reason}")]
    InconsistentLayer { layer: String, reason: String },
}

/// A layer name referenced during graph construction is absent from the
/// store, or is present with the wrong parameter kind.
#[derive(Debug, Error)]
#[error("no {kind} weights named `{layer}` in the store")]
pub struct MissingWeightError {
    /// Exact layer name the builder asked for.
    pub layer: String,
    /// What the builder expected to find under that name.
    pub kind: WeightKind,
}

/// Parameter kind a graph node binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightKind {
    Convolution,
    BatchNorm,
}

impl std::fmt::Display for WeightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightKind::Convolution => write!(f, "convolution"),
            WeightKind::BatchNorm => write!(f, "batch-norm"),
        }
    }
}

/// Two tensors met at an operation with incompatible shapes, or a stored
/// parameter does not match the shape the graph requires.
#[derive(Debug, Error)]
#[error("shape mismatch at `{op}`: expected {expected:?}, found {found:?}")]
pub struct ShapeMismatchError {
    /// Operation or layer name where the mismatch surfaced.
    pub op: String,
    pub expected: Vec<usize>,
    pub found: Vec<usize>,
}

impl ShapeMismatchError {
    pub(crate) fn new(op: impl Into<String>, expected: &[usize], found: &[usize]) -> Self {
        Self {
            op: op.into(),
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

/// Build-time failure: the store cannot fully bind the graph.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    MissingWeight(#[from] MissingWeightError),

    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatchError),
}

/// Umbrella error for the `load + build` convenience path.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatchError),
}
