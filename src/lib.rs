//! RetinaFace face-detection inference graph on the Burn framework.
//!
//! The crate builds the fixed RetinaFace topology (ResNet-50 pre-activation
//! backbone, three-level feature pyramid, SSH context modules, per-scale
//! class/box/landmark heads) and binds pretrained per-layer weights into it:
//!
//! ```ignore
//! use retinaface_burn::{RetinaFace, RetinaFaceConfig, WeightStore};
//!
//! let store = WeightStore::load("retinaface-r50.safetensors")?;
//! let model: RetinaFace<MyBackend> =
//!     RetinaFace::from_store(&store, &RetinaFaceConfig::default(), &device)?;
//! let outputs = model.forward(image)?; // (batch, h, w, 3), any h/w >= 32
//! ```
//!
//! The built model is an immutable pure function of its input: one build
//! serves arbitrary image sizes and concurrent callers. Anchor decoding, NMS
//! and image pre/post-processing are out of scope.

pub mod error;
pub mod model;
pub mod weights;

pub use error::{
    BuildError, Error, LoadError, MissingWeightError, ShapeMismatchError, WeightKind,
};
pub use model::{
    crop_to_match, fold_class_scores, unfold_class_scores, FaceOutputs, RetinaFace,
    RetinaFaceConfig, ScaleOutputs, Upsample, BN_EPSILON,
};
pub use weights::{BnWeights, ConvWeights, LayerWeights, WeightStore};
