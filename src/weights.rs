//! Pretrained-weight store.
//!
//! The archive is a flat safetensors file whose keys follow the source
//! framework's naming, `<layer>.<param>`:
//!
//! - convolution `N`: `N.weight` as `[kh, kw, cin, cout]` (channels-last
//!   kernel layout), optionally `N.bias` as `[cout]`;
//! - batch norm `N`: `N.gamma`, `N.beta`, `N.running_mean`, `N.running_var`,
//!   all `[channels]`.
//!
//! Loading groups the flat keys into per-layer entries, upcasts F16/BF16
//! payloads to F32 and validates the structure of every entry. The resulting
//! [`WeightStore`] is read-only; graph construction binds against it by exact
//! layer name.

use std::collections::HashMap;
use std::path::Path;

use burn::tensor::TensorData;
use half::{bf16, f16};
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};

use crate::error::{LoadError, MissingWeightError, WeightKind};

/// Learned parameters of a convolution layer, still in the archive's
/// channels-last kernel layout.
#[derive(Debug, Clone)]
pub struct ConvWeights {
    /// `[kh, kw, cin, cout]`.
    pub kernel: TensorData,
    /// `[cout]`, absent for convolutions followed by batch norm in the
    /// backbone.
    pub bias: Option<TensorData>,
}

/// Learned parameters and running statistics of a batch-norm layer.
#[derive(Debug, Clone)]
pub struct BnWeights {
    pub gamma: TensorData,
    pub beta: TensorData,
    pub running_mean: TensorData,
    pub running_var: TensorData,
}

/// Parameters stored under one layer name.
#[derive(Debug, Clone)]
pub enum LayerWeights {
    Conv(ConvWeights),
    Bn(BnWeights),
}

/// Immutable mapping from layer name to its parameter tensors.
#[derive(Debug, Clone)]
pub struct WeightStore {
    layers: HashMap<String, LayerWeights>,
}

impl WeightStore {
    /// Reads and validates a safetensors weights archive.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path.as_ref())?;
        let store = Self::from_bytes(&bytes)?;
        log::info!(
            "loaded {} layers from {}",
            store.len(),
            path.as_ref().display()
        );
        Ok(store)
    }

    /// Parses an in-memory safetensors archive.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        let archive = SafeTensors::deserialize(bytes)?;

        // Group `<layer>.<param>` keys per layer before kind-checking them.
        let mut grouped: HashMap<String, HashMap<String, TensorData>> = HashMap::new();
        for (key, view) in archive.tensors() {
            let (layer, param) = key
                .rsplit_once('.')
                .ok_or_else(|| LoadError::MalformedKey { key: key.clone() })?;
            match param {
                "weight" | "bias" | "gamma" | "beta" | "running_mean" | "running_var" => {}
                other => {
                    return Err(LoadError::UnknownParam {
                        key: key.clone(),
                        param: other.to_string(),
                    })
                }
            }
            let data = view_to_f32(&key, &view)?;
            grouped
                .entry(layer.to_string())
                .or_default()
                .insert(param.to_string(), data);
        }

        let mut layers = HashMap::with_capacity(grouped.len());
        for (name, params) in grouped {
            let entry = finalize_layer(&name, params)?;
            layers.insert(name, entry);
        }
        log::debug!("weight store holds {} layers", layers.len());
        Ok(Self { layers })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&LayerWeights> {
        self.layers.get(name)
    }

    /// Layer names present in the store, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    /// Looks up convolution weights, failing with the exact layer name if the
    /// entry is absent or of the wrong kind.
    pub fn conv(&self, name: &str) -> Result<&ConvWeights, MissingWeightError> {
        match self.layers.get(name) {
            Some(LayerWeights::Conv(w)) => Ok(w),
            _ => Err(MissingWeightError {
                layer: name.to_string(),
                kind: WeightKind::Convolution,
            }),
        }
    }

    /// Looks up batch-norm weights by exact layer name.
    pub fn bn(&self, name: &str) -> Result<&BnWeights, MissingWeightError> {
        match self.layers.get(name) {
            Some(LayerWeights::Bn(w)) => Ok(w),
            _ => Err(MissingWeightError {
                layer: name.to_string(),
                kind: WeightKind::BatchNorm,
            }),
        }
    }
}

/// Decodes a stored tensor into F32 `TensorData`, upcasting half-precision
/// payloads the way the loading adapter does for the pose model.
fn view_to_f32(key: &str, view: &TensorView<'_>) -> Result<TensorData, LoadError> {
    let shape = view.shape().to_vec();
    let raw = view.data();
    let values: Vec<f32> = match view.dtype() {
        Dtype::F32 => raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
        Dtype::F16 => raw
            .chunks_exact(2)
            .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32())
            .collect(),
        Dtype::BF16 => raw
            .chunks_exact(2)
            .map(|b| bf16::from_le_bytes([b[0], b[1]]).to_f32())
            .collect(),
        other => {
            return Err(LoadError::UnsupportedDtype {
                name: key.to_string(),
                dtype: format!("{other:?}"),
            })
        }
    };
    Ok(TensorData::new(values, shape))
}

/// Classifies one layer's grouped parameters as convolution or batch norm and
/// checks their structure.
fn finalize_layer(
    name: &str,
    mut params: HashMap<String, TensorData>,
) -> Result<LayerWeights, LoadError> {
    let inconsistent = |reason: String| LoadError::InconsistentLayer {
        layer: name.to_string(),
        reason,
    };

    let has_conv = params.contains_key("weight") || params.contains_key("bias");
    let has_bn = ["gamma", "beta", "running_mean", "running_var"]
        .iter()
        .any(|p| params.contains_key(*p));

    if has_conv && has_bn {
        return Err(inconsistent(
            "mixes convolution and batch-norm parameters".to_string(),
        ));
    }

    if has_conv {
        let kernel = params
            .remove("weight")
            .ok_or_else(|| inconsistent("has a bias but no kernel".to_string()))?;
        if kernel.shape.len() != 4 {
            return Err(inconsistent(format!(
                "kernel must be rank 4, got shape {:?}",
                kernel.shape
            )));
        }
        let bias = params.remove("bias");
        if let Some(bias) = &bias {
            if bias.shape.len() != 1 || bias.shape[0] != kernel.shape[3] {
                return Err(inconsistent(format!(
                    "bias shape {:?} does not match kernel output channels {}",
                    bias.shape, kernel.shape[3]
                )));
            }
        }
        return Ok(LayerWeights::Conv(ConvWeights { kernel, bias }));
    }

    let mut take = |param: &str| -> Result<TensorData, LoadError> {
        let data = params
            .remove(param)
            .ok_or_else(|| inconsistent(format!("missing batch-norm parameter `{param}`")))?;
        if data.shape.len() != 1 {
            return Err(inconsistent(format!(
                "batch-norm parameter `{param}` must be rank 1, got shape {:?}",
                data.shape
            )));
        }
        Ok(data)
    };

    let gamma = take("gamma")?;
    let beta = take("beta")?;
    let running_mean = take("running_mean")?;
    let running_var = take("running_var")?;

    let channels = gamma.shape[0];
    for (param, data) in [
        ("beta", &beta),
        ("running_mean", &running_mean),
        ("running_var", &running_var),
    ] {
        if data.shape[0] != channels {
            return Err(inconsistent(format!(
                "`{param}` has {} channels, `gamma` has {channels}",
                data.shape[0]
            )));
        }
    }

    Ok(LayerWeights::Bn(BnWeights {
        gamma,
        beta,
        running_mean,
        running_var,
    }))
}
