//! Multi-head autoencoder used for HC50 regression.
//!
//! Topology (widths from [`ModelDims`]):
//!
//! ```text
//! x ── l1 ─ relu ─ dropout ── l2 ─ relu ──┬── l3 ─ relu ── l4 ──> reconstruction
//!                                         ├──────────────────────> embedding
//!                                         └── lpredict ──────────> prediction
//! ```
//!
//! Weights are loaded once from a JSON state dict and never change.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::dense::{Activation, DenseLayer};
use crate::error::{Hc50Error, Result};
use crate::features::FeatureMatrix;

/// Width of the prediction head.
pub const PREDICTION_DIM: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDims {
    pub input: usize,
    pub hidden: usize,
    pub latent: usize,
}

impl ModelDims {
    /// Widths of the trained HC50 model.
    pub const TRAINED: ModelDims = ModelDims {
        input: 691,
        hidden: 512,
        latent: 128,
    };
}

impl Default for ModelDims {
    fn default() -> Self {
        Self::TRAINED
    }
}

/// Whether dropout is active. Serving always uses `Eval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelMode {
    #[default]
    Eval,
    Train,
}

/// Persisted weights, keyed like the trained model's state dict.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightsBlob {
    #[serde(rename = "l1.weight")]
    pub l1_weight: Vec<Vec<f64>>,
    #[serde(rename = "l1.bias")]
    pub l1_bias: Vec<f64>,
    #[serde(rename = "l2.weight")]
    pub l2_weight: Vec<Vec<f64>>,
    #[serde(rename = "l2.bias")]
    pub l2_bias: Vec<f64>,
    #[serde(rename = "l3.weight")]
    pub l3_weight: Vec<Vec<f64>>,
    #[serde(rename = "l3.bias")]
    pub l3_bias: Vec<f64>,
    #[serde(rename = "l4.weight")]
    pub l4_weight: Vec<Vec<f64>>,
    #[serde(rename = "l4.bias")]
    pub l4_bias: Vec<f64>,
    #[serde(rename = "lpredict.weight")]
    pub lpredict_weight: Vec<Vec<f64>>,
    #[serde(rename = "lpredict.bias")]
    pub lpredict_bias: Vec<f64>,

    /// Optional free-form metadata (versioning, training info, etc).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl WeightsBlob {
    /// Build a blob of the given widths, filling every parameter from `f`.
    ///
    /// `f(layer, out, in)` is called with `in == None` for biases.
    pub fn from_fn<F>(dims: ModelDims, mut f: F) -> Self
    where
        F: FnMut(&str, usize, Option<usize>) -> f64,
    {
        let mut weight = |name: &str, out_dim: usize, in_dim: usize| -> Vec<Vec<f64>> {
            (0..out_dim)
                .map(|o| (0..in_dim).map(|i| f(name, o, Some(i))).collect())
                .collect()
        };
        let l1_weight = weight("l1", dims.hidden, dims.input);
        let l2_weight = weight("l2", dims.latent, dims.hidden);
        let l3_weight = weight("l3", dims.hidden, dims.latent);
        let l4_weight = weight("l4", dims.input, dims.hidden);
        let lpredict_weight = weight("lpredict", PREDICTION_DIM, dims.latent);

        let mut bias = |name: &str, out_dim: usize| -> Vec<f64> {
            (0..out_dim).map(|o| f(name, o, None)).collect()
        };
        Self {
            l1_weight,
            l1_bias: bias("l1", dims.hidden),
            l2_weight,
            l2_bias: bias("l2", dims.latent),
            l3_weight,
            l3_bias: bias("l3", dims.hidden),
            l4_weight,
            l4_bias: bias("l4", dims.input),
            lpredict_weight,
            lpredict_bias: bias("lpredict", PREDICTION_DIM),
            metadata: serde_json::Value::Null,
        }
    }
}

/// The three heads of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOutput {
    pub reconstruction: Vec<f64>,
    pub embedding: Vec<f64>,
    pub prediction: f64,
}

#[derive(Debug, Clone)]
pub struct AutoEncoder {
    dims: ModelDims,
    l1: DenseLayer,
    l2: DenseLayer,
    l3: DenseLayer,
    l4: DenseLayer,
    lpredict: DenseLayer,
    drop_rate: f64,
    mode: ModelMode,
    metadata: serde_json::Value,
}

impl AutoEncoder {
    /// Build a model from a weights blob, checking every tensor shape.
    pub fn from_blob(dims: ModelDims, drop_rate: f64, blob: WeightsBlob) -> Result<Self> {
        if !(0.0..1.0).contains(&drop_rate) {
            return Err(Hc50Error::ModelLoad(format!(
                "drop rate {drop_rate} outside [0, 1)"
            )));
        }

        let l1 = DenseLayer::new(blob.l1_weight, blob.l1_bias, Activation::Relu);
        let l2 = DenseLayer::new(blob.l2_weight, blob.l2_bias, Activation::Relu);
        let l3 = DenseLayer::new(blob.l3_weight, blob.l3_bias, Activation::Relu);
        let l4 = DenseLayer::new(blob.l4_weight, blob.l4_bias, Activation::Linear);
        let lpredict = DenseLayer::new(
            blob.lpredict_weight,
            blob.lpredict_bias,
            Activation::Linear,
        );

        let checks = [
            ("l1", &l1, dims.input, dims.hidden),
            ("l2", &l2, dims.hidden, dims.latent),
            ("l3", &l3, dims.latent, dims.hidden),
            ("l4", &l4, dims.hidden, dims.input),
            ("lpredict", &lpredict, dims.latent, PREDICTION_DIM),
        ];
        for (name, layer, expected_in, expected_out) in checks {
            layer
                .validate(name, expected_in, expected_out)
                .map_err(Hc50Error::ModelLoad)?;
        }

        Ok(Self {
            dims,
            l1,
            l2,
            l3,
            l4,
            lpredict,
            drop_rate,
            mode: ModelMode::Eval,
            metadata: blob.metadata,
        })
    }

    /// Parse a serialized weights blob.
    pub fn from_slice(dims: ModelDims, drop_rate: f64, bytes: &[u8]) -> Result<Self> {
        let blob: WeightsBlob = serde_json::from_slice(bytes)
            .map_err(|e| Hc50Error::ModelLoad(format!("invalid weights blob: {e}")))?;
        Self::from_blob(dims, drop_rate, blob)
    }

    pub fn from_file<P: AsRef<Path>>(path: P, dims: ModelDims, drop_rate: f64) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Hc50Error::ModelLoad(format!("cannot read weights {}: {e}", path.display()))
        })?;
        let model = Self::from_slice(dims, drop_rate, &bytes)?;
        info!(
            path = %path.display(),
            input = dims.input,
            hidden = dims.hidden,
            latent = dims.latent,
            parameters = model.parameter_count(),
            "loaded autoencoder weights"
        );
        Ok(model)
    }

    pub fn with_mode(mut self, mode: ModelMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn dims(&self) -> ModelDims {
        self.dims
    }

    pub fn mode(&self) -> ModelMode {
        self.mode
    }

    pub fn drop_rate(&self) -> f64 {
        self.drop_rate
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn parameter_count(&self) -> usize {
        self.layers().iter().map(|(_, l)| l.parameter_count()).sum()
    }

    /// `(name, in_dim, out_dim)` for every layer.
    pub fn layer_shapes(&self) -> Vec<(&'static str, usize, usize)> {
        self.layers()
            .iter()
            .map(|(name, l)| (*name, l.in_dim(), l.out_dim()))
            .collect()
    }

    fn layers(&self) -> [(&'static str, &DenseLayer); 5] {
        [
            ("l1", &self.l1),
            ("l2", &self.l2),
            ("l3", &self.l3),
            ("l4", &self.l4),
            ("lpredict", &self.lpredict),
        ]
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width != self.dims.input {
            return Err(Hc50Error::MalformedInput(format!(
                "descriptor width {width} does not match model input width {}",
                self.dims.input
            )));
        }
        Ok(())
    }

    fn encode(&self, row: &[f64]) -> Vec<f64> {
        let mut h1 = self.l1.forward(row);
        if self.mode == ModelMode::Train && self.drop_rate > 0.0 {
            apply_dropout(&mut h1, self.drop_rate, &mut rand::thread_rng());
        }
        self.l2.forward(&h1)
    }

    fn predict_from_embedding(&self, embedding: &[f64]) -> f64 {
        self.lpredict.forward(embedding)[0]
    }

    /// Full forward pass over one descriptor row.
    pub fn forward(&self, row: &[f64]) -> Result<ForwardOutput> {
        self.check_width(row.len())?;

        let embedding = self.encode(row);
        let h2 = self.l3.forward(&embedding);
        let reconstruction = self.l4.forward(&h2);
        let prediction = self.predict_from_embedding(&embedding);

        Ok(ForwardOutput {
            reconstruction,
            embedding,
            prediction,
        })
    }

    /// Predictions for every row, in row order.
    ///
    /// Skips the decoder; each value equals `forward(row).prediction`.
    pub fn predict_batch(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>> {
        self.check_width(matrix.n_cols())?;

        Ok(matrix
            .rows()
            .map(|row| self.predict_from_embedding(&self.encode(row)))
            .collect())
    }
}

/// Inverted dropout: zero with probability `rate`, scale survivors by `1 / (1 - rate)`.
fn apply_dropout<R: Rng>(values: &mut [f64], rate: f64, rng: &mut R) {
    let scale = 1.0 / (1.0 - rate);
    for v in values.iter_mut() {
        if rng.gen::<f64>() < rate {
            *v = 0.0;
        } else {
            *v *= scale;
        }
    }
}
