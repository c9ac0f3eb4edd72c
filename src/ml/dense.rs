//! Dense (fully-connected) layer inference (CPU-only, f64).
//!
//! Weights follow the `[out_dim][in_dim]` row layout, so a layer exported
//! from a trained linear transform can be loaded without transposition.
//!
//! Design goals:
//! - Stable, deterministic, dependency-light.
//! - Explicit shape validation (fail fast at load, never at request time).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Linear
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weights shape: [out_dim][in_dim]
    pub weights: Vec<Vec<f64>>,
    /// Bias shape: [out_dim]
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    pub fn new(weights: Vec<Vec<f64>>, bias: Vec<f64>, activation: Activation) -> Self {
        Self {
            weights,
            bias,
            activation,
        }
    }

    pub fn in_dim(&self) -> usize {
        self.weights.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn out_dim(&self) -> usize {
        self.weights.len()
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.iter().map(Vec::len).sum::<usize>() + self.bias.len()
    }

    /// Check the layer against the shape it is expected to have.
    pub fn validate(
        &self,
        name: &str,
        expected_in: usize,
        expected_out: usize,
    ) -> std::result::Result<(), String> {
        if self.out_dim() != expected_out {
            return Err(format!(
                "{name}.weight has {} rows, expected {expected_out}",
                self.out_dim()
            ));
        }
        if self.bias.len() != expected_out {
            return Err(format!(
                "{name}.bias len {} != out_dim {expected_out}",
                self.bias.len()
            ));
        }
        for (r, row) in self.weights.iter().enumerate() {
            if row.len() != expected_in {
                return Err(format!(
                    "{name}.weight row {r} len {} != expected in_dim {expected_in}",
                    row.len()
                ));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(format!("{name}.weight contains non-finite values"));
            }
        }
        if self.bias.iter().any(|v| !v.is_finite()) {
            return Err(format!("{name}.bias contains non-finite values"));
        }
        Ok(())
    }

    /// `activation(W x + b)`. The caller guarantees `input.len() == in_dim`.
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        debug_assert_eq!(input.len(), self.in_dim());

        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| {
                let mut sum = *bias;
                for (w, x) in row.iter().zip(input) {
                    sum += w * x;
                }
                apply_activation(sum, self.activation)
            })
            .collect()
    }
}

fn apply_activation(x: f64, act: Activation) -> f64 {
    match act {
        Activation::Linear => x,
        Activation::Relu => x.max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_linear_and_relu() {
        let linear = DenseLayer::new(
            vec![vec![1.0, 2.0], vec![-1.0, 0.5]],
            vec![0.5, 0.0],
            Activation::Linear,
        );
        assert_eq!(linear.forward(&[1.0, 1.0]), vec![3.5, -0.5]);

        let relu = DenseLayer {
            activation: Activation::Relu,
            ..linear
        };
        assert_eq!(relu.forward(&[1.0, 1.0]), vec![3.5, 0.0]);
    }

    #[test]
    fn validates_shapes() {
        let layer = DenseLayer::new(vec![vec![1.0, 2.0]], vec![0.0], Activation::Linear);
        assert!(layer.validate("l1", 2, 1).is_ok());

        let err = layer.validate("l1", 3, 1).unwrap_err();
        assert!(err.contains("l1.weight"));

        let bad_bias = DenseLayer::new(vec![vec![1.0, 2.0]], vec![0.0, 1.0], Activation::Linear);
        assert!(bad_bias.validate("l2", 2, 1).is_err());
    }

    #[test]
    fn rejects_non_finite_weights() {
        let layer = DenseLayer::new(vec![vec![f64::NAN]], vec![0.0], Activation::Linear);
        assert!(layer.validate("l1", 1, 1).is_err());
    }

    #[test]
    fn parameter_count_includes_bias() {
        let layer = DenseLayer::new(vec![vec![0.0; 3]; 2], vec![0.0; 2], Activation::Relu);
        assert_eq!(layer.parameter_count(), 8);
    }
}
