//! Z-score normalization of descriptor matrices.
//!
//! The default [`BatchStatistics`] source computes mean/std from the very
//! batch being predicted. This reproduces the behaviour the deployed model
//! was served with, but it is suspect: a single-row upload normalizes to all
//! zeros and a skewed batch shifts every prediction. Use
//! [`FixedStatistics`] with training-set statistics once those are
//! available; the orchestrator only sees the [`StatisticsSource`] trait.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::table::read_table;
use super::FeatureMatrix;
use crate::error::{Hc50Error, Result};

/// Per-column mean and population standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStatistics {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl NormalizationStatistics {
    pub fn from_batch(matrix: &FeatureMatrix) -> Self {
        let n = matrix.n_rows() as f64;
        let mut mean = Vec::with_capacity(matrix.n_cols());
        let mut std = Vec::with_capacity(matrix.n_cols());

        for col in 0..matrix.n_cols() {
            let first = matrix.column(col).next().unwrap_or_default();
            // Constant columns get std 0 exactly; sum/n of e.g. 0.1 drifts by an ulp.
            if matrix.column(col).all(|x| x == first) {
                mean.push(first);
                std.push(0.0);
                continue;
            }

            let m = matrix.column(col).sum::<f64>() / n;
            let var = matrix.column(col).map(|x| (x - m) * (x - m)).sum::<f64>() / n;
            mean.push(m);
            std.push(var.sqrt());
        }

        Self { mean, std }
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.mean.is_empty() {
            return Err("statistics must not be empty".to_string());
        }
        if self.mean.len() != self.std.len() {
            return Err(format!(
                "mean length {} != std length {}",
                self.mean.len(),
                self.std.len()
            ));
        }
        if self.mean.iter().any(|v| !v.is_finite()) {
            return Err("mean must be finite".to_string());
        }
        if self.std.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("std must be finite and >= 0".to_string());
        }
        Ok(())
    }

    /// `(x - mean) / std` elementwise; every NaN or Inf result becomes 0.0.
    ///
    /// Returns the normalized matrix and how many values were masked.
    pub fn apply(&self, matrix: &FeatureMatrix) -> Result<(FeatureMatrix, usize)> {
        if matrix.n_cols() != self.width() {
            return Err(Hc50Error::MalformedInput(format!(
                "matrix has {} columns, statistics cover {}",
                matrix.n_cols(),
                self.width()
            )));
        }

        let mut out = matrix.clone();
        let n_cols = self.width();
        let mut masked = 0usize;
        for (idx, value) in out.values_mut().iter_mut().enumerate() {
            let col = idx % n_cols;
            let z = (*value - self.mean[col]) / self.std[col];
            *value = if z.is_finite() {
                z
            } else {
                masked += 1;
                0.0
            };
        }

        Ok((out, masked))
    }
}

/// Where normalization statistics come from.
pub trait StatisticsSource: Send + Sync + Debug {
    fn statistics(&self, descriptors: &FeatureMatrix) -> Result<NormalizationStatistics>;

    fn name(&self) -> &'static str;
}

/// Statistics of the request batch itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchStatistics;

impl StatisticsSource for BatchStatistics {
    fn statistics(&self, descriptors: &FeatureMatrix) -> Result<NormalizationStatistics> {
        Ok(NormalizationStatistics::from_batch(descriptors))
    }

    fn name(&self) -> &'static str {
        "batch"
    }
}

/// Precomputed statistics, e.g. from the training set.
#[derive(Debug, Clone)]
pub struct FixedStatistics {
    stats: NormalizationStatistics,
}

impl FixedStatistics {
    pub fn new(stats: NormalizationStatistics) -> Result<Self> {
        stats.validate().map_err(Hc50Error::Validation)?;
        Ok(Self { stats })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let stats: NormalizationStatistics = serde_json::from_str(&content)?;
        Self::new(stats)
    }
}

impl StatisticsSource for FixedStatistics {
    fn statistics(&self, _descriptors: &FeatureMatrix) -> Result<NormalizationStatistics> {
        Ok(self.stats.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Normalizer output: the model-ready matrix plus the passthrough columns.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub matrix: FeatureMatrix,
    /// Descriptor column names, in matrix column order
    pub descriptor_names: Vec<String>,
    /// Columns removed for containing missing values
    pub dropped_columns: Vec<String>,
    pub identifiers: Vec<String>,
    pub labels: Vec<String>,
    /// Count of NaN/Inf values replaced by 0.0
    pub masked_values: usize,
}

impl NormalizedBatch {
    pub fn numeric_labels(&self) -> Vec<Option<f64>> {
        self.labels
            .iter()
            .map(|l| l.trim().parse::<f64>().ok())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FeatureNormalizer {
    source: Arc<dyn StatisticsSource>,
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(BatchStatistics))
    }
}

impl FeatureNormalizer {
    pub fn new(source: Arc<dyn StatisticsSource>) -> Self {
        Self { source }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Parse raw CSV bytes and produce the normalized descriptor matrix.
    pub fn normalize(&self, raw: &[u8]) -> Result<NormalizedBatch> {
        let table = read_table(raw)?;
        let stats = self.source.statistics(&table.descriptors)?;
        let (matrix, masked_values) = stats.apply(&table.descriptors)?;

        if masked_values > 0 {
            debug!(
                masked_values,
                source = self.source.name(),
                "masked non-finite normalized values"
            );
        }

        Ok(NormalizedBatch {
            matrix,
            descriptor_names: table.descriptor_names,
            dropped_columns: table.dropped_columns,
            identifiers: table.identifiers,
            labels: table.labels,
            masked_values,
        })
    }
}
