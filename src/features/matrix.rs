use crate::error::{Hc50Error, Result};

/// Row-major matrix of descriptor values; every row has the same width.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl FeatureMatrix {
    pub fn new(values: Vec<f64>, n_rows: usize, n_cols: usize) -> Result<Self> {
        if n_rows == 0 || n_cols == 0 {
            return Err(Hc50Error::MalformedInput(format!(
                "feature matrix must be non-empty, got {n_rows}x{n_cols}"
            )));
        }
        if values.len() != n_rows * n_cols {
            return Err(Hc50Error::MalformedInput(format!(
                "feature matrix has {} values, expected {n_rows}x{n_cols}",
                values.len()
            )));
        }
        Ok(Self {
            values,
            n_rows,
            n_cols,
        })
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut values = Vec::with_capacity(n_rows * n_cols);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(Hc50Error::MalformedInput(format!(
                    "row {idx} has {} values, expected {n_cols}",
                    row.len()
                )));
            }
            values.extend(row);
        }
        Self::new(values, n_rows, n_cols)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, idx: usize) -> Option<&[f64]> {
        if idx >= self.n_rows {
            return None;
        }
        let start = idx * self.n_cols;
        Some(&self.values[start..start + self.n_cols])
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.n_cols)
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().skip(col).step_by(self.n_cols).copied()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }
}
