//! Regression metrics against the label column of an upload.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionReport {
    /// Rows predicted
    pub rows: usize,
    /// Rows with a finite numeric label
    pub labelled: usize,
    pub rmse: Option<f64>,
    pub mae: Option<f64>,
    /// Coefficient of determination; `None` when labels have no variance
    pub r2: Option<f64>,
}

impl RegressionReport {
    pub fn compute(predictions: &[f64], labels: &[Option<f64>]) -> Self {
        let pairs: Vec<(f64, f64)> = predictions
            .iter()
            .zip(labels)
            .filter_map(|(p, l)| l.filter(|v| v.is_finite()).map(|l| (*p, l)))
            .collect();

        let n = pairs.len();
        if n == 0 {
            return Self {
                rows: predictions.len(),
                labelled: 0,
                rmse: None,
                mae: None,
                r2: None,
            };
        }

        let nf = n as f64;
        let ss_res: f64 = pairs.iter().map(|(p, l)| (p - l).powi(2)).sum();
        let abs_err: f64 = pairs.iter().map(|(p, l)| (p - l).abs()).sum();
        let label_mean = pairs.iter().map(|(_, l)| l).sum::<f64>() / nf;
        let ss_tot: f64 = pairs.iter().map(|(_, l)| (l - label_mean).powi(2)).sum();

        Self {
            rows: predictions.len(),
            labelled: n,
            rmse: Some((ss_res / nf).sqrt()),
            mae: Some(abs_err / nf),
            r2: (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot),
        }
    }
}
