//! Descriptor CSV ingestion.
//!
//! Layout: a header row, then one row per compound. After dropping every
//! column that has a missing value anywhere in the table, column 0 is the
//! compound identifier, column 1 the measured label and the rest are
//! descriptors. Descriptor order is kept positionally.

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use super::FeatureMatrix;
use crate::error::{Hc50Error, Result};

/// Cell values read as missing.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// A parsed upload with missing-value columns already removed.
#[derive(Debug, Clone)]
pub struct DescriptorTable {
    /// Names of the descriptor columns, in matrix order
    pub descriptor_names: Vec<String>,
    /// Names of the columns dropped for containing missing values
    pub dropped_columns: Vec<String>,
    pub identifiers: Vec<String>,
    pub labels: Vec<String>,
    /// Raw (unnormalized) descriptor values
    pub descriptors: FeatureMatrix,
}

impl DescriptorTable {
    /// Labels parsed as numbers; non-numeric labels become `None`.
    pub fn numeric_labels(&self) -> Vec<Option<f64>> {
        self.labels
            .iter()
            .map(|l| l.trim().parse::<f64>().ok())
            .collect()
    }
}

pub fn read_table(bytes: &[u8]) -> Result<DescriptorTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let records = reader
        .records()
        .collect::<std::result::Result<Vec<StringRecord>, csv::Error>>()?;

    if records.is_empty() {
        return Err(Hc50Error::MalformedInput("table has no data rows".to_string()));
    }

    let (kept, dropped): (Vec<usize>, Vec<usize>) = (0..headers.len())
        .partition(|&col| records.iter().all(|r| !r.get(col).map_or(true, is_missing)));

    if kept.len() < 3 {
        return Err(Hc50Error::MalformedInput(format!(
            "table needs an identifier, a label and at least one descriptor column, \
             found {} complete column(s)",
            kept.len()
        )));
    }

    let name = |col: usize| headers.get(col).unwrap_or_default().to_string();
    let dropped_columns: Vec<String> = dropped.iter().map(|&c| name(c)).collect();
    if !dropped_columns.is_empty() {
        debug!(
            dropped = dropped_columns.len(),
            "dropped columns with missing values"
        );
    }

    let (id_col, label_col, descriptor_cols) = (kept[0], kept[1], &kept[2..]);
    let n_cols = descriptor_cols.len();

    let mut identifiers = Vec::with_capacity(records.len());
    let mut labels = Vec::with_capacity(records.len());
    let mut values = Vec::with_capacity(records.len() * n_cols);

    for (row_idx, record) in records.iter().enumerate() {
        identifiers.push(record.get(id_col).unwrap_or_default().to_string());
        labels.push(record.get(label_col).unwrap_or_default().to_string());
        for &col in descriptor_cols {
            let cell = record.get(col).unwrap_or_default();
            let value = cell.parse::<f64>().map_err(|_| {
                Hc50Error::MalformedInput(format!(
                    "row {row_idx} column `{}` is not numeric",
                    name(col)
                ))
            })?;
            values.push(value);
        }
    }

    Ok(DescriptorTable {
        descriptor_names: descriptor_cols.iter().map(|&c| name(c)).collect(),
        dropped_columns,
        identifiers,
        labels,
        descriptors: FeatureMatrix::new(values, records.len(), n_cols)?,
    })
}
