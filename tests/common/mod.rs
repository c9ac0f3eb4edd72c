#![allow(dead_code)]

use hc50::adapters::MemoryBlobStore;
use hc50::features::FeatureNormalizer;
use hc50::inference::InferenceContext;
use hc50::ml::{AutoEncoder, ModelDims, WeightsBlob};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Small deterministic weights with mixed signs so ReLUs are exercised.
pub fn weights(dims: ModelDims) -> WeightsBlob {
    WeightsBlob::from_fn(dims, |layer, out, input| {
        let salt = layer.len();
        match input {
            Some(i) => (((out + 1) * 31 + (i + 1) * 17 + salt * 7) % 13) as f64 / 13.0 - 0.4,
            None => ((out + salt) % 5) as f64 * 0.02,
        }
    })
}

pub fn model(dims: ModelDims) -> AutoEncoder {
    AutoEncoder::from_blob(dims, 0.5, weights(dims)).expect("test weights should load")
}

pub fn write_weights(dir: &Path, dims: ModelDims) -> PathBuf {
    let path = dir.join("best_model.json");
    let bytes = serde_json::to_vec(&weights(dims)).expect("serialize weights");
    std::fs::write(&path, bytes).expect("write weights");
    path
}

pub fn context(store: Arc<MemoryBlobStore>, dims: ModelDims) -> InferenceContext {
    InferenceContext::new(store, Arc::new(model(dims)), FeatureNormalizer::default())
}

/// Seven descriptor columns; `d2` and `d5` have missing cells and get dropped.
pub const SCENARIO_CSV: &str = "\
CAS,HC50,d1,d2,d3,d4,d5,d6,d7
50-00-0,1.25,1,,2,3,7,4,5
64-17-5,2.50,2,9,2,2,NA,2,2
67-56-1,0.75,0,4,0,0,1,0,10
";

pub const SCENARIO_DESCRIPTORS: [[f64; 5]; 3] = [
    [1.0, 2.0, 3.0, 4.0, 5.0],
    [2.0, 2.0, 2.0, 2.0, 2.0],
    [0.0, 0.0, 0.0, 0.0, 10.0],
];
