//! Offline model commands
//!
//! hc50 predict <csv>    - Predictions as a JSON array
//! hc50 evaluate <csv>   - RMSE / MAE / R² against the label column
//! hc50 inspect-model    - Layer shapes and parameter count

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::AppConfig;
use crate::inference::{Orchestrator, RegressionReport};
use crate::services::{build_context, load_model};

fn orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    let ctx = build_context(config).context("failed to initialize inference context")?;
    Ok(Orchestrator::new(ctx))
}

fn read_csv(file: &Path) -> Result<Vec<u8>> {
    std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))
}

pub fn predict_file(config: &AppConfig, file: &Path, pretty: bool) -> Result<()> {
    let raw = read_csv(file)?;
    let result = orchestrator(config)?.predict_bytes(&raw)?;

    let out = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{out}");
    Ok(())
}

pub fn evaluate_file(config: &AppConfig, file: &Path) -> Result<()> {
    let raw = read_csv(file)?;
    let (batch, result) = orchestrator(config)?.run(&raw)?;
    let report = RegressionReport::compute(&result.predictions, &batch.numeric_labels());

    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"));
    println!("\n\x1b[36m=== HC50 evaluation: {} ===\x1b[0m", file.display());
    println!("  Rows predicted:  {}", report.rows);
    println!("  Labelled rows:   {}", report.labelled);
    println!("  Descriptors:     {}", batch.descriptor_names.len());
    if !batch.dropped_columns.is_empty() {
        println!(
            "  Dropped:         {} ({})",
            batch.dropped_columns.len(),
            batch.dropped_columns.join(", ")
        );
    }
    println!("  Masked values:   {}", batch.masked_values);
    println!("  RMSE:            {}", fmt(report.rmse));
    println!("  MAE:             {}", fmt(report.mae));
    println!("  R²:              {}", fmt(report.r2));
    Ok(())
}

pub fn inspect_model(config: &AppConfig) -> Result<()> {
    let model = load_model(&config.model).with_context(|| {
        format!(
            "failed to load weights from {}",
            config.model.weights_path.display()
        )
    })?;

    println!("\n\x1b[36m=== {} ===\x1b[0m", config.model.weights_path.display());
    for (name, in_dim, out_dim) in model.layer_shapes() {
        println!("  {name:<10} {in_dim:>5} -> {out_dim:<5}");
    }
    println!("  Parameters: {}", model.parameter_count());
    println!("  Drop rate:  {} (inactive at inference)", model.drop_rate());
    if !model.metadata().is_null() {
        println!("  Metadata:   {}", model.metadata());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::WeightsBlob;

    fn config_with_weights(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default_config(dir.join("best_model.json"));
        config.model.input_dim = 2;
        config.model.hidden_dim = 3;
        config.model.latent_dim = 2;
        config.storage.root = dir.join("uploads");

        let blob = WeightsBlob::from_fn(config.model.dims(), |_, out, input| match input {
            Some(i) if i == out => 1.0,
            _ => 0.1,
        });
        std::fs::write(
            &config.model.weights_path,
            serde_json::to_vec(&blob).unwrap(),
        )
        .unwrap();
        config
    }

    #[test]
    fn commands_run_without_a_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_weights(dir.path());
        let csv = dir.path().join("table.csv");
        std::fs::write(&csv, "id,y,a,b\nx,1.0,1,2\nz,2.0,3,5\n").unwrap();

        predict_file(&config, &csv, false).unwrap();
        evaluate_file(&config, &csv).unwrap();
        inspect_model(&config).unwrap();
    }

    #[test]
    fn missing_csv_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_weights(dir.path());
        let err = predict_file(&config, &dir.path().join("absent.csv"), true).unwrap_err();
        assert!(err.to_string().contains("absent.csv"));
    }
}
