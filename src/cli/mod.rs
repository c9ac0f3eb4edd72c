//! hc50 CLI
//!
//! Commands:
//! - `hc50 serve` - Run the prediction HTTP service
//! - `hc50 predict` - Predict a local descriptor CSV
//! - `hc50 evaluate` - Predict and score against the label column
//! - `hc50 inspect-model` - Show weights blob layer shapes

pub mod model;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// HC50 prediction service CLI
#[derive(Parser, Debug)]
#[command(name = "hc50")]
#[command(author, version, about = "HC50 toxicity-endpoint prediction service")]
pub struct Cli {
    /// Configuration directory
    #[arg(short, long, global = true, default_value = "config", env = "HC50_CONFIG_DIR")]
    pub config: PathBuf,

    /// Weights blob, overrides `model.weights_path`
    #[arg(short, long, global = true)]
    pub weights: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the prediction HTTP service
    Serve {
        /// Bind address, overrides `server.host`
        #[arg(long)]
        host: Option<String>,
        /// Listen port, overrides `server.port`
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Predict every row of a local CSV and print a JSON array
    Predict {
        /// Descriptor CSV
        file: PathBuf,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Predict a local CSV and compare against its label column
    Evaluate {
        /// Descriptor CSV with measured labels in the second column
        file: PathBuf,
    },

    /// Load a weights blob and print its layer shapes
    InspectModel,
}
