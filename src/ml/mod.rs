//! Lightweight ML inference (deploy-safe, CPU-only).
//!
//! Pure `f64` arithmetic so predictions match the precision the weights were
//! fitted in, without any GPU/toolchain complexity.

pub mod autoencoder;
pub mod dense;

pub use autoencoder::{
    AutoEncoder, ForwardOutput, ModelDims, ModelMode, WeightsBlob, PREDICTION_DIM,
};
pub use dense::{Activation, DenseLayer};
