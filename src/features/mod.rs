//! Descriptor table ingestion and normalization.

pub mod matrix;
pub mod normalizer;
pub mod table;

pub use matrix::FeatureMatrix;
pub use normalizer::{
    BatchStatistics, FeatureNormalizer, FixedStatistics, NormalizationStatistics,
    NormalizedBatch, StatisticsSource,
};
pub use table::{read_table, DescriptorTable};
