use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ml::ModelDims;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files under a local directory
    Local,
    /// S3-compatible HTTP endpoint
    Http,
    /// In-process map (development only)
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the local backend
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Endpoint for the http backend (e.g., "https://s3.eu-west-1.amazonaws.com")
    #[serde(default)]
    pub base_url: Option<String>,
    /// Bucket name, appended to base_url for the http backend
    #[serde(default)]
    pub bucket: Option<String>,
    /// Request timeout in seconds for the http backend
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/uploads")
}

fn default_storage_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the persisted weights blob
    pub weights_path: PathBuf,
    #[serde(default = "default_input_dim")]
    pub input_dim: usize,
    #[serde(default = "default_hidden_dim")]
    pub hidden_dim: usize,
    #[serde(default = "default_latent_dim")]
    pub latent_dim: usize,
    #[serde(default = "default_drop_rate")]
    pub drop_rate: f64,
}

fn default_input_dim() -> usize {
    691
}

fn default_hidden_dim() -> usize {
    512
}

fn default_latent_dim() -> usize {
    128
}

fn default_drop_rate() -> f64 {
    0.5
}

impl ModelConfig {
    pub fn dims(&self) -> ModelDims {
        ModelDims {
            input: self.input_dim,
            hidden: self.hidden_dim,
            latent: self.latent_dim,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMode {
    /// Statistics computed from the uploaded batch itself
    #[default]
    Batch,
    /// Statistics loaded from a file (training-set mean/std)
    Fixed,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NormalizationConfig {
    #[serde(default)]
    pub mode: NormalizationMode,
    /// JSON file with `mean` and `std` arrays, required for fixed mode
    #[serde(default)]
    pub statistics_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("storage.backend", "local")?
            .set_default("storage.root", "data/uploads")?
            .set_default("storage.timeout_secs", 30)?
            .set_default("model.weights_path", "best_model.json")?
            .set_default("normalization.mode", "batch")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("HC50_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (HC50__STORAGE__BUCKET, etc.)
            .add_source(
                Environment::with_prefix("HC50")
                    .separator("__")
                    .try_parsing(true),
            )
            // Deployment topology exports the bucket as BUCKET_NAME
            .set_override_option("storage.bucket", std::env::var("BUCKET_NAME").ok())?;

        builder.build()?.try_deserialize()
    }

    /// Create a default configuration for CLI usage
    pub fn default_config(weights_path: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            storage: StorageConfig {
                backend: StorageBackend::Local,
                root: default_storage_root(),
                base_url: None,
                bucket: None,
                timeout_secs: default_storage_timeout(),
            },
            model: ModelConfig {
                weights_path: weights_path.into(),
                input_dim: default_input_dim(),
                hidden_dim: default_hidden_dim(),
                latent_dim: default_latent_dim(),
                drop_rate: default_drop_rate(),
            },
            normalization: NormalizationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let dims = self.model.dims();
        if dims.input == 0 || dims.hidden == 0 || dims.latent == 0 {
            errors.push("model dimensions must all be > 0".to_string());
        }

        if !(0.0..1.0).contains(&self.model.drop_rate) {
            errors.push("model.drop_rate must be in [0, 1)".to_string());
        }

        if self.storage.backend == StorageBackend::Http && self.storage.base_url.is_none() {
            errors.push("storage.base_url is required for the http backend".to_string());
        }

        if self.storage.timeout_secs == 0 {
            errors.push("storage.timeout_secs must be positive".to_string());
        }

        if self.normalization.mode == NormalizationMode::Fixed
            && self.normalization.statistics_path.is_none()
        {
            errors.push("normalization.statistics_path is required in fixed mode".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
