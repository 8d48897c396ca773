//! Layered configuration: built-in defaults, an optional TOML file, then
//! `ISD_STATS_*` environment variables (nested keys joined with `__`).

use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::analyzers::{AnomalyMode, StddevKind};
use crate::error::Result;
use crate::utils::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_CONFIG_FILE, ENV_PREFIX};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    pub anomaly: AnomalySettings,

    pub correlation: CorrelationSettings,

    #[validate(nested)]
    pub processing: ProcessingSettings,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalySettings {
    pub mode: AnomalyMode,
    pub stddev: StddevKind,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationSettings {
    /// Omit years with a constant series instead of failing
    pub skip_degenerate_years: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProcessingSettings {
    #[validate(range(min = 1))]
    pub max_workers: usize,

    #[validate(range(min = 1))]
    pub chunk_size: usize,

    pub use_mmap: bool,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            use_mmap: false,
        }
    }
}

impl Settings {
    /// Load settings from `path` (required when given) or from
    /// `isd-stats.toml` in the working directory when present, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::build(path, None)
    }

    fn build(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }
}
