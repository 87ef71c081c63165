use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::processors::DataCleaner;
use crate::utils::constants::{
    DEFAULT_API_URL, DEFAULT_CONFIG_FILE, DEFAULT_MISSING_THRESHOLD, DEFAULT_OUTPUT_DIR,
    DEFAULT_TIMEOUT_SECS, ENV_PREFIX, ZERO_SENTINEL_CHANNELS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub cleaning: CleaningSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningSettings {
    pub missing_threshold: f64,
    pub zero_sentinel_channels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    pub directory: PathBuf,
}

impl Settings {
    /// Defaults, then the TOML file (explicit path must exist, the default
    /// `air-quality.toml` is optional), then `AIRQ_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Self::defaults_builder()?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cleaning.zero_sentinel_channels")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    fn defaults_builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let sentinels: Vec<String> = ZERO_SENTINEL_CHANNELS
            .iter()
            .map(|c| c.to_string())
            .collect();

        Ok(Config::builder()
            .set_default("api.base_url", DEFAULT_API_URL)?
            .set_default("api.timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("cleaning.missing_threshold", DEFAULT_MISSING_THRESHOLD)?
            .set_default("cleaning.zero_sentinel_channels", sentinels)?
            .set_default("output.directory", DEFAULT_OUTPUT_DIR)?)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            cleaning: CleaningSettings {
                missing_threshold: DEFAULT_MISSING_THRESHOLD,
                zero_sentinel_channels: ZERO_SENTINEL_CHANNELS
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            },
            output: OutputSettings {
                directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            },
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CleaningSettings {
    pub fn cleaner(&self) -> DataCleaner {
        DataCleaner::new()
            .with_missing_threshold(self.missing_threshold)
            .with_zero_sentinel_channels(self.zero_sentinel_channels.clone())
    }
}
