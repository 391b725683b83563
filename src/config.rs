//! Configuration file handling
//!
//! Settings come from a TOML file, looked up in this order: an explicit
//! `--config` path, `./poolshare.toml`, then `poolshare/config.toml` under the
//! platform config directory. Missing files fall back to defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_TRANSACTIONS_FILE: &str = "transaction_data.csv";
pub const DEFAULT_VALUATIONS_FILE: &str = "account_value_data.csv";
pub const LOCAL_CONFIG_FILE: &str = "poolshare.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub inputs: InputsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InputsConfig {
    pub transactions: Option<PathBuf>,
    pub valuations: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. "info" or "poolshare=debug"
    pub level: Option<String>,
}

/// Input file locations after all overrides are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub transactions: PathBuf,
    pub valuations: PathBuf,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration file")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml(&text).with_context(|| format!("In config file {:?}", path))
    }

    /// Load the first config file found; an explicit path must exist
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        for candidate in default_locations() {
            if candidate.is_file() {
                debug!("Using config file {:?}", candidate);
                return Self::load_from(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Resolve input paths: flags beat environment, environment beats the file
    pub fn input_paths(
        &self,
        transactions_flag: Option<&Path>,
        valuations_flag: Option<&Path>,
    ) -> InputPaths {
        let resolve = |flag: Option<&Path>, env_var: &str, file: &Option<PathBuf>, default: &str| {
            flag.map(Path::to_path_buf)
                .or_else(|| std::env::var_os(env_var).map(PathBuf::from))
                .or_else(|| file.clone())
                .unwrap_or_else(|| PathBuf::from(default))
        };

        InputPaths {
            transactions: resolve(
                transactions_flag,
                "POOLSHARE_TRANSACTIONS",
                &self.inputs.transactions,
                DEFAULT_TRANSACTIONS_FILE,
            ),
            valuations: resolve(
                valuations_flag,
                "POOLSHARE_VALUATIONS",
                &self.inputs.valuations,
                DEFAULT_VALUATIONS_FILE,
            ),
        }
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(config_home) = dir_spec::config_home() {
        locations.push(config_home.join("poolshare").join("config.toml"));
    }
    locations
}
