//! Optional TOML configuration for the CLI.
//!
//! Command-line flags win over file values; the file only widens defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

const MAX_CONFIG_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub extract: Option<ExtractConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ExtractConfig {
    pub recursive: Option<bool>,
    pub include_backups: Option<bool>,
    pub sequential: Option<bool>,
    pub force: Option<bool>,
    pub glob: Option<String>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let len = fs::metadata(path)
            .with_context(|| format!("config file not readable: {}", path.display()))?
            .len();
        if len > MAX_CONFIG_BYTES {
            return Err(anyhow!("config file exceeds {} bytes", MAX_CONFIG_BYTES));
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("config file not readable: {}", path.display()))?;
        Self::parse(&data)
    }

    fn parse(data: &str) -> anyhow::Result<Self> {
        toml::from_str(data).context("invalid config file")
    }
}
