use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Tracing filter directive used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;

        if config.telegram.bot_token.trim().is_empty() {
            bail!("telegram.bot_token must not be empty");
        }

        config.log_filter()?;

        Ok(config)
    }

    /// Build the log filter from the configured level.
    pub fn log_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_new(&self.log_level)
            .with_context(|| format!("Cannot parse log level: {}", self.log_level))
    }
}
