use super::schema::ResolverConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./pinpoint.yaml
    /// 2. ~/.pinpoint/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<ResolverConfig, ConfigError> {
        let local_config = PathBuf::from("./pinpoint.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".pinpoint").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(ResolverConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<ResolverConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), "Loaded resolver config");
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn parse(content: &str) -> Result<ResolverConfig, ConfigError> {
        let config: ResolverConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
