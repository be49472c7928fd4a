use std::fs;
use std::path::Path;

use crate::shared::errors::AppError;
use crate::shared::types::WatchConfig;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file, or defaults when the file is absent
    pub fn load<P: AsRef<Path>>(path: P) -> Result<WatchConfig, AppError> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {}", e)))?;
            toml::from_str(&content)
                .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))?
        } else {
            WatchConfig::default()
        };
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration before the core runs
    pub fn validate(config: &WatchConfig) -> Result<(), AppError> {
        if config.indices.is_empty() {
            return Err(AppError::ConfigError(
                "at least one index symbol is required".to_string(),
            ));
        }
        for index in &config.indices {
            if index.symbol.trim().is_empty() {
                return Err(AppError::ConfigError("empty index symbol".to_string()));
            }
        }
        if config.thresholds_pct.is_empty() {
            return Err(AppError::ConfigError(
                "at least one drawdown threshold is required".to_string(),
            ));
        }
        for &threshold in &config.thresholds_pct {
            if threshold == 0 || threshold >= 100 {
                return Err(AppError::ConfigError(format!(
                    "threshold must be strictly between 0 and 100, got {}",
                    threshold
                )));
            }
        }
        if config.history_years < 1 {
            return Err(AppError::ConfigError(format!(
                "history window must be at least 1 year, got {}",
                config.history_years
            )));
        }
        if config.check_interval_secs == 0 {
            return Err(AppError::ConfigError(
                "check interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
