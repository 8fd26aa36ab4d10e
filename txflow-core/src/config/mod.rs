pub mod constants;
pub mod profiles;
pub mod types;

pub use profiles::{Mode, ModeProfile};
pub use types::*;

use crate::core::ConfigError;
use anyhow::{Context, Result};
use ::config::{Config as ConfigLoader, Environment, File};
use std::path::Path;

impl PipelineConfig {
    /// Load configuration from file with optional environment variable overrides
    ///
    /// Missing keys fall back to `PipelineConfig::default()`. Environment
    /// variables use the `TXFLOW__` prefix with `__` as the nesting
    /// separator, e.g. `TXFLOW__REPORTER__ENABLED=true`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();

        let config = ConfigLoader::builder()
            // Load from TOML file
            .add_source(File::from(config_path))
            // Override with environment variables (TXFLOW__)
            .add_source(
                Environment::with_prefix("TXFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let cfg: PipelineConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        cfg.validate()
            .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

        Ok(cfg)
    }

    /// Load from default location (./config/txflow.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("config/txflow.toml")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_queue_size == 0 {
            return Err(ConfigError::NotPositive { field: "max_queue_size" });
        }

        if self.max_completed_size == 0 {
            return Err(ConfigError::NotPositive { field: "max_completed_size" });
        }

        if self.stats_interval_ms == 0 {
            return Err(ConfigError::NotPositive { field: "stats_interval_ms" });
        }

        if !(self.base_price > 0.0) {
            return Err(ConfigError::NotPositive { field: "base_price" });
        }

        let minimum = Mode::busiest_concurrency_limit() * constants::POOL_SIZE_MULTIPLIER;
        if self.pool_size < minimum {
            return Err(ConfigError::PoolTooSmall {
                pool_size: self.pool_size,
                minimum,
            });
        }

        let live_capacity = self.max_queue_size + Mode::busiest_concurrency_limit();
        if self.pool_size <= live_capacity {
            return Err(ConfigError::PoolBelowLiveCapacity {
                pool_size: self.pool_size,
                live_capacity,
            });
        }

        // Reporter settings only matter when reporting is on
        if self.reporter.enabled {
            let url = &self.reporter.base_url;
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidBaseUrl(url.clone()));
            }

            if self.reporter.simulation_id.trim().is_empty() {
                return Err(ConfigError::MissingSimulationId);
            }

            if self.reporter.timeout_ms == 0 {
                return Err(ConfigError::NotPositive { field: "reporter.timeout_ms" });
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.log_level.clone()));
        }

        Ok(())
    }

    /// Profile of the mode the pipeline starts in
    pub fn initial_profile(&self) -> ModeProfile {
        self.initial_mode.profile()
    }
}
