//! # refract-config
//!
//! Layered configuration loading for refract using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`REFRACT_*` prefix, `__` as separator)
//! 2. Project-level `.refract/config.toml`
//! 3. User-level `~/.config/refract/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `REFRACT_RPC__VALIDATE_PARAMS` -> `rpc.validate_params`,
//! `REFRACT_LOG__LEVEL` -> `log.level`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use refract_config::RefractConfig;
//!
//! let config = RefractConfig::load().expect("config");
//! if config.rpc.validate_params {
//!     println!("strict params");
//! }
//! ```

mod error;
mod log;
mod rpc;

pub use error::ConfigError;
pub use log::LogConfig;
pub use rpc::RpcConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RefractConfig {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl RefractConfig {
    /// Load and validate configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` when a source cannot be parsed and
    /// `ConfigError::InvalidValue` when a value is out of its domain.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Extract and validate from an arbitrary provider chain.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".refract/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("REFRACT_").split("__"))
    }

    /// Check value domains that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rpc.validate()?;
        self.log.validate()
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("refract").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RefractConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.rpc.rebroadcast_notifications);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config = RefractConfig::from_figment(&RefractConfig::figment())
                .expect("should extract defaults");
            assert_eq!(config, RefractConfig::default());
            Ok(())
        });
    }
}
