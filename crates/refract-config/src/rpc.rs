//! Dispatcher behavior switches.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 64 MiB.
const fn default_max_upload_bytes() -> u64 {
    64 * 1024 * 1024
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RpcConfig {
    /// Forward notifications to every other connected client.
    #[serde(default = "default_true")]
    pub rebroadcast_notifications: bool,

    /// Validate params against the endpoint schema before decoding.
    #[serde(default)]
    pub validate_params: bool,

    /// Largest binary upload a client may announce.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Indent schemas printed by `rfx schema`.
    #[serde(default)]
    pub pretty_schemas: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            rebroadcast_notifications: default_true(),
            validate_params: false,
            max_upload_bytes: default_max_upload_bytes(),
            pretty_schemas: false,
        }
    }
}

impl RpcConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::invalid(
                "rpc.max_upload_bytes",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = RpcConfig::default();
        assert!(config.rebroadcast_notifications);
        assert!(!config.validate_params);
        assert_eq!(config.max_upload_bytes, 67_108_864);
        assert!(!config.pretty_schemas);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_upload_limit_is_rejected() {
        let config = RpcConfig {
            max_upload_bytes: 0,
            ..RpcConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
