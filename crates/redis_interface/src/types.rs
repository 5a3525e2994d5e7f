//! Configuration and reply types for the redis interface.

use common_utils::errors::CustomResult;
use error_stack::IntoReport;
use serde::Deserialize;

use crate::errors;

/// Redis settings, deserialized from the service configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub cluster_enabled: bool,
    pub cluster_urls: Vec<String>,
    pub use_legacy_version: bool,
    pub pool_size: usize,
    pub reconnect_max_attempts: u32,
    /// Reconnect delay in milliseconds
    pub reconnect_delay: u32,
    /// TTL in seconds for plain keys
    pub default_ttl: u32,
    /// TTL in seconds for hash keys; matches the partner protocol's
    /// session validity window
    pub default_hash_ttl: u32,
}

impl RedisSettings {
    /// Validate the settings before constructing a pool.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.host.is_empty() {
            return Err("redis host must not be empty");
        }
        if self.pool_size == 0 {
            return Err("redis pool size must be positive");
        }
        Ok(())
    }
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 6379,
            cluster_enabled: false,
            cluster_urls: Vec::new(),
            use_legacy_version: false,
            pool_size: 5,
            reconnect_max_attempts: 5,
            reconnect_delay: 5,
            default_ttl: 300,
            default_hash_ttl: 900,
        }
    }
}

/// Reply to a `SET ... NX` command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SetnxReply {
    /// The key was free and has been set
    KeySet,
    /// The key was already held
    KeyNotSet,
}

impl SetnxReply {
    pub(crate) fn from_redis(
        value: fred::types::RedisValue,
    ) -> CustomResult<Self, errors::RedisError> {
        match value {
            fred::types::RedisValue::String(status) if &*status == "OK" => Ok(Self::KeySet),
            fred::types::RedisValue::Null => Ok(Self::KeyNotSet),
            _ => Err(errors::RedisError::UnknownResult).into_report(),
        }
    }
}

/// Reply to a `DEL` command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DelReply {
    /// The key existed and has been removed
    KeyDeleted,
    /// No such key
    KeyNotDeleted,
}

impl DelReply {
    pub(crate) fn from_redis(
        value: fred::types::RedisValue,
    ) -> CustomResult<Self, errors::RedisError> {
        match value {
            fred::types::RedisValue::Integer(1) => Ok(Self::KeyDeleted),
            fred::types::RedisValue::Integer(0) => Ok(Self::KeyNotDeleted),
            _ => Err(errors::RedisError::UnknownResult).into_report(),
        }
    }
}
