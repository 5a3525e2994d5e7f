//! Settings, layered from TOML files and environment overrides.

use common_utils::errors::CustomResult;
use error_stack::{IntoReport, ResultExt};
use masking::Secret;
use redis_interface::RedisSettings;
use router_env::logger::config::Log;
use serde::Deserialize;

/// Top-level service configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: Server,
    pub log: Log,
    pub redis: RedisSettings,
    pub bank: BankConfig,
    pub upi: UpiConfig,
    pub ifsc_sync: IfscSyncConfig,
}

/// Bind address of the (externally provided) HTTP layer.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Partner bank endpoint configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BankConfig {
    /// Base URL of the partner API gateway
    pub base_url: String,
    /// API key sent on every request
    pub api_key: Secret<String>,
    /// PSP handle suffixed to provisioned addresses, e.g. `kvb`
    pub psp_handle: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            base_url: "https://partner-gateway.example.bank".to_string(),
            api_key: Secret::new(String::new()),
            psp_handle: "kvb".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// UPI workflow configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpiConfig {
    /// Wait before the provisioning chain proceeds, giving the out-of-band
    /// binding SMS time to land at the bank. Seconds.
    pub long_sms_wait_time_secs: u64,
    /// TTL of the cached provisioning session. Matches the partner
    /// protocol's validity window. Seconds.
    pub session_ttl_secs: u64,
    /// TTL of the per-user advisory lock. Seconds.
    pub lock_ttl_secs: u64,
    /// Retries after the initial attempt for retryable bank codes.
    pub max_retry_attempts: u8,
}

impl Default for UpiConfig {
    fn default() -> Self {
        Self {
            long_sms_wait_time_secs: 40,
            session_ttl_secs: 600,
            lock_ttl_secs: 120,
            max_retry_attempts: crate::consts::MAX_BANK_RETRY_ATTEMPTS,
        }
    }
}

/// IFSC dataset mirror configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IfscSyncConfig {
    pub enabled: bool,
    /// Dataset URL, fetched through the bank transport
    pub source_url: String,
    /// How often the do-once-per-day gate is evaluated. Seconds.
    pub check_interval_secs: u64,
}

impl Default for IfscSyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source_url: "https://partner-gateway.example.bank/ifsc/dataset".to_string(),
            check_interval_secs: 3600,
        }
    }
}

/// Errors while assembling the configuration.
#[derive(Debug, thiserror::Error)]
#[error("Unable to construct application configuration")]
pub struct ConfigurationError;

impl Settings {
    /// Layer `config/{env}.toml` under `KVB_ROUTER__`-prefixed environment
    /// overrides.
    pub fn new() -> CustomResult<Self, ConfigurationError> {
        let environment = router_env::which();
        let config_path = router_env::workspace_path()
            .join("config")
            .join(format!("{}.toml", environment.config_file_name()));

        let config = config::Config::builder()
            .add_source(config::File::from(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("KVB_ROUTER")
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()
            .into_report()
            .change_context(ConfigurationError)?;

        config
            .try_deserialize()
            .into_report()
            .change_context(ConfigurationError)
    }

    /// Fail fast on configuration that cannot work.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.bank.base_url.is_empty() {
            return Err("bank base_url must not be empty");
        }
        self.redis.validate()
    }
}
