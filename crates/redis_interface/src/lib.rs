//! Intermediate module to encapsulate all the redis related functionality
//!
//! Provides structs to represent a redis connection pool and the redis
//! commands used by the service crate, with configuration based types.

#![forbid(unsafe_code)]

pub mod commands;
pub mod errors;
pub mod types;

use std::sync::{atomic, Arc};

use common_utils::errors::CustomResult;
use error_stack::{IntoReport, ResultExt};
use fred::interfaces::ClientLike;
use router_env::logger;

pub use self::{commands::*, types::*};

/// A pool of connections to the Redis deployment, plus the effective
/// configuration the commands layer reads its defaults from.
pub struct RedisConnectionPool {
    pub pool: fred::pool::RedisPool,
    pub(crate) config: RedisConfig,
    join_handles: Vec<fred::types::ConnectHandle>,
    pub is_redis_available: Arc<atomic::AtomicBool>,
}

impl std::fmt::Debug for RedisConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConnectionPool")
            .field("is_redis_available", &self.is_redis_available)
            .finish_non_exhaustive()
    }
}

impl RedisConnectionPool {
    /// Create a new Redis connection
    pub async fn new(conf: &RedisSettings) -> CustomResult<Self, errors::RedisError> {
        let redis_connection_url = match conf.cluster_enabled {
            // Fred relies on this format for specifying cluster where the host port is ignored
            // and only query parameters are used for node addresses
            true => format!(
                "redis-cluster://{}:{}?{}",
                conf.host,
                conf.port,
                conf.cluster_urls
                    .iter()
                    .flat_map(|url| vec!["&", url])
                    .skip(1)
                    .collect::<String>()
            ),
            false => format!("redis://{}:{}", conf.host, conf.port),
        };
        let mut config = fred::types::RedisConfig::from_url(&redis_connection_url)
            .into_report()
            .change_context(errors::RedisError::RedisConnectionError)?;

        if !conf.use_legacy_version {
            config.version = fred::types::RespVersion::RESP3;
        }
        config.tracing = true;
        config.blocking = fred::types::Blocking::Error;
        let policy = fred::types::ReconnectPolicy::new_constant(
            conf.reconnect_max_attempts,
            conf.reconnect_delay,
        );

        let pool = fred::pool::RedisPool::new(config, conf.pool_size)
            .into_report()
            .change_context(errors::RedisError::RedisConnectionError)?;

        let join_handles = pool.connect(Some(policy));
        pool.wait_for_connect()
            .await
            .into_report()
            .change_context(errors::RedisError::RedisConnectionError)?;

        let config = RedisConfig::from(conf);

        Ok(Self {
            pool,
            config,
            join_handles,
            is_redis_available: Arc::new(atomic::AtomicBool::new(true)),
        })
    }

    /// Drain the pool and wait for the connection tasks to finish.
    pub async fn close_connections(&mut self) {
        self.pool.quit_pool().await;
        for handle in self.join_handles.drain(..) {
            match handle.await {
                Ok(Ok(_)) => (),
                Ok(Err(error)) => logger::error!(%error),
                Err(error) => logger::error!(%error),
            };
        }
    }

    /// Monitor the pool for errors, flipping the availability flag when the
    /// connection drops so callers can fall back to durable storage.
    pub async fn on_error(&self) {
        use futures::StreamExt;

        self.pool
            .on_error()
            .for_each(|err| {
                logger::error!("{err:?}");
                if self.pool.state() == fred::types::ClientState::Disconnected {
                    self.is_redis_available
                        .store(false, atomic::Ordering::SeqCst);
                }
                futures::future::ready(())
            })
            .await;
    }
}

pub(crate) struct RedisConfig {
    pub(crate) default_ttl: u32,
    pub(crate) default_hash_ttl: u32,
}

impl From<&RedisSettings> for RedisConfig {
    fn from(config: &RedisSettings) -> Self {
        Self {
            default_ttl: config.default_ttl,
            default_hash_ttl: config.default_hash_ttl,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_redis_error_display() {
        let error = errors::RedisError::SetHashFailed.to_string();

        assert_eq!(error, "Failed to set hash in Redis".to_string())
    }
}
