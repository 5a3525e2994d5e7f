//! An interface to abstract the `fred` commands used by the service.
//!
//! Only the key, hash and set-if-not-exists families are wrapped; every
//! wrapper translates the `fred` error into a [`RedisError`]
//! context so callers never see the client library's error type.

use std::collections::HashMap;

use common_utils::errors::CustomResult;
use error_stack::{IntoReport, ResultExt};
use fred::{
    interfaces::{HashesInterface, KeysInterface},
    types::{Expiration, RedisValue, SetOptions},
};
use router_env::{instrument, tracing};

use crate::{
    errors,
    types::{DelReply, SetnxReply},
    RedisConnectionPool,
};

impl RedisConnectionPool {
    /// `SET key value EX seconds`
    #[instrument(level = "DEBUG", skip(self, value))]
    pub async fn set_key_with_expiry<V>(
        &self,
        key: &str,
        value: V,
        seconds: i64,
    ) -> CustomResult<(), errors::RedisError>
    where
        V: TryInto<RedisValue> + std::fmt::Debug + Send,
        V::Error: Into<fred::error::RedisError> + Send,
    {
        self.pool
            .set(key, value, Some(Expiration::EX(seconds)), None, false)
            .await
            .into_report()
            .change_context(errors::RedisError::SetFailed)
    }

    /// `GET key`
    #[instrument(level = "DEBUG", skip(self))]
    pub async fn get_key(&self, key: &str) -> CustomResult<Option<String>, errors::RedisError> {
        self.pool
            .get(key)
            .await
            .into_report()
            .change_context(errors::RedisError::GetFailed)
    }

    /// `DEL key`
    #[instrument(level = "DEBUG", skip(self))]
    pub async fn delete_key(&self, key: &str) -> CustomResult<DelReply, errors::RedisError> {
        let reply: RedisValue = self
            .pool
            .del(key)
            .await
            .into_report()
            .change_context(errors::RedisError::DeleteFailed)?;

        DelReply::from_redis(reply)
    }

    /// `SET key value NX EX seconds`, the primitive underneath per-user
    /// advisory locks.
    #[instrument(level = "DEBUG", skip(self, value))]
    pub async fn set_key_if_not_exists_with_expiry<V>(
        &self,
        key: &str,
        value: V,
        seconds: Option<i64>,
    ) -> CustomResult<SetnxReply, errors::RedisError>
    where
        V: TryInto<RedisValue> + std::fmt::Debug + Send,
        V::Error: Into<fred::error::RedisError> + Send,
    {
        let reply: RedisValue = self
            .pool
            .set(
                key,
                value,
                Some(Expiration::EX(
                    seconds.unwrap_or(self.config.default_ttl.into()),
                )),
                Some(SetOptions::NX),
                false,
            )
            .await
            .into_report()
            .change_context(errors::RedisError::SetFailed)?;

        SetnxReply::from_redis(reply)
    }

    /// `HSET key field value [field value ...]` followed by an `EXPIRE`
    /// refresh. The TTL refresh applies to the whole hash, matching the
    /// session-window semantics of the partner protocol.
    #[instrument(level = "DEBUG", skip(self, values))]
    pub async fn set_hash_fields(
        &self,
        key: &str,
        values: Vec<(String, String)>,
        ttl: Option<i64>,
    ) -> CustomResult<(), errors::RedisError> {
        let values: HashMap<String, String> = values.into_iter().collect();

        let _added: i64 = self
            .pool
            .hset(key, values)
            .await
            .into_report()
            .change_context(errors::RedisError::SetHashFailed)?;

        // Setting the hash and setting its expiry cannot be done atomically;
        // losing the race leaves a keyless TTL, which expires harmlessly.
        self.set_expiry(key, ttl.unwrap_or(self.config.default_hash_ttl.into()))
            .await
    }

    /// `HGETALL key`; an empty map means the key is absent or expired.
    #[instrument(level = "DEBUG", skip(self))]
    pub async fn get_hash_fields(
        &self,
        key: &str,
    ) -> CustomResult<HashMap<String, String>, errors::RedisError> {
        self.pool
            .hgetall(key)
            .await
            .into_report()
            .change_context(errors::RedisError::GetHashFailed)
    }

    /// `HGET key field`
    #[instrument(level = "DEBUG", skip(self))]
    pub async fn get_hash_field(
        &self,
        key: &str,
        field: &str,
    ) -> CustomResult<Option<String>, errors::RedisError> {
        self.pool
            .hget(key, field)
            .await
            .into_report()
            .change_context(errors::RedisError::GetHashFieldFailed)
    }

    /// `EXPIRE key seconds`
    #[instrument(level = "DEBUG", skip(self))]
    pub async fn set_expiry(
        &self,
        key: &str,
        seconds: i64,
    ) -> CustomResult<(), errors::RedisError> {
        self.pool
            .expire(key, seconds)
            .await
            .into_report()
            .change_context(errors::RedisError::SetExpiryFailed)
    }
}
