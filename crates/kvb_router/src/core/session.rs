//! Short-lived provisioning session state, cache-backed with durable
//! fallback.
//!
//! The cache holds the per-user hash of protocol identifiers minted during
//! device binding. Client, server and login-ref ids also live on the durable
//! device row and survive cache expiry; the raw transaction id of an
//! in-flight binding exists only in cache, and losing it means the workflow
//! restarts from scratch.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use common_utils::errors::CustomResult;
use error_stack::ResultExt;
use router_env::logger;

use super::errors::{ApiErrorResponse, CacheError, RouterResult, StorageErrorExt};
use crate::{
    consts,
    db::{DeviceInterface, StorageInterface},
};

/// The per-attempt identifiers threaded through the binding protocol.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProvisioningSession {
    /// Mobile-mapping transaction id, cache-only
    pub transaction_id: Option<String>,
    /// Client id minted for the current binding attempt
    pub client_id: Option<String>,
    /// Server id issued by the partner during login/remap
    pub server_id: Option<String>,
    /// Login reference id issued by the partner
    pub login_ref_id: Option<String>,
}

impl ProvisioningSession {
    fn into_fields(self) -> Vec<(String, String)> {
        [
            (SessionField::TransactionId, self.transaction_id),
            (SessionField::ClientId, self.client_id),
            (SessionField::ServerId, self.server_id),
            (SessionField::LoginRefId, self.login_ref_id),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|value| (field.key().to_string(), value)))
        .collect()
    }

    fn from_fields(mut fields: HashMap<String, String>) -> Self {
        Self {
            transaction_id: fields.remove(SessionField::TransactionId.key()),
            client_id: fields.remove(SessionField::ClientId.key()),
            server_id: fields.remove(SessionField::ServerId.key()),
            login_ref_id: fields.remove(SessionField::LoginRefId.key()),
        }
    }
}

/// A single field of the provisioning session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionField {
    /// Mobile-mapping transaction id
    TransactionId,
    /// Client id
    ClientId,
    /// Server id
    ServerId,
    /// Login reference id
    LoginRefId,
}

impl SessionField {
    /// Hash field name in the cache.
    pub fn key(self) -> &'static str {
        match self {
            Self::TransactionId => "transaction_id",
            Self::ClientId => "client_id",
            Self::ServerId => "server_id",
            Self::LoginRefId => "login_ref_id",
        }
    }

    /// Whether the field also exists on the durable device row.
    fn has_durable_fallback(self) -> bool {
        !matches!(self, Self::TransactionId)
    }
}

/// Cache operations the session store needs. Implemented by the Redis pool
/// for deployments and by [`InMemorySessionCache`] for tests and degraded
/// mode.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Write hash fields under `key`, refreshing the TTL.
    async fn set_fields(
        &self,
        key: &str,
        fields: Vec<(String, String)>,
        ttl: Duration,
    ) -> CustomResult<(), CacheError>;

    /// Read all hash fields under `key`; empty map when absent or expired.
    async fn get_fields(&self, key: &str) -> CustomResult<HashMap<String, String>, CacheError>;

    /// Delete `key`, reporting whether it existed.
    async fn delete(&self, key: &str) -> CustomResult<bool, CacheError>;

    /// `SET key NX` with expiry; true when the key was free.
    async fn set_if_not_exists(&self, key: &str, ttl: Duration)
        -> CustomResult<bool, CacheError>;
}

#[async_trait]
impl SessionCache for redis_interface::RedisConnectionPool {
    async fn set_fields(
        &self,
        key: &str,
        fields: Vec<(String, String)>,
        ttl: Duration,
    ) -> CustomResult<(), CacheError> {
        self.set_hash_fields(key, fields, Some(ttl.as_secs().try_into().unwrap_or(i64::MAX)))
            .await
            .change_context(CacheError::OperationFailed)
    }

    async fn get_fields(&self, key: &str) -> CustomResult<HashMap<String, String>, CacheError> {
        self.get_hash_fields(key)
            .await
            .change_context(CacheError::OperationFailed)
    }

    async fn delete(&self, key: &str) -> CustomResult<bool, CacheError> {
        self.delete_key(key)
            .await
            .map(|reply| matches!(reply, redis_interface::DelReply::KeyDeleted))
            .change_context(CacheError::OperationFailed)
    }

    async fn set_if_not_exists(
        &self,
        key: &str,
        ttl: Duration,
    ) -> CustomResult<bool, CacheError> {
        self.set_key_if_not_exists_with_expiry(
            key,
            "locked",
            Some(ttl.as_secs().try_into().unwrap_or(i64::MAX)),
        )
        .await
        .map(|reply| matches!(reply, redis_interface::SetnxReply::KeySet))
        .change_context(CacheError::OperationFailed)
    }
}

/// In-memory implementation with real expiry semantics.
#[derive(Debug, Default)]
pub struct InMemorySessionCache {
    entries: std::sync::Mutex<HashMap<String, CacheEntry>>,
}

#[derive(Debug)]
struct CacheEntry {
    fields: HashMap<String, String>,
    expires_at: std::time::Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        std::time::Instant::now() >= self.expires_at
    }
}

#[async_trait]
impl SessionCache for InMemorySessionCache {
    async fn set_fields(
        &self,
        key: &str,
        fields: Vec<(String, String)>,
        ttl: Duration,
    ) -> CustomResult<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| error_stack::report!(CacheError::OperationFailed))?;
        let expires_at = std::time::Instant::now() + ttl;
        let entry = entries.entry(key.to_string()).or_insert_with(|| CacheEntry {
            fields: HashMap::new(),
            expires_at,
        });
        if entry.is_expired() {
            entry.fields.clear();
        }
        entry.fields.extend(fields);
        entry.expires_at = expires_at;
        Ok(())
    }

    async fn get_fields(&self, key: &str) -> CustomResult<HashMap<String, String>, CacheError> {
        let mut entries = self.entries.lock().map_err(|_| error_stack::report!(CacheError::OperationFailed))?;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Ok(entry.fields.clone()),
            Some(_) => {
                entries.remove(key);
                Ok(HashMap::new())
            }
            None => Ok(HashMap::new()),
        }
    }

    async fn delete(&self, key: &str) -> CustomResult<bool, CacheError> {
        let mut entries = self.entries.lock().map_err(|_| error_stack::report!(CacheError::OperationFailed))?;
        Ok(entries.remove(key).is_some())
    }

    async fn set_if_not_exists(
        &self,
        key: &str,
        ttl: Duration,
    ) -> CustomResult<bool, CacheError> {
        let mut entries = self.entries.lock().map_err(|_| error_stack::report!(CacheError::OperationFailed))?;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Ok(false),
            _ => {
                entries.insert(
                    key.to_string(),
                    CacheEntry {
                        fields: HashMap::new(),
                        expires_at: std::time::Instant::now() + ttl,
                    },
                );
                Ok(true)
            }
        }
    }
}

/// Store for per-user provisioning session state.
#[derive(Clone)]
pub struct SessionStateStore {
    cache: Arc<dyn SessionCache>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStateStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionStateStore {
    /// Build a store over the given cache with the protocol's session TTL.
    pub fn new(cache: Arc<dyn SessionCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn cache_key(user_id: &str) -> String {
        format!("{}{user_id}", consts::SESSION_KEY_PREFIX)
    }

    /// Write the given session fields, refreshing the TTL. Fields that are
    /// `None` are left untouched in the cache.
    pub async fn put(&self, user_id: &str, session: ProvisioningSession) -> RouterResult<()> {
        let fields = session.into_fields();
        if fields.is_empty() {
            return Ok(());
        }
        self.cache
            .set_fields(&Self::cache_key(user_id), fields, self.ttl)
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    /// Read the whole session; `None` when the key is absent or expired.
    pub async fn get(&self, user_id: &str) -> RouterResult<Option<ProvisioningSession>> {
        let fields = self
            .cache
            .get_fields(&Self::cache_key(user_id))
            .await
            .change_context(ApiErrorResponse::InternalServerError)?;
        if fields.is_empty() {
            Ok(None)
        } else {
            Ok(Some(ProvisioningSession::from_fields(fields)))
        }
    }

    /// Drop the session.
    pub async fn delete(&self, user_id: &str) -> RouterResult<()> {
        self.cache
            .delete(&Self::cache_key(user_id))
            .await
            .map(|_| ())
            .change_context(ApiErrorResponse::InternalServerError)
    }

    /// Resolve one field through the declared fallback chain: cache first,
    /// then the durable device row for fields that are persisted there.
    pub async fn resolve(
        &self,
        store: &dyn StorageInterface,
        user_id: &str,
        field: SessionField,
    ) -> RouterResult<Option<String>> {
        if let Some(session) = self.get(user_id).await? {
            let cached = match field {
                SessionField::TransactionId => session.transaction_id,
                SessionField::ClientId => session.client_id,
                SessionField::ServerId => session.server_id,
                SessionField::LoginRefId => session.login_ref_id,
            };
            if cached.is_some() {
                return Ok(cached);
            }
        }

        if !field.has_durable_fallback() {
            return Ok(None);
        }

        logger::debug!(field = field.key(), "session cache miss, falling back to device row");
        let device = match store.find_device_by_user_id(user_id).await {
            Ok(device) => device,
            Err(err) if err.current_context().is_db_not_found() => return Ok(None),
            Err(err) => {
                return Err(err).to_not_found_response(ApiErrorResponse::DeviceNotFound);
            }
        };

        Ok(match field {
            SessionField::TransactionId => None,
            SessionField::ClientId => device.client_id,
            SessionField::ServerId => device.server_id,
            SessionField::LoginRefId => device.login_ref_id,
        })
    }

    /// The cache behind this store, for callers that need lock primitives.
    pub fn cache(&self) -> Arc<dyn SessionCache> {
        self.cache.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ProvisioningSession {
        ProvisioningSession {
            transaction_id: Some("123456789012".to_string()),
            client_id: Some("1111222233334444".to_string()),
            server_id: Some("srv-1".to_string()),
            login_ref_id: Some("lrf-1".to_string()),
        }
    }

    #[tokio::test]
    async fn get_before_ttl_returns_exact_fields() {
        let store = SessionStateStore::new(
            Arc::new(InMemorySessionCache::default()),
            Duration::from_secs(60),
        );

        store.put("user-1", session()).await.expect("put");
        let read_back = store.get("user-1").await.expect("get");

        assert_eq!(read_back, Some(session()));
    }

    #[tokio::test]
    async fn get_after_ttl_expiry_returns_none() {
        let store = SessionStateStore::new(
            Arc::new(InMemorySessionCache::default()),
            Duration::from_millis(1),
        );

        store.put("user-1", session()).await.expect("put");
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(store.get("user-1").await.expect("get"), None);
    }

    #[tokio::test]
    async fn delete_removes_the_session() {
        let store = SessionStateStore::new(
            Arc::new(InMemorySessionCache::default()),
            Duration::from_secs(60),
        );

        store.put("user-1", session()).await.expect("put");
        store.delete("user-1").await.expect("delete");

        assert_eq!(store.get("user-1").await.expect("get"), None);
    }

    #[tokio::test]
    async fn partial_put_leaves_other_fields_in_place() {
        let store = SessionStateStore::new(
            Arc::new(InMemorySessionCache::default()),
            Duration::from_secs(60),
        );

        store.put("user-1", session()).await.expect("put");
        store
            .put(
                "user-1",
                ProvisioningSession {
                    server_id: Some("srv-2".to_string()),
                    login_ref_id: Some("lrf-2".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("partial put");

        let read_back = store.get("user-1").await.expect("get").expect("present");
        assert_eq!(read_back.client_id.as_deref(), Some("1111222233334444"));
        assert_eq!(read_back.server_id.as_deref(), Some("srv-2"));
        assert_eq!(read_back.login_ref_id.as_deref(), Some("lrf-2"));
    }
}
