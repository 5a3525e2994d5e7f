//! Application state.
//!
//! Every collaborator is injected through the constructor; there are no
//! package-level singletons, so tests substitute fakes freely.

use std::sync::Arc;

use masking::StrongSecret;

use crate::{
    configs::Settings,
    core::session::{SessionCache, SessionStateStore},
    db::StorageInterface,
    services::{AuditSink, BankTransport},
};

/// Shared state of the running service.
#[derive(Clone)]
pub struct AppState {
    pub conf: Arc<Settings>,
    pub store: Arc<dyn StorageInterface>,
    pub session_store: SessionStateStore,
    pub transport: Arc<dyn BankTransport>,
    pub audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire up the state from its collaborators.
    pub fn new(
        conf: Settings,
        store: Arc<dyn StorageInterface>,
        session_cache: Arc<dyn SessionCache>,
        transport: Arc<dyn BankTransport>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let session_store = SessionStateStore::new(
            session_cache,
            std::time::Duration::from_secs(conf.upi.session_ttl_secs),
        );
        Self {
            conf: Arc::new(conf),
            store,
            session_store,
            transport,
            audit,
        }
    }
}

/// The authenticated caller of one request, as established by the handler
/// layer.
#[derive(Clone, Debug)]
pub struct UserSession {
    pub user_id: String,
    /// Symmetric key the app and service share for this session; encrypts
    /// every response payload and decrypts inbound device ids
    pub session_key: StrongSecret<Vec<u8>>,
}
