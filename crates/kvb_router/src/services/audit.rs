//! Fire-and-forget audit trail.

use std::sync::Arc;

use async_trait::async_trait;
use common_utils::errors::CustomResult;
use router_env::logger;
use time::PrimitiveDateTime;

use crate::core::errors::StorageError;

/// One audit record.
#[derive(Clone, Debug)]
pub struct AuditEntry {
    pub user_id: String,
    pub flow: String,
    pub message: String,
    pub created_at: PrimitiveDateTime,
}

impl AuditEntry {
    /// Build an entry stamped with the current time.
    pub fn new(user_id: &str, flow: &router_env::Flow, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.to_string(),
            flow: flow.to_string(),
            message: message.into(),
            created_at: common_utils::date_time::now(),
        }
    }
}

/// Audit persistence. Failures are logged, never allowed to block or fail
/// the main flow.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one entry.
    async fn save(&self, entry: AuditEntry) -> CustomResult<(), StorageError>;
}

/// Sink that writes audit entries to the structured log.
#[derive(Debug, Default)]
pub struct LogAuditSink;

#[async_trait]
impl AuditSink for LogAuditSink {
    async fn save(&self, entry: AuditEntry) -> CustomResult<(), StorageError> {
        logger::info!(
            tag = ?router_env::Tag::Event,
            user_id = %entry.user_id,
            flow = %entry.flow,
            message = %entry.message,
            "audit"
        );
        Ok(())
    }
}

/// Spawn the save off the request path.
pub fn record(sink: Arc<dyn AuditSink>, entry: AuditEntry) {
    tokio::spawn(async move {
        if let Err(error) = sink.save(entry).await {
            logger::error!(?error, "failed to persist audit entry");
        }
    });
}
