//! Database interface for key-value config rows.

use common_utils::errors::CustomResult;
use error_stack::IntoReport;

use super::MockDb;
use crate::{core::errors, types::storage::ConfigEntry};

/// Config row access.
#[async_trait::async_trait]
pub trait ConfigInterface {
    /// Find a config row by key.
    async fn find_config_by_key(
        &self,
        key: &str,
    ) -> CustomResult<ConfigEntry, errors::StorageError>;

    /// Insert or replace a config row.
    async fn upsert_config(
        &self,
        entry: ConfigEntry,
    ) -> CustomResult<ConfigEntry, errors::StorageError>;
}

#[async_trait::async_trait]
impl ConfigInterface for MockDb {
    async fn find_config_by_key(
        &self,
        key: &str,
    ) -> CustomResult<ConfigEntry, errors::StorageError> {
        let configs = self
            .configs
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        configs
            .iter()
            .find(|entry| entry.key == key)
            .cloned()
            .ok_or(errors::StorageError::ValueNotFound(format!("config {key}")))
            .into_report()
    }

    async fn upsert_config(
        &self,
        entry: ConfigEntry,
    ) -> CustomResult<ConfigEntry, errors::StorageError> {
        let mut configs = self
            .configs
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        configs.retain(|existing| existing.key != entry.key);
        configs.push(entry.clone());
        Ok(entry)
    }
}
