//! Database interface for the mirrored IFSC directory.

use common_utils::errors::CustomResult;
use error_stack::IntoReport;

use super::MockDb;
use crate::{core::errors, types::storage::IfscEntry};

/// IFSC directory access.
#[async_trait::async_trait]
pub trait IfscInterface {
    /// Find a branch by IFSC code.
    async fn find_ifsc_entry(
        &self,
        ifsc_code: &str,
    ) -> CustomResult<IfscEntry, errors::StorageError>;

    /// Replace mirrored rows with the given batch, returning the row count.
    async fn replace_ifsc_entries(
        &self,
        entries: Vec<IfscEntry>,
    ) -> CustomResult<usize, errors::StorageError>;
}

#[async_trait::async_trait]
impl IfscInterface for MockDb {
    async fn find_ifsc_entry(
        &self,
        ifsc_code: &str,
    ) -> CustomResult<IfscEntry, errors::StorageError> {
        let entries = self
            .ifsc_entries
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        entries
            .iter()
            .find(|entry| entry.ifsc_code == ifsc_code)
            .cloned()
            .ok_or(errors::StorageError::ValueNotFound(format!(
                "ifsc {ifsc_code}"
            )))
            .into_report()
    }

    async fn replace_ifsc_entries(
        &self,
        entries: Vec<IfscEntry>,
    ) -> CustomResult<usize, errors::StorageError> {
        let mut stored = self
            .ifsc_entries
            .lock()
            .map_err(|_| error_stack::report!(errors::StorageError::DatabaseError))?;
        let count = entries.len();
        *stored = entries;
        Ok(count)
    }
}
