//! Key-value config rows, used for durable do-once gates.

use time::PrimitiveDateTime;

/// A durable key-value pair.
#[derive(Clone, Debug)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub modified_at: PrimitiveDateTime,
}

impl ConfigEntry {
    /// Build an entry stamped with the current time.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            modified_at: common_utils::date_time::now(),
        }
    }
}
