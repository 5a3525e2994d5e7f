//! Device / client-session rows.

use masking::Secret;
use time::PrimitiveDateTime;

/// One row per (user, device) binding.
///
/// The client id is minted once per binding attempt and the row is deleted
/// outright when a downstream protocol step fails irrecoverably; the partner
/// treats a client id as bound to exactly one attempt.
#[derive(Clone, Debug)]
pub struct Device {
    pub user_id: String,
    /// Device id as received from the app, still encrypted under the
    /// session key
    pub device_id_encrypted: Secret<String>,
    pub mobile_mapping_txn_id: Option<String>,
    pub client_id: Option<String>,
    pub server_id: Option<String>,
    pub login_ref_id: Option<String>,
    pub is_active: bool,
    pub created_at: PrimitiveDateTime,
    pub modified_at: PrimitiveDateTime,
}

/// Insertable device row.
#[derive(Clone, Debug)]
pub struct DeviceNew {
    pub user_id: String,
    pub device_id_encrypted: Secret<String>,
    pub mobile_mapping_txn_id: Option<String>,
    pub client_id: Option<String>,
}

impl DeviceNew {
    pub(crate) fn into_device(self) -> Device {
        let now = common_utils::date_time::now();
        Device {
            user_id: self.user_id,
            device_id_encrypted: self.device_id_encrypted,
            mobile_mapping_txn_id: self.mobile_mapping_txn_id,
            client_id: self.client_id,
            server_id: None,
            login_ref_id: None,
            is_active: true,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Partial updates applied to a device row.
#[derive(Clone, Debug)]
pub enum DeviceUpdate {
    /// A fresh mobile-mapping attempt minted new identifiers.
    MobileMapping {
        mobile_mapping_txn_id: String,
        client_id: String,
        device_id_encrypted: Secret<String>,
    },
    /// Server-side session identifiers rotated (login or remap).
    ClientSession {
        server_id: Option<String>,
        login_ref_id: Option<String>,
    },
    /// Activation flip.
    ActiveFlag { is_active: bool },
}

impl Device {
    /// Apply a partial update, refreshing `modified_at`.
    pub fn apply(mut self, update: DeviceUpdate) -> Self {
        match update {
            DeviceUpdate::MobileMapping {
                mobile_mapping_txn_id,
                client_id,
                device_id_encrypted,
            } => {
                self.mobile_mapping_txn_id = Some(mobile_mapping_txn_id);
                self.client_id = Some(client_id);
                self.device_id_encrypted = device_id_encrypted;
                self.server_id = None;
                self.login_ref_id = None;
                self.is_active = true;
            }
            DeviceUpdate::ClientSession {
                server_id,
                login_ref_id,
            } => {
                if server_id.is_some() {
                    self.server_id = server_id;
                }
                if login_ref_id.is_some() {
                    self.login_ref_id = login_ref_id;
                }
            }
            DeviceUpdate::ActiveFlag { is_active } => {
                self.is_active = is_active;
            }
        }
        self.modified_at = common_utils::date_time::now();
        self
    }
}
