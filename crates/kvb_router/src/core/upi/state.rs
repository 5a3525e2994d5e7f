//! Explicit provisioning state machine.
//!
//! The durable records encode the state implicitly (which ids are present,
//! whether `upi_id` is set); this enum makes the machine explicit so each
//! transition can be checked and tested on its own.

use crate::types::storage::{Account, Device};

/// Where a user stands in the UPI provisioning protocol.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProvisioningState {
    /// No device row, or one without minted identifiers.
    NotBound,
    /// Mobile-mapping type 0 succeeded; transaction id and a fresh client
    /// id exist.
    MobileMapped,
    /// VerifyUser succeeded. Transient: not re-derivable from storage, the
    /// step is neither retried nor resumed independently.
    Verified,
    /// Mobile-mapping type 1 accepted the device, directly or via
    /// remapping; server-side session ids exist.
    LoggedIn,
    /// PSP profile created for a brand-new binding.
    ProfileCreated,
    /// Account listing returned the user's accounts.
    AccountsListed,
    /// PSP availability confirmed.
    PspChecked,
    /// Terminal: the account row carries a UPI id.
    Provisioned,
}

impl ProvisioningState {
    /// Derive the durable state from the stored records.
    pub fn from_records(device: Option<&Device>, account: Option<&Account>) -> Self {
        if account.and_then(|account| account.upi_id.as_ref()).is_some() {
            return Self::Provisioned;
        }
        match device {
            None => Self::NotBound,
            Some(device) => {
                if device.client_id.is_none() || device.mobile_mapping_txn_id.is_none() {
                    Self::NotBound
                } else if device.server_id.is_some() || device.login_ref_id.is_some() {
                    Self::LoggedIn
                } else {
                    Self::MobileMapped
                }
            }
        }
    }

    /// Legal forward transitions of the protocol.
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotBound, Self::MobileMapped)
                | (Self::MobileMapped, Self::Verified)
                | (Self::Verified, Self::LoggedIn)
                // A re-entering user logs in again off durable state.
                | (Self::MobileMapped, Self::LoggedIn)
                | (Self::LoggedIn, Self::ProfileCreated)
                // Remapped devices skip profile creation.
                | (Self::LoggedIn, Self::AccountsListed)
                | (Self::ProfileCreated, Self::AccountsListed)
                | (Self::AccountsListed, Self::PspChecked)
                | (Self::PspChecked, Self::Provisioned)
        )
    }
}

#[cfg(test)]
mod tests {
    use masking::Secret;

    use super::*;
    use crate::types::storage::{AccountNew, DeviceNew};

    fn device(client_id: Option<&str>, txn: Option<&str>) -> Device {
        DeviceNew {
            user_id: "user-1".to_string(),
            device_id_encrypted: Secret::new("enc".to_string()),
            mobile_mapping_txn_id: txn.map(str::to_string),
            client_id: client_id.map(str::to_string),
        }
        .into_device()
    }

    fn account(upi_id: Option<&str>) -> Account {
        let mut account = AccountNew {
            user_id: "user-1".to_string(),
            customer_id: "cust-1".to_string(),
            account_number: Secret::new("1234567890".to_string()),
            ifsc_code: Some("KVBL0000001".to_string()),
        }
        .into_account();
        account.upi_id = upi_id.map(str::to_string);
        account
    }

    #[test]
    fn upi_id_presence_is_terminal() {
        let state = ProvisioningState::from_records(None, Some(&account(Some("a@kvb"))));
        assert_eq!(state, ProvisioningState::Provisioned);
    }

    #[test]
    fn missing_identifiers_mean_not_bound() {
        assert_eq!(
            ProvisioningState::from_records(None, Some(&account(None))),
            ProvisioningState::NotBound
        );
        assert_eq!(
            ProvisioningState::from_records(Some(&device(None, None)), None),
            ProvisioningState::NotBound
        );
    }

    #[test]
    fn minted_ids_mean_mobile_mapped() {
        let state = ProvisioningState::from_records(
            Some(&device(Some("1111222233334444"), Some("123456789012"))),
            Some(&account(None)),
        );
        assert_eq!(state, ProvisioningState::MobileMapped);
    }

    #[test]
    fn server_ids_mean_logged_in() {
        let mut bound = device(Some("1111222233334444"), Some("123456789012"));
        bound.server_id = Some("srv-1".to_string());
        assert_eq!(
            ProvisioningState::from_records(Some(&bound), Some(&account(None))),
            ProvisioningState::LoggedIn
        );
    }

    #[test]
    fn transitions_follow_the_protocol_order() {
        use ProvisioningState::*;

        for (from, to) in [
            (NotBound, MobileMapped),
            (MobileMapped, Verified),
            (Verified, LoggedIn),
            (LoggedIn, ProfileCreated),
            (LoggedIn, AccountsListed),
            (ProfileCreated, AccountsListed),
            (AccountsListed, PspChecked),
            (PspChecked, Provisioned),
        ] {
            assert!(from.can_advance_to(to), "{from:?} -> {to:?} must be legal");
        }

        for (from, to) in [
            (NotBound, Provisioned),
            (Provisioned, NotBound),
            (MobileMapped, AccountsListed),
            (PspChecked, LoggedIn),
        ] {
            assert!(!from.can_advance_to(to), "{from:?} -> {to:?} must be illegal");
        }
    }
}
