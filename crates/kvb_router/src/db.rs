//! Storage interfaces.
//!
//! The relational store is a collaborator: the core only needs
//! find/insert/update/delete-by-user semantics, expressed as one interface
//! trait per entity. [`MockDb`] is the in-memory reference implementation
//! backing tests and local runs.

pub mod account;
pub mod beneficiary;
pub mod configs;
pub mod device;
pub mod ifsc;
pub mod transaction;
pub mod user;

use std::sync::{Arc, Mutex};

use crate::types::storage;

pub use self::{
    account::AccountInterface, beneficiary::BeneficiaryInterface, configs::ConfigInterface,
    device::DeviceInterface, ifsc::IfscInterface, transaction::TransactionInterface,
    user::UserInterface,
};

/// The full storage surface the core depends on.
pub trait StorageInterface:
    DeviceInterface
    + AccountInterface
    + UserInterface
    + TransactionInterface
    + BeneficiaryInterface
    + ConfigInterface
    + IfscInterface
    + Send
    + Sync
    + 'static
{
}

/// In-memory store.
#[derive(Clone, Default)]
pub struct MockDb {
    pub devices: Arc<Mutex<Vec<storage::Device>>>,
    pub accounts: Arc<Mutex<Vec<storage::Account>>>,
    pub users: Arc<Mutex<Vec<storage::User>>>,
    pub transactions: Arc<Mutex<Vec<storage::Transaction>>>,
    pub beneficiaries: Arc<Mutex<Vec<storage::Beneficiary>>>,
    pub configs: Arc<Mutex<Vec<storage::ConfigEntry>>>,
    pub ifsc_entries: Arc<Mutex<Vec<storage::IfscEntry>>>,
}

impl std::fmt::Debug for MockDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDb").finish_non_exhaustive()
    }
}

impl MockDb {
    /// Fresh empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageInterface for MockDb {}
