//! Storage entities. The persistence layer itself lives behind the
//! interfaces in [`crate::db`]; these are the rows those interfaces trade
//! in.

pub mod account;
pub mod beneficiary;
pub mod config;
pub mod device;
pub mod ifsc;
pub mod transaction;
pub mod user;

pub use account::{Account, AccountNew, AccountUpdate};
pub use beneficiary::{Beneficiary, BeneficiaryNew, BeneficiaryUpdate};
pub use config::ConfigEntry;
pub use device::{Device, DeviceNew, DeviceUpdate};
pub use ifsc::IfscEntry;
pub use transaction::{Transaction, TransactionNew, TransactionUpdate};
pub use user::{User, UserNew, UserUpdate};
