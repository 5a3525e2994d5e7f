//! Types.

use serde::Deserialize;
use strum::{Display, EnumString};
pub use tracing::Level;

/// Category and tag of log event.
#[derive(Debug, Default, Deserialize, Clone, Display, EnumString)]
pub enum Tag {
    /// General.
    #[default]
    General,

    /// Redis: get.
    RedisGet,
    /// Redis: set.
    RedisSet,

    /// Data base: create.
    DbCreate,
    /// Data base: read.
    DbRead,
    /// Data base: update.
    DbUpdate,
    /// Data base: delete.
    DbDelete,

    /// Call initiated to the partner bank.
    InitiatedToBank,
    /// Inbound callback from the partner bank.
    BankCallback,

    /// Event: general.
    Event,
}

/// API Flow
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Health check.
    HealthCheck,
    /// SIM binding and SMS verification flow.
    SimBinding,
    /// UPI id creation flow.
    CreateUpiId,
    /// Remapping flow for an already provisioned user.
    RemapUpiId,
    /// UPI PIN set flow.
    SetUpiPin,
    /// Account balance enquiry flow.
    CheckBalance,
    /// Virtual payment address validation flow.
    ValidateVpa,
    /// Payment to a virtual payment address.
    VpaPayment,
    /// Beneficiary addition flow.
    AddBeneficiary,
    /// Beneficiary OTP validation flow.
    ValidateOtpBeneficiary,
    /// Beneficiary payment flow.
    BeneficiaryPayment,
    /// Account creation callback ingestion.
    AccountCreationCallback,
    /// KYC status callback ingestion.
    KycStatusCallback,
    /// Payment status callback ingestion.
    PaymentStatusCallback,
    /// Video KYC audit callback ingestion.
    VcipAuditCallback,
    /// Daily IFSC data synchronisation.
    IfscSync,
}
