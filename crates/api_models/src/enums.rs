//! Enums shared between the app-facing models and the core.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Operating system of the caller's device.
///
/// The partner's client-session protocol derives the client id format from
/// this: 16-digit numeric on Android, 16-char hex on iOS.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DeviceOs {
    /// Android device
    Android,
    /// iOS device
    Ios,
}

/// Coarse-grained onboarding progress marker for a user.
///
/// This is a monotonic checklist, not a strict state machine: stages may be
/// set multiple times idempotently, and independent stages are not ordered
/// by the data model itself.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, PartialOrd, Ord,
)]
pub enum OnboardingStage {
    /// Mobile number verified via SMS
    #[serde(rename = "MOBILE_VERIFICATION_STAGE")]
    #[strum(serialize = "MOBILE_VERIFICATION_STAGE")]
    MobileVerification,
    /// Document KYC submitted
    #[serde(rename = "KYC_STAGE")]
    #[strum(serialize = "KYC_STAGE")]
    Kyc,
    /// Video KYC completed
    #[serde(rename = "VCIP_STAGE")]
    #[strum(serialize = "VCIP_STAGE")]
    Vcip,
    /// CBS account opened
    #[serde(rename = "ACCOUNT_CREATION_STAGE")]
    #[strum(serialize = "ACCOUNT_CREATION_STAGE")]
    AccountCreation,
    /// UPI id provisioned
    #[serde(rename = "UPI_GENERATION_STAGE")]
    #[strum(serialize = "UPI_GENERATION_STAGE")]
    UpiGeneration,
    /// Debit card issued
    #[serde(rename = "DEBIT_CARD_STAGE")]
    #[strum(serialize = "DEBIT_CARD_STAGE")]
    DebitCard,
    /// All onboarding steps done
    #[serde(rename = "ONBOARDING_COMPLETE")]
    #[strum(serialize = "ONBOARDING_COMPLETE")]
    Complete,
}

impl OnboardingStage {
    /// Whether moving from `self` to `other` advances the checklist.
    /// Setting the same stage again is a permitted no-op.
    pub fn permits(self, other: Self) -> bool {
        other >= self
    }
}

/// Status of a transaction as reported by the core banking system.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum CbsTransactionStatus {
    /// Accepted, not yet settled
    Pending,
    /// Settled
    Success,
    /// Rejected or reversed
    Failure,
}

/// KYC verification status delivered by callbacks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum KycStatus {
    /// Submitted, awaiting review
    Pending,
    /// Under manual review
    InProgress,
    /// Verified
    Verified,
    /// Rejected
    Rejected,
}

/// OTP lifecycle status on a pending operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum OtpStatus {
    /// OTP sent to the registered mobile number
    Sent,
    /// OTP validated
    Validated,
    /// Validation failed
    Failed,
}

/// Transfer rail for beneficiary payments.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TransferType {
    /// National Electronic Funds Transfer
    Neft,
    /// Immediate Payment Service
    Imps,
    /// Real Time Gross Settlement
    Rtgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onboarding_stage_is_monotonic() {
        assert!(OnboardingStage::AccountCreation.permits(OnboardingStage::UpiGeneration));
        assert!(OnboardingStage::UpiGeneration.permits(OnboardingStage::UpiGeneration));
        assert!(!OnboardingStage::UpiGeneration.permits(OnboardingStage::Kyc));
    }

    #[test]
    fn onboarding_stage_round_trips_wire_name() {
        use std::str::FromStr as _;

        assert_eq!(OnboardingStage::UpiGeneration.to_string(), "UPI_GENERATION_STAGE");
        assert_eq!(
            OnboardingStage::from_str("UPI_GENERATION_STAGE").ok(),
            Some(OnboardingStage::UpiGeneration)
        );
    }
}
