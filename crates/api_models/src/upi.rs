//! UPI device-binding and account-provisioning models.

use common_utils::pii::PhoneNumberStrategy;
use masking::{Secret, VpaMask};
use serde::{Deserialize, Serialize};

use crate::enums::{DeviceOs, OnboardingStage};

/// Request to bind the caller's SIM/device to the partner's mobile banking
/// session protocol.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimBindingRequest {
    /// Device identifier, encrypted by the app with the session key
    pub device_id: Secret<String>,
    /// Public IP the device sees itself behind; rejected when empty
    pub device_ip: String,
    /// Registered mobile number
    pub mobile_number: Secret<String, PhoneNumberStrategy>,
    /// Device operating system
    pub os: DeviceOs,
    /// OS version string as reported by the device
    pub os_version: String,
    /// `"y"` keeps the freshly minted client id in cache only, for flows
    /// that re-bind without touching the durable device row
    #[serde(default)]
    pub binding_type: Option<String>,
}

/// Response to a successful SIM-binding request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimBindingResponse {
    /// Client id minted for this binding attempt
    pub client_id: String,
    /// Mobile-mapping transaction id
    pub transaction_id: String,
}

/// Request to provision a UPI id for a user whose device is bound.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateUpiRequest {
    /// Device identifier, encrypted by the app with the session key
    pub device_id: Secret<String>,
    /// Device operating system
    pub os: DeviceOs,
    /// OS version string as reported by the device
    pub os_version: String,
}

/// Outcome of a completed UPI provisioning run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpiProvisioningResponse {
    /// The provisioned virtual payment address
    pub upi_id: Secret<String, VpaMask>,
    /// Account the address was attached to
    pub account_number: Secret<String, masking::CardNumberMask>,
    /// Stage the onboarding checklist advanced to
    pub onboarding_stage: OnboardingStage,
}

/// Request to re-establish device binding for an already provisioned user.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RemapUpiRequest {
    /// Device identifier, encrypted by the app with the session key
    pub device_id: Secret<String>,
    /// Device operating system
    pub os: DeviceOs,
    /// OS version string as reported by the device
    pub os_version: String,
}

/// Response to a remapping request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemapUpiResponse {
    /// Whether the device is active again
    pub remapped: bool,
}

/// Request to set the UPI PIN against a provisioned address.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SetUpiPinRequest {
    /// Device identifier, encrypted by the app with the session key
    pub device_id: Secret<String>,
    /// Device operating system
    pub os: DeviceOs,
    /// OS version string as reported by the device
    pub os_version: String,
    /// Last six digits of the debit card used as the issuing credential
    pub card_digits: Secret<String, masking::CardNumberMask>,
    /// Card expiry in `MMYY`
    pub expiry: Secret<String>,
    /// OTP delivered to the registered mobile number
    pub otp: Secret<String>,
}

/// Balance enquiry request.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BalanceEnquiryRequest {
    /// Device identifier, encrypted by the app with the session key
    pub device_id: Secret<String>,
    /// Device operating system
    pub os: DeviceOs,
    /// OS version string as reported by the device
    pub os_version: String,
    /// Encrypted UPI credential block produced by the app's PIN pad
    pub credential_block: Secret<String>,
}

/// Request to validate a payee's virtual payment address.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VpaValidationRequest {
    /// Device identifier, encrypted by the app with the session key
    pub device_id: Secret<String>,
    /// Device operating system
    pub os: DeviceOs,
    /// OS version string as reported by the device
    pub os_version: String,
    /// Address to validate
    pub payee_vpa: Secret<String, VpaMask>,
}

/// Response to a VPA validation request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VpaValidationResponse {
    /// Whether the address resolves
    pub valid: bool,
    /// Display name registered against the address, when the bank shares it
    pub payee_name: Option<String>,
}

/// Request to pay a validated virtual payment address.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VpaPaymentRequest {
    /// Device identifier, encrypted by the app with the session key
    pub device_id: Secret<String>,
    /// Device operating system
    pub os: DeviceOs,
    /// OS version string as reported by the device
    pub os_version: String,
    /// Address to pay
    pub payee_vpa: Secret<String, VpaMask>,
    /// Amount in minor units
    pub amount: i64,
    /// Free-text remarks carried on the payment
    pub remarks: String,
    /// Encrypted UPI credential block produced by the app's PIN pad
    pub credential_block: Secret<String>,
}

/// Response to a PIN set request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpiPinSetResponse {
    /// Whether the PIN is now set
    pub pin_set: bool,
}

/// Decrypted balance payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountBalanceResponse {
    /// Ledger balance as rendered by CBS
    pub balance: String,
}

/// Decrypted payment outcome payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpiPaymentResponse {
    /// Idempotency key issued toward the bank for this payment
    pub transaction_id: String,
    /// UTR reference once the rail assigns one
    pub utr_ref_number: Option<String>,
}

/// An encrypted response envelope.
///
/// Every post-binding operation returns its payload encrypted under the
/// caller's session key; the handler layer passes this through untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncryptedPayloadResponse {
    /// Base64 of the AES-256-GCM ciphertext
    pub payload: String,
}
