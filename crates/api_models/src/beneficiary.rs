//! Beneficiary management and payment models.

use masking::Secret;
use serde::{Deserialize, Serialize};

use crate::enums::{CbsTransactionStatus, OtpStatus, TransferType};

/// Request to register a new beneficiary.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AddBeneficiaryRequest {
    /// Beneficiary display name
    pub name: String,
    /// Beneficiary account number
    pub account_number: Secret<String, masking::CardNumberMask>,
    /// IFSC code of the beneficiary's branch
    pub ifsc_code: String,
    /// Bank name, denormalized for display
    pub bank_name: String,
    /// Transfer rail the beneficiary will be paid over
    pub transfer_type: TransferType,
    /// Optional nickname shown in the app
    #[serde(default)]
    pub nickname: Option<String>,
}

/// Response to a beneficiary registration request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddBeneficiaryResponse {
    /// Identifier of the pending beneficiary
    pub beneficiary_id: String,
    /// OTP state: registration completes only after OTP validation
    pub otp_status: OtpStatus,
}

/// Request to validate the OTP for a pending beneficiary.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ValidateOtpBeneficiaryRequest {
    /// Identifier returned at registration
    pub beneficiary_id: String,
    /// OTP delivered to the registered mobile number
    pub otp: Secret<String>,
}

/// Response to OTP validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidateOtpBeneficiaryResponse {
    /// Identifier of the beneficiary
    pub beneficiary_id: String,
    /// OTP state after validation
    pub otp_status: OtpStatus,
}

/// Request to pay a registered beneficiary.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BeneficiaryPaymentRequest {
    /// Identifier of the beneficiary to pay
    pub beneficiary_id: String,
    /// Amount in minor units
    pub amount: i64,
    /// Free-text remarks carried on the transfer
    pub remarks: String,
}

/// Response to a beneficiary payment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BeneficiaryPaymentResponse {
    /// Idempotency key issued toward the bank for this payment
    pub transaction_id: String,
    /// Core banking status of the transfer
    pub cbs_status: CbsTransactionStatus,
    /// UTR reference once the rail assigns one
    pub utr_ref_number: Option<String>,
}
