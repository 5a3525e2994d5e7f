//! Asynchronous callback payloads delivered by the partner bank.

use masking::Secret;
use serde::{Deserialize, Serialize};

use crate::enums::{CbsTransactionStatus, KycStatus};

/// Account creation outcome, delivered once CBS opens the account.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccountCreationCallback {
    /// Customer id assigned by CBS
    pub customer_id: String,
    /// Newly opened account number
    pub account_number: Secret<String, masking::CardNumberMask>,
    /// `"0"` on success, a bank error code otherwise
    pub status_code: String,
    /// Human-readable status from the bank
    pub status_message: Option<String>,
    /// IFSC of the holding branch
    pub ifsc_code: Option<String>,
}

/// KYC verification status change.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct KycStatusCallback {
    /// Customer id assigned by CBS
    pub customer_id: String,
    /// New status
    pub status: KycStatus,
    /// Reviewer remarks, present on rejection
    pub remarks: Option<String>,
}

/// Payment status change for an in-flight transaction.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PaymentStatusCallback {
    /// The idempotency key this service issued toward the bank
    pub transaction_id: String,
    /// Settlement status
    pub cbs_status: CbsTransactionStatus,
    /// UTR reference assigned by the rail
    pub utr_ref_number: Option<String>,
}

/// Video KYC audit outcome.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VcipAuditCallback {
    /// Customer id assigned by CBS
    pub customer_id: String,
    /// `"200"` plus a `status` of `success`/`failure`; any other code is a
    /// hard failure regardless of `status`
    pub code: String,
    /// Secondary status qualifier
    pub status: String,
    /// Auditor remarks
    pub remarks: Option<String>,
}
