//! Beneficiary rows.

use api_models::enums::{OtpStatus, TransferType};
use masking::Secret;
use time::PrimitiveDateTime;

/// A payee registered by a user. Registration completes only after OTP
/// validation.
#[derive(Clone, Debug)]
pub struct Beneficiary {
    pub beneficiary_id: String,
    pub user_id: String,
    pub name: String,
    pub account_number: Secret<String, masking::CardNumberMask>,
    pub ifsc_code: String,
    pub bank_name: String,
    pub transfer_type: TransferType,
    pub nickname: Option<String>,
    pub otp_status: OtpStatus,
    pub created_at: PrimitiveDateTime,
    pub modified_at: PrimitiveDateTime,
}

/// Insertable beneficiary row.
#[derive(Clone, Debug)]
pub struct BeneficiaryNew {
    pub beneficiary_id: String,
    pub user_id: String,
    pub name: String,
    pub account_number: Secret<String, masking::CardNumberMask>,
    pub ifsc_code: String,
    pub bank_name: String,
    pub transfer_type: TransferType,
    pub nickname: Option<String>,
}

impl BeneficiaryNew {
    pub(crate) fn into_beneficiary(self) -> Beneficiary {
        let now = common_utils::date_time::now();
        Beneficiary {
            beneficiary_id: self.beneficiary_id,
            user_id: self.user_id,
            name: self.name,
            account_number: self.account_number,
            ifsc_code: self.ifsc_code,
            bank_name: self.bank_name,
            transfer_type: self.transfer_type,
            nickname: self.nickname,
            otp_status: OtpStatus::Sent,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Partial updates applied to a beneficiary row.
#[derive(Clone, Debug)]
pub enum BeneficiaryUpdate {
    /// OTP lifecycle change.
    OtpStatus { otp_status: OtpStatus },
}

impl Beneficiary {
    /// Apply a partial update, refreshing `modified_at`.
    pub fn apply(mut self, update: BeneficiaryUpdate) -> Self {
        match update {
            BeneficiaryUpdate::OtpStatus { otp_status } => {
                self.otp_status = otp_status;
            }
        }
        self.modified_at = common_utils::date_time::now();
        self
    }
}
