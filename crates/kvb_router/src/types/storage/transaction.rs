//! Transaction rows.

use api_models::enums::{CbsTransactionStatus, OtpStatus};
use time::PrimitiveDateTime;

/// One row per payment / beneficiary / UPI operation. `transaction_id` is
/// the idempotency key toward the bank, issued once per logical operation
/// and reused across its retries.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub transaction_id: String,
    pub user_id: String,
    pub beneficiary_id: Option<String>,
    /// Amount in minor units; zero for non-monetary operations
    pub amount: i64,
    pub cbs_status: CbsTransactionStatus,
    pub utr_ref_number: Option<String>,
    pub otp_status: Option<OtpStatus>,
    pub created_at: PrimitiveDateTime,
    pub modified_at: PrimitiveDateTime,
}

/// Insertable transaction row.
#[derive(Clone, Debug)]
pub struct TransactionNew {
    pub transaction_id: String,
    pub user_id: String,
    pub beneficiary_id: Option<String>,
    pub amount: i64,
    pub cbs_status: CbsTransactionStatus,
    pub utr_ref_number: Option<String>,
    pub otp_status: Option<OtpStatus>,
}

impl TransactionNew {
    pub(crate) fn into_transaction(self) -> Transaction {
        let now = common_utils::date_time::now();
        Transaction {
            transaction_id: self.transaction_id,
            user_id: self.user_id,
            beneficiary_id: self.beneficiary_id,
            amount: self.amount,
            cbs_status: self.cbs_status,
            utr_ref_number: self.utr_ref_number,
            otp_status: self.otp_status,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Partial updates applied to a transaction row.
#[derive(Clone, Debug)]
pub enum TransactionUpdate {
    /// Settlement status change; only present fields are written.
    StatusUpdate {
        cbs_status: CbsTransactionStatus,
        utr_ref_number: Option<String>,
    },
    /// OTP lifecycle change.
    OtpStatusUpdate { otp_status: OtpStatus },
}

impl Transaction {
    /// Apply a partial update, refreshing `modified_at`.
    pub fn apply(mut self, update: TransactionUpdate) -> Self {
        match update {
            TransactionUpdate::StatusUpdate {
                cbs_status,
                utr_ref_number,
            } => {
                self.cbs_status = cbs_status;
                if utr_ref_number.is_some() {
                    self.utr_ref_number = utr_ref_number;
                }
            }
            TransactionUpdate::OtpStatusUpdate { otp_status } => {
                self.otp_status = Some(otp_status);
            }
        }
        self.modified_at = common_utils::date_time::now();
        self
    }
}
