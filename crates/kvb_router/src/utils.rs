//! Small helpers without a better home.

use crate::consts;

/// Numeric transaction reference, issued once per logical operation and
/// reused across its retries.
pub fn generate_transaction_id() -> String {
    common_utils::generate_digits(consts::TRANSACTION_ID_LENGTH)
}

/// Identifier for a newly registered beneficiary.
pub fn generate_beneficiary_id() -> String {
    common_utils::generate_id_with_default_len(consts::BENEFICIARY_ID_PREFIX)
}
