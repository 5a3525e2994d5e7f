//! Classification of upstream bank error codes.
//!
//! Each operation family owns two static code tables: one mapping codes to
//! user-facing messages (fatal) and one mapping codes to the message shown
//! after retries are exhausted (retryable). The tables are family-scoped; a
//! code fatal in one family may be retryable in another. A code present in
//! neither table is `Unknown` and the caller surfaces the raw upstream
//! message unmodified.

use strum::Display;

/// Which partner API family produced the code being classified.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Display)]
pub enum OperationFamily {
    /// Beneficiary registration
    Beneficiary,
    /// Beneficiary OTP validation
    BeneficiaryOtp,
    /// Consent recording
    Consent,
    /// Payment submission and payment status callbacks
    Payment,
    /// CBS account opening
    AccountCreation,
    /// Nominee maintenance
    Nominee,
    /// Debit card issuance and maintenance
    DebitCard,
    /// Video KYC invocation
    VcipInvoke,
    /// UPI provisioning protocol calls
    Upi,
}

/// Outcome of classifying an upstream code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorDisposition {
    /// Known terminal failure; surface this message, never retry.
    Fatal {
        /// User-facing message
        message: &'static str,
    },
    /// Known transient failure; retry up to the bound, then surface this
    /// message rather than the raw upstream one.
    Retryable {
        /// Message shown once retries are exhausted
        message: &'static str,
    },
    /// Not specially handled; the raw upstream message is surfaced.
    Unknown,
}

/// Classify `code` within `family`. The retryable table is consulted first.
pub fn classify(family: OperationFamily, code: &str) -> ErrorDisposition {
    if let Some(message) = retry_message(family, code) {
        ErrorDisposition::Retryable { message }
    } else if let Some(message) = user_message(family, code) {
        ErrorDisposition::Fatal { message }
    } else {
        ErrorDisposition::Unknown
    }
}

/// Video-KYC invocation gates on a secondary `status` field: code `200` is
/// only an error when the status says `failure`; a `200`/`success` pair is
/// suppressed because the audit outcome has not happened yet.
///
/// Returns the user-facing message and whether the pair is an error.
pub fn vcip_invoke_error_message(code: &str, status: &str) -> (&'static str, bool) {
    if code == "200" {
        return match status {
            "success" => ("", false),
            _ => ("Video KYC session could not be completed", true),
        };
    }
    match user_message(OperationFamily::VcipInvoke, code) {
        Some(message) => (message, true),
        None => ("", false),
    }
}

fn user_message(family: OperationFamily, code: &str) -> Option<&'static str> {
    match family {
        OperationFamily::Beneficiary => beneficiary_user_message(code),
        OperationFamily::BeneficiaryOtp => beneficiary_otp_user_message(code),
        OperationFamily::Consent => consent_user_message(code),
        OperationFamily::Payment => payment_user_message(code),
        OperationFamily::AccountCreation => account_creation_user_message(code),
        OperationFamily::Nominee => nominee_user_message(code),
        OperationFamily::DebitCard => debit_card_user_message(code),
        OperationFamily::VcipInvoke => vcip_user_message(code),
        OperationFamily::Upi => upi_user_message(code),
    }
}

fn retry_message(family: OperationFamily, code: &str) -> Option<&'static str> {
    match family {
        OperationFamily::Beneficiary => beneficiary_retry_message(code),
        OperationFamily::BeneficiaryOtp => beneficiary_otp_retry_message(code),
        OperationFamily::Consent => consent_retry_message(code),
        OperationFamily::Payment => payment_retry_message(code),
        OperationFamily::AccountCreation => account_creation_retry_message(code),
        OperationFamily::Nominee => nominee_retry_message(code),
        OperationFamily::DebitCard => debit_card_retry_message(code),
        OperationFamily::VcipInvoke => None,
        OperationFamily::Upi => upi_retry_message(code),
    }
}

fn beneficiary_user_message(code: &str) -> Option<&'static str> {
    match code {
        "B01" => Some("Beneficiary already exists"),
        "B02" => Some("Beneficiary limit reached for the day"),
        "B05" => Some("Invalid account number entered"),
        "B07" => Some("IFSC code does not match any branch"),
        "M4" => Some("Mobile number not registered with the bank"),
        _ => None,
    }
}

fn beneficiary_retry_message(code: &str) -> Option<&'static str> {
    match code {
        "B91" => Some("Unable to add beneficiary right now, please try again"),
        "91" => Some("Request timed out at the bank, please try again"),
        _ => None,
    }
}

fn beneficiary_otp_user_message(code: &str) -> Option<&'static str> {
    match code {
        "O01" => Some("Incorrect OTP entered"),
        "O02" => Some("OTP has expired, please request a new one"),
        "O03" => Some("OTP attempts exceeded, beneficiary registration cancelled"),
        _ => None,
    }
}

fn beneficiary_otp_retry_message(code: &str) -> Option<&'static str> {
    match code {
        "O91" => Some("OTP could not be verified right now, please try again"),
        _ => None,
    }
}

fn consent_user_message(code: &str) -> Option<&'static str> {
    match code {
        "C01" => Some("Consent already recorded for this account"),
        "C03" => Some("Consent reference is no longer valid"),
        _ => None,
    }
}

fn consent_retry_message(code: &str) -> Option<&'static str> {
    match code {
        "C91" => Some("Unable to record consent right now, please try again"),
        _ => None,
    }
}

fn payment_user_message(code: &str) -> Option<&'static str> {
    match code {
        "Z9" => Some("Insufficient funds in the account"),
        "ZA" => Some("Transaction declined by the remitter bank"),
        "U30" => Some("Debit has failed"),
        "XN" => Some("No such account exists"),
        "B05" => Some("Payee account is closed"),
        _ => None,
    }
}

fn payment_retry_message(code: &str) -> Option<&'static str> {
    match code {
        "91" => Some("Transaction timed out at the bank, please retry"),
        "U67" => Some("Debit timed out, please retry"),
        "U68" => Some("Credit timed out, please retry"),
        "TE1" => Some("Technical error at the bank, transaction re-submitted"),
        _ => None,
    }
}

fn account_creation_user_message(code: &str) -> Option<&'static str> {
    match code {
        "A01" => Some("Account opening is already in progress"),
        "A02" => Some("KYC details do not match the submitted documents"),
        "A05" => Some("Account cannot be opened for this customer profile"),
        _ => None,
    }
}

fn account_creation_retry_message(code: &str) -> Option<&'static str> {
    match code {
        "A91" => Some("Account opening service is busy, please try again"),
        _ => None,
    }
}

fn nominee_user_message(code: &str) -> Option<&'static str> {
    match code {
        "N01" => Some("Nominee details already updated"),
        "N02" => Some("Nominee date of birth is invalid"),
        _ => None,
    }
}

fn nominee_retry_message(code: &str) -> Option<&'static str> {
    match code {
        "N91" => Some("Unable to update nominee right now, please try again"),
        _ => None,
    }
}

fn debit_card_user_message(code: &str) -> Option<&'static str> {
    match code {
        "D01" => Some("Card already issued for this account"),
        "D02" => Some("Card is blocked, contact the branch"),
        "D05" => Some("Card request rejected by the issuing system"),
        _ => None,
    }
}

fn debit_card_retry_message(code: &str) -> Option<&'static str> {
    match code {
        "D91" => Some("Card service is busy, please try again"),
        _ => None,
    }
}

fn vcip_user_message(code: &str) -> Option<&'static str> {
    match code {
        "V01" => Some("Video KYC session has expired"),
        "V02" => Some("Video KYC was rejected by the auditor"),
        _ => None,
    }
}

fn upi_user_message(code: &str) -> Option<&'static str> {
    match code {
        "XH" => Some("Account does not belong to this mobile number"),
        "XD" => Some("Invalid virtual address"),
        "U17" => Some("Device binding could not be verified"),
        "1" => Some("sms not received"),
        _ => None,
    }
}

fn upi_retry_message(code: &str) -> Option<&'static str> {
    match code {
        "XY" => Some("Bank systems are busy, please try again"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_codes_never_classify_fatal() {
        for (family, code) in [
            (OperationFamily::Beneficiary, "B91"),
            (OperationFamily::Beneficiary, "91"),
            (OperationFamily::BeneficiaryOtp, "O91"),
            (OperationFamily::Consent, "C91"),
            (OperationFamily::Payment, "91"),
            (OperationFamily::Payment, "U67"),
            (OperationFamily::Payment, "U68"),
            (OperationFamily::Payment, "TE1"),
            (OperationFamily::AccountCreation, "A91"),
            (OperationFamily::Nominee, "N91"),
            (OperationFamily::DebitCard, "D91"),
            (OperationFamily::Upi, "XY"),
        ] {
            assert!(
                matches!(classify(family, code), ErrorDisposition::Retryable { .. }),
                "{family}/{code} must be retryable"
            );
        }
    }

    #[test]
    fn tables_are_family_scoped() {
        // "B05" is fatal for beneficiaries and payments, but carries a
        // different message in each, and is unknown elsewhere.
        assert_eq!(
            classify(OperationFamily::Beneficiary, "B05"),
            ErrorDisposition::Fatal {
                message: "Invalid account number entered"
            }
        );
        assert_eq!(
            classify(OperationFamily::Payment, "B05"),
            ErrorDisposition::Fatal {
                message: "Payee account is closed"
            }
        );
        assert_eq!(classify(OperationFamily::Nominee, "B05"), ErrorDisposition::Unknown);

        // "91" is retryable for payments even though other families know
        // nothing about it.
        assert!(matches!(
            classify(OperationFamily::Payment, "91"),
            ErrorDisposition::Retryable { .. }
        ));
        assert_eq!(classify(OperationFamily::DebitCard, "91"), ErrorDisposition::Unknown);
    }

    #[test]
    fn unknown_code_is_unknown() {
        assert_eq!(
            classify(OperationFamily::Beneficiary, "does-not-exist"),
            ErrorDisposition::Unknown
        );
    }

    #[test]
    fn vcip_code_200_gates_on_status() {
        assert_eq!(vcip_invoke_error_message("200", "success"), ("", false));

        let (message, is_error) = vcip_invoke_error_message("200", "failure");
        assert!(is_error);
        assert!(!message.is_empty());

        // Any status other than an explicit success is still an error.
        let (_, is_error) = vcip_invoke_error_message("200", "timeout");
        assert!(is_error);
    }

    #[test]
    fn vcip_other_codes_use_the_table() {
        let (message, is_error) = vcip_invoke_error_message("V01", "failure");
        assert!(is_error);
        assert_eq!(message, "Video KYC session has expired");

        assert_eq!(vcip_invoke_error_message("V99", "failure"), ("", false));
    }
}
