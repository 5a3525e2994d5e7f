//! Fail-fast request validation, run before any external call.

use api_models::upi::SimBindingRequest;
use error_stack::IntoReport;
use masking::PeekInterface;

use crate::{
    core::errors::{ApiErrorResponse, RouterResult},
    types::storage::Account,
};

/// Validate a SIM-binding request.
pub fn validate_sim_binding(request: &SimBindingRequest) -> RouterResult<()> {
    if request.device_ip.trim().is_empty() {
        return Err(ApiErrorResponse::InvalidRequestData {
            message: "device ip should not be empty".to_string(),
        })
        .into_report();
    }
    if request.os_version.trim().is_empty() {
        return Err(ApiErrorResponse::InvalidRequestData {
            message: "os version should not be empty".to_string(),
        })
        .into_report();
    }
    if request.mobile_number.peek().len() != 10 {
        return Err(ApiErrorResponse::InvalidRequestData {
            message: "mobile number must be 10 digits".to_string(),
        })
        .into_report();
    }
    Ok(())
}

/// Refuse re-provisioning: a present `upi_id` is terminal.
pub fn ensure_not_provisioned(account: &Account) -> RouterResult<()> {
    if account.upi_id.is_some() {
        return Err(ApiErrorResponse::UpiIdAlreadyExists).into_report();
    }
    Ok(())
}

/// Require a provisioned address, for post-provisioning operations.
pub fn require_upi_id(account: &Account) -> RouterResult<String> {
    account
        .upi_id
        .clone()
        .ok_or(ApiErrorResponse::InvalidRequestData {
            message: "UPI ID has not been provisioned for this account".to_string(),
        })
        .into_report()
}

/// Validate a payment amount.
pub fn validate_amount(amount: i64) -> RouterResult<()> {
    if amount <= 0 {
        return Err(ApiErrorResponse::InvalidRequestData {
            message: "amount must be positive".to_string(),
        })
        .into_report();
    }
    Ok(())
}

/// Reject paying one's own address.
pub fn ensure_not_self_vpa(own_upi_id: &str, payee_vpa: &str) -> RouterResult<()> {
    if own_upi_id.eq_ignore_ascii_case(payee_vpa) {
        return Err(ApiErrorResponse::SelfTransferNotAllowed).into_report();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use api_models::enums::DeviceOs;
    use masking::Secret;

    use super::*;

    fn request() -> SimBindingRequest {
        SimBindingRequest {
            device_id: Secret::new("enc".to_string()),
            device_ip: "10.2.3.4".to_string(),
            mobile_number: Secret::new("9876543210".to_string()),
            os: DeviceOs::Android,
            os_version: "14".to_string(),
            binding_type: None,
        }
    }

    #[test]
    fn empty_device_ip_fails_fast() {
        let mut req = request();
        req.device_ip = "   ".to_string();

        let report = validate_sim_binding(&req).expect_err("must fail");
        assert_eq!(
            *report.current_context(),
            ApiErrorResponse::InvalidRequestData {
                message: "device ip should not be empty".to_string()
            }
        );
    }

    #[test]
    fn valid_request_passes() {
        assert!(validate_sim_binding(&request()).is_ok());
    }

    #[test]
    fn self_vpa_is_rejected_case_insensitively() {
        let report = ensure_not_self_vpa("user@kvb", "USER@KVB").expect_err("must fail");
        assert_eq!(*report.current_context(), ApiErrorResponse::SelfTransferNotAllowed);
    }
}
