//! Beneficiary registration, OTP validation and payment.
//!
//! The template family for "one external call wrapped in classify-and-
//! retry": unlike the UPI binding chain, each of these is a single partner
//! call that is safe to resubmit, because the transaction id doubles as the
//! idempotency key and retries can attach a resend flag.

use api_models::{
    beneficiary as beneficiary_api,
    enums::{CbsTransactionStatus, OtpStatus},
};
use error_stack::IntoReport;
use masking::PeekInterface;
use router_env::{instrument, logger, tracing, Flow};

use crate::{
    connector::{kvb::transformers as kvb_types, Kvb},
    consts,
    core::{
        bank_codes::OperationFamily,
        errors::{ApiErrorResponse, RouterResponse, StorageErrorExt},
        retry::{call_with_bank_retry, RetryPolicy},
    },
    db::{AccountInterface, BeneficiaryInterface, TransactionInterface},
    routes::{AppState, UserSession},
    services::{audit, ApplicationResponse},
    types::storage,
    utils,
};

/// Whether a new registration request duplicates an already stored
/// beneficiary. Two registrations are duplicates only when every
/// identifying field matches; differing in any one of them makes the
/// request a distinct beneficiary.
pub fn is_duplicate_beneficiary(
    request: &beneficiary_api::AddBeneficiaryRequest,
    existing: &storage::Beneficiary,
) -> bool {
    existing.account_number.peek() == request.account_number.peek()
        && existing.ifsc_code == request.ifsc_code
        && existing.name == request.name
        && existing.transfer_type == request.transfer_type
}

/// Register a beneficiary. The bank sends an OTP to the registered mobile;
/// registration completes in [`validate_otp_beneficiary`].
#[instrument(skip_all, fields(user_id = %user_session.user_id))]
pub async fn add_beneficiary(
    app_state: &AppState,
    user_session: &UserSession,
    req: beneficiary_api::AddBeneficiaryRequest,
) -> RouterResponse<beneficiary_api::AddBeneficiaryResponse> {
    let user_id = &user_session.user_id;

    let account = app_state
        .store
        .find_account_by_user_id(user_id)
        .await
        .to_not_found_response(ApiErrorResponse::AccountNotFound)?;

    if account.account_number.peek() == req.account_number.peek() {
        return Err(ApiErrorResponse::SelfTransferNotAllowed).into_report();
    }

    let existing = app_state
        .store
        .find_beneficiaries_by_user_id(user_id)
        .await
        .to_not_found_response(ApiErrorResponse::InternalServerError)?;
    if existing
        .iter()
        .any(|beneficiary| is_duplicate_beneficiary(&req, beneficiary))
    {
        return Err(ApiErrorResponse::DuplicateBeneficiary).into_report();
    }

    // One transaction id for the logical operation, reused across retries.
    let transaction_id = utils::generate_transaction_id();
    let policy = RetryPolicy {
        max_attempts: app_state.conf.upi.max_retry_attempts,
        ..Default::default()
    };

    let transport = app_state.transport.clone();
    let conf = app_state.conf.clone();
    let customer_id = account.customer_id.clone();
    call_with_bank_retry(OperationFamily::Beneficiary, policy, |_ctx| {
        let request = kvb_types::BeneficiaryAddRequest {
            customer_id: customer_id.clone(),
            name: req.name.clone(),
            account_number: req.account_number.clone(),
            ifsc: req.ifsc_code.clone(),
            transfer_type: req.transfer_type,
            transaction_id: transaction_id.clone(),
        };
        let transport = transport.clone();
        let conf = conf.clone();
        async move { Kvb::add_beneficiary(transport.as_ref(), &conf.bank, request).await }
    })
    .await?;

    let beneficiary = app_state
        .store
        .insert_beneficiary(storage::BeneficiaryNew {
            beneficiary_id: utils::generate_beneficiary_id(),
            user_id: user_id.clone(),
            name: req.name.clone(),
            account_number: req.account_number.clone(),
            ifsc_code: req.ifsc_code.clone(),
            bank_name: req.bank_name.clone(),
            transfer_type: req.transfer_type,
            nickname: req.nickname.clone(),
        })
        .await
        .to_duplicate_response(ApiErrorResponse::DuplicateBeneficiary)?;

    app_state
        .store
        .insert_transaction(storage::TransactionNew {
            transaction_id,
            user_id: user_id.clone(),
            beneficiary_id: Some(beneficiary.beneficiary_id.clone()),
            amount: 0,
            cbs_status: CbsTransactionStatus::Pending,
            utr_ref_number: None,
            otp_status: Some(OtpStatus::Sent),
        })
        .await
        .to_duplicate_response(ApiErrorResponse::InternalServerError)?;

    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(user_id, &Flow::AddBeneficiary, "beneficiary registered"),
    );
    Ok(ApplicationResponse::Json(
        beneficiary_api::AddBeneficiaryResponse {
            beneficiary_id: beneficiary.beneficiary_id,
            otp_status: OtpStatus::Sent,
        },
    ))
}

/// Validate the OTP for a pending beneficiary registration.
#[instrument(skip_all, fields(user_id = %user_session.user_id))]
pub async fn validate_otp_beneficiary(
    app_state: &AppState,
    user_session: &UserSession,
    req: beneficiary_api::ValidateOtpBeneficiaryRequest,
) -> RouterResponse<beneficiary_api::ValidateOtpBeneficiaryResponse> {
    let user_id = &user_session.user_id;

    let beneficiary = app_state
        .store
        .find_beneficiary_by_id(&req.beneficiary_id)
        .await
        .to_not_found_response(ApiErrorResponse::BeneficiaryNotFound)?;
    if beneficiary.user_id != *user_id {
        return Err(ApiErrorResponse::BeneficiaryNotFound).into_report();
    }
    if beneficiary.otp_status != OtpStatus::Sent {
        return Err(ApiErrorResponse::InvalidRequestData {
            message: "no OTP validation pending for this beneficiary".to_string(),
        })
        .into_report();
    }

    let transaction = pending_transaction_for(app_state, user_id, &beneficiary.beneficiary_id)
        .await?;
    let policy = RetryPolicy {
        max_attempts: app_state.conf.upi.max_retry_attempts,
        ..Default::default()
    };

    let transport = app_state.transport.clone();
    let conf = app_state.conf.clone();
    let transaction_id = transaction.transaction_id.clone();
    let otp = req.otp.clone();
    let outcome = call_with_bank_retry(OperationFamily::BeneficiaryOtp, policy, |_ctx| {
        let request = kvb_types::BeneficiaryOtpRequest {
            transaction_id: transaction_id.clone(),
            otp: otp.clone(),
        };
        let transport = transport.clone();
        let conf = conf.clone();
        async move { Kvb::validate_beneficiary_otp(transport.as_ref(), &conf.bank, request).await }
    })
    .await;

    let otp_status = match outcome {
        Ok(_) => OtpStatus::Validated,
        Err(report) => {
            // The failed state is persisted loudly before surfacing.
            let _ = app_state
                .store
                .update_beneficiary_by_id(
                    &beneficiary.beneficiary_id,
                    storage::BeneficiaryUpdate::OtpStatus {
                        otp_status: OtpStatus::Failed,
                    },
                )
                .await
                .map_err(|error| logger::error!(?error, "failed to persist otp failure"));
            return Err(report);
        }
    };

    app_state
        .store
        .update_beneficiary_by_id(
            &beneficiary.beneficiary_id,
            storage::BeneficiaryUpdate::OtpStatus { otp_status },
        )
        .await
        .to_not_found_response(ApiErrorResponse::BeneficiaryNotFound)?;
    app_state
        .store
        .update_transaction_by_transaction_id(
            &transaction.transaction_id,
            storage::TransactionUpdate::OtpStatusUpdate { otp_status },
        )
        .await
        .to_not_found_response(ApiErrorResponse::TransactionNotFound)?;

    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(user_id, &Flow::ValidateOtpBeneficiary, "beneficiary otp validated"),
    );
    Ok(ApplicationResponse::Json(
        beneficiary_api::ValidateOtpBeneficiaryResponse {
            beneficiary_id: beneficiary.beneficiary_id,
            otp_status,
        },
    ))
}

/// Pay a registered, OTP-validated beneficiary.
#[instrument(skip_all, fields(user_id = %user_session.user_id))]
pub async fn beneficiary_payment(
    app_state: &AppState,
    user_session: &UserSession,
    req: beneficiary_api::BeneficiaryPaymentRequest,
) -> RouterResponse<beneficiary_api::BeneficiaryPaymentResponse> {
    let user_id = &user_session.user_id;
    super::upi::validator::validate_amount(req.amount)?;

    let beneficiary = app_state
        .store
        .find_beneficiary_by_id(&req.beneficiary_id)
        .await
        .to_not_found_response(ApiErrorResponse::BeneficiaryNotFound)?;
    if beneficiary.user_id != *user_id {
        return Err(ApiErrorResponse::BeneficiaryNotFound).into_report();
    }
    if beneficiary.otp_status != OtpStatus::Validated {
        return Err(ApiErrorResponse::InvalidRequestData {
            message: "beneficiary registration is not complete".to_string(),
        })
        .into_report();
    }

    let account = app_state
        .store
        .find_account_by_user_id(user_id)
        .await
        .to_not_found_response(ApiErrorResponse::AccountNotFound)?;
    if account.account_number.peek() == beneficiary.account_number.peek() {
        return Err(ApiErrorResponse::SelfTransferNotAllowed).into_report();
    }

    // One transaction id for the logical transfer; retries resend it with
    // the resend flag, only the explicit resend code re-issues it.
    let mut transaction_id = utils::generate_transaction_id();
    let policy = RetryPolicy {
        max_attempts: app_state.conf.upi.max_retry_attempts,
        ..Default::default()
    };

    let transport = app_state.transport.clone();
    let conf = app_state.conf.clone();
    let customer_id = account.customer_id.clone();
    let beneficiary_account = beneficiary.account_number.clone();
    let beneficiary_ifsc = beneficiary.ifsc_code.clone();
    let response = call_with_bank_retry(OperationFamily::Payment, policy, |ctx| {
        if ctx.last_bank_code.as_deref() == Some(consts::TECHNICAL_ERROR_RESEND_CODE) {
            transaction_id = utils::generate_transaction_id();
            logger::info!("re-issued transaction id after technical-error resend signal");
        }
        let request = kvb_types::BeneficiaryPaymentRequest {
            customer_id: customer_id.clone(),
            account_number: beneficiary_account.clone(),
            ifsc: beneficiary_ifsc.clone(),
            amount: req.amount,
            remarks: req.remarks.clone(),
            transaction_id: transaction_id.clone(),
            resend: ctx.attempt > 0,
        };
        let transport = transport.clone();
        let conf = conf.clone();
        async move { Kvb::beneficiary_payment(transport.as_ref(), &conf.bank, request).await }
    })
    .await?;

    let final_transaction_id = response
        .transaction_id
        .unwrap_or_else(|| transaction_id.clone());

    app_state
        .store
        .insert_transaction(storage::TransactionNew {
            transaction_id: final_transaction_id.clone(),
            user_id: user_id.clone(),
            beneficiary_id: Some(beneficiary.beneficiary_id.clone()),
            amount: req.amount,
            cbs_status: CbsTransactionStatus::Pending,
            utr_ref_number: response.utr_ref_number.clone(),
            otp_status: None,
        })
        .await
        .to_duplicate_response(ApiErrorResponse::InternalServerError)?;

    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(user_id, &Flow::BeneficiaryPayment, "beneficiary payment submitted"),
    );
    Ok(ApplicationResponse::Json(
        beneficiary_api::BeneficiaryPaymentResponse {
            transaction_id: final_transaction_id,
            cbs_status: CbsTransactionStatus::Pending,
            utr_ref_number: response.utr_ref_number,
        },
    ))
}

/// The OTP-pending transaction created at registration.
async fn pending_transaction_for(
    app_state: &AppState,
    user_id: &str,
    beneficiary_id: &str,
) -> crate::core::errors::RouterResult<storage::Transaction> {
    // The registration flow records exactly one OTP-bearing transaction per
    // beneficiary.
    let transactions = app_state
        .store
        .find_transactions_by_beneficiary_id(beneficiary_id)
        .await
        .to_not_found_response(ApiErrorResponse::TransactionNotFound)?;
    transactions
        .into_iter()
        .find(|transaction| {
            transaction.user_id == user_id && transaction.otp_status == Some(OtpStatus::Sent)
        })
        .ok_or(ApiErrorResponse::TransactionNotFound)
        .into_report()
}

#[cfg(test)]
mod tests {
    use api_models::enums::TransferType;
    use masking::Secret;

    use super::*;

    fn request() -> beneficiary_api::AddBeneficiaryRequest {
        beneficiary_api::AddBeneficiaryRequest {
            name: "Meera Iyer".to_string(),
            account_number: Secret::new("000912345678".to_string()),
            ifsc_code: "KVBL0001111".to_string(),
            bank_name: "KVB".to_string(),
            transfer_type: TransferType::Imps,
            nickname: None,
        }
    }

    fn stored() -> storage::Beneficiary {
        storage::BeneficiaryNew {
            beneficiary_id: "ben_1".to_string(),
            user_id: "user-1".to_string(),
            name: "Meera Iyer".to_string(),
            account_number: Secret::new("000912345678".to_string()),
            ifsc_code: "KVBL0001111".to_string(),
            bank_name: "KVB".to_string(),
            transfer_type: TransferType::Imps,
            nickname: None,
        }
        .into_beneficiary()
    }

    #[test]
    fn identical_fields_are_a_duplicate() {
        assert!(is_duplicate_beneficiary(&request(), &stored()));
    }

    #[test]
    fn any_single_differing_field_is_not_a_duplicate() {
        let mut different_account = request();
        different_account.account_number = Secret::new("999912345678".to_string());
        assert!(!is_duplicate_beneficiary(&different_account, &stored()));

        let mut different_ifsc = request();
        different_ifsc.ifsc_code = "KVBL0002222".to_string();
        assert!(!is_duplicate_beneficiary(&different_ifsc, &stored()));

        let mut different_name = request();
        different_name.name = "Meera R Iyer".to_string();
        assert!(!is_duplicate_beneficiary(&different_name, &stored()));

        let mut different_rail = request();
        different_rail.transfer_type = TransferType::Neft;
        assert!(!is_duplicate_beneficiary(&different_rail, &stored()));
    }
}
