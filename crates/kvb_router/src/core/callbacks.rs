//! Ingestion of asynchronous partner callbacks.
//!
//! Shared rules: duplicate delivery fails loudly (never a silent no-op, so
//! duplicates stay visible in logs), only fields present in the callback are
//! written, and each success advances the user's onboarding checklist.

use api_models::{
    callbacks as callback_api,
    enums::{KycStatus, OnboardingStage},
};
use error_stack::{IntoReport, ResultExt};
use masking::PeekInterface;
use router_env::{instrument, logger, tracing, Flow};

use crate::{
    core::{
        bank_codes,
        errors::{ApiErrorResponse, RouterResponse, StorageErrorExt},
    },
    db::{AccountInterface, TransactionInterface, UserInterface},
    routes::AppState,
    services::{audit, ApplicationResponse},
    types::storage,
};

/// CBS opened (or failed to open) the user's account.
#[instrument(skip_all, fields(customer_id = %payload.customer_id))]
pub async fn handle_account_creation(
    app_state: &AppState,
    payload: callback_api::AccountCreationCallback,
) -> RouterResponse<()> {
    if payload.status_code != crate::consts::BANK_SUCCESS_CODE {
        let disposition =
            bank_codes::classify(bank_codes::OperationFamily::AccountCreation, &payload.status_code);
        let message = match disposition {
            bank_codes::ErrorDisposition::Fatal { message }
            | bank_codes::ErrorDisposition::Retryable { message } => message.to_string(),
            bank_codes::ErrorDisposition::Unknown => payload
                .status_message
                .clone()
                .unwrap_or_else(|| "account creation failed".to_string()),
        };
        logger::warn!(code = %payload.status_code, "account creation callback reported failure");
        return Err(ApiErrorResponse::BankErrorMessage { message }).into_report();
    }

    let user = app_state
        .store
        .find_user_by_customer_id(&payload.customer_id)
        .await
        .to_not_found_response(ApiErrorResponse::UserNotFound)?;

    // Idempotency: an account row carrying the same number means this
    // delivery was already processed.
    match app_state
        .store
        .find_account_by_customer_id(&payload.customer_id)
        .await
    {
        Ok(existing) => {
            if existing.account_number.peek() == payload.account_number.peek() {
                return Err(ApiErrorResponse::DuplicateCallback)
                    .into_report()
                    .attach_printable("account already updated for this customer");
            }
            // Partial update: only changed fields are written.
            app_state
                .store
                .update_account_by_user_id(
                    &existing.user_id,
                    storage::AccountUpdate::CallbackUpdate {
                        account_number: Some(payload.account_number.clone()),
                        ifsc_code: payload.ifsc_code.clone(),
                    },
                )
                .await
                .to_not_found_response(ApiErrorResponse::AccountNotFound)?;
        }
        Err(err) if err.current_context().is_db_not_found() => {
            app_state
                .store
                .insert_account(storage::AccountNew {
                    user_id: user.user_id.clone(),
                    customer_id: payload.customer_id.clone(),
                    account_number: payload.account_number.clone(),
                    ifsc_code: payload.ifsc_code.clone(),
                })
                .await
                .to_duplicate_response(ApiErrorResponse::DuplicateCallback)?;
        }
        Err(err) => {
            return Err(err).to_not_found_response(ApiErrorResponse::InternalServerError);
        }
    }

    advance_stage(app_state, &user.user_id, OnboardingStage::AccountCreation).await?;

    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(&user.user_id, &Flow::AccountCreationCallback, "account created"),
    );
    Ok(ApplicationResponse::StatusOk)
}

/// KYC verification status change.
#[instrument(skip_all, fields(customer_id = %payload.customer_id))]
pub async fn handle_kyc_status(
    app_state: &AppState,
    payload: callback_api::KycStatusCallback,
) -> RouterResponse<()> {
    let user = app_state
        .store
        .find_user_by_customer_id(&payload.customer_id)
        .await
        .to_not_found_response(ApiErrorResponse::UserNotFound)?;

    // Diff before write; re-delivering the same status is a duplicate.
    if user.kyc_status == Some(payload.status) {
        return Err(ApiErrorResponse::DuplicateCallback)
            .into_report()
            .attach_printable("kyc status already recorded");
    }

    app_state
        .store
        .update_user_by_id(
            &user.user_id,
            storage::UserUpdate::KycStatus {
                status: payload.status,
            },
        )
        .await
        .to_not_found_response(ApiErrorResponse::UserNotFound)?;

    if payload.status == KycStatus::Verified {
        advance_stage(app_state, &user.user_id, OnboardingStage::Kyc).await?;
    } else if payload.status == KycStatus::Rejected {
        logger::warn!(remarks = ?payload.remarks, "kyc rejected");
    }

    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(&user.user_id, &Flow::KycStatusCallback, "kyc status updated"),
    );
    Ok(ApplicationResponse::StatusOk)
}

/// Settlement status change for an in-flight payment.
#[instrument(skip_all, fields(transaction_id = %payload.transaction_id))]
pub async fn handle_payment_status(
    app_state: &AppState,
    payload: callback_api::PaymentStatusCallback,
) -> RouterResponse<()> {
    let transaction = app_state
        .store
        .find_transaction_by_transaction_id(&payload.transaction_id)
        .await
        .to_not_found_response(ApiErrorResponse::TransactionNotFound)?;

    let same_status = transaction.cbs_status == payload.cbs_status;
    let same_utr = payload.utr_ref_number.is_none()
        || transaction.utr_ref_number == payload.utr_ref_number;
    if same_status && same_utr {
        return Err(ApiErrorResponse::DuplicateCallback)
            .into_report()
            .attach_printable("payment status already recorded");
    }

    app_state
        .store
        .update_transaction_by_transaction_id(
            &payload.transaction_id,
            storage::TransactionUpdate::StatusUpdate {
                cbs_status: payload.cbs_status,
                utr_ref_number: payload.utr_ref_number.clone(),
            },
        )
        .await
        .to_not_found_response(ApiErrorResponse::TransactionNotFound)?;

    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(
            &transaction.user_id,
            &Flow::PaymentStatusCallback,
            "payment status updated",
        ),
    );
    Ok(ApplicationResponse::StatusOk)
}

/// Video KYC audit outcome. Code `"200"` gates on the secondary status
/// field; see [`bank_codes::vcip_invoke_error_message`].
#[instrument(skip_all, fields(customer_id = %payload.customer_id))]
pub async fn handle_vcip_audit(
    app_state: &AppState,
    payload: callback_api::VcipAuditCallback,
) -> RouterResponse<()> {
    let (message, is_error) =
        bank_codes::vcip_invoke_error_message(&payload.code, &payload.status);
    if is_error {
        logger::warn!(code = %payload.code, status = %payload.status, "vcip audit failed");
        return Err(ApiErrorResponse::BankErrorMessage {
            message: message.to_string(),
        })
        .into_report();
    }

    let user = app_state
        .store
        .find_user_by_customer_id(&payload.customer_id)
        .await
        .to_not_found_response(ApiErrorResponse::UserNotFound)?;

    if user.onboarding_stage >= OnboardingStage::Vcip {
        return Err(ApiErrorResponse::DuplicateCallback)
            .into_report()
            .attach_printable("vcip stage already recorded");
    }

    advance_stage(app_state, &user.user_id, OnboardingStage::Vcip).await?;

    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(&user.user_id, &Flow::VcipAuditCallback, "vcip audit recorded"),
    );
    Ok(ApplicationResponse::StatusOk)
}

/// Advance the monotonic onboarding checklist. Setting the same or a later
/// stage again is an idempotent no-op; the checklist never moves backwards.
async fn advance_stage(
    app_state: &AppState,
    user_id: &str,
    stage: OnboardingStage,
) -> crate::core::errors::RouterResult<()> {
    let user = app_state
        .store
        .find_user_by_id(user_id)
        .await
        .to_not_found_response(ApiErrorResponse::UserNotFound)?;

    if user.onboarding_stage >= stage {
        return Ok(());
    }

    app_state
        .store
        .update_user_by_id(user_id, storage::UserUpdate::OnboardingStage { stage })
        .await
        .to_not_found_response(ApiErrorResponse::UserNotFound)?;
    logger::info!(?stage, "onboarding stage advanced");
    Ok(())
}
