//! UPI device-binding and account-provisioning workflow.
//!
//! The protocol is a strict sequence: every step consumes identifiers minted
//! by the previous one, so steps run one at a time and none of them sits
//! behind a generic retry wrapper. A failed step in first-time binding burns
//! the client session (the partner binds a client id to exactly one
//! attempt); a failed remap for an already provisioned user only deactivates
//! the device.

pub mod helpers;
pub mod state;
pub mod validator;

use api_models::{
    enums::{DeviceOs, OnboardingStage},
    upi as upi_api,
};
use error_stack::{IntoReport, ResultExt};
use masking::{PeekInterface, Secret};
use router_env::{instrument, logger, tracing, Flow};

use self::state::ProvisioningState;
use crate::{
    connector::{kvb::transformers as kvb_types, Kvb},
    consts,
    core::{
        bank_codes::OperationFamily,
        errors::{ApiErrorResponse, RouterResponse, RouterResult, StorageErrorExt},
        locking,
        retry::{call_with_bank_retry, classify_bank_failure, RetryPolicy},
        session::{ProvisioningSession, SessionField},
    },
    db::{AccountInterface, DeviceInterface, TransactionInterface, UserInterface},
    routes::{AppState, UserSession},
    services::{self, audit, ApplicationResponse},
    types::storage,
    utils,
};

/// First half of provisioning: bind the SIM/device and verify the user.
/// Returns the minted client id and mapping transaction id; the app needs
/// both to drive its SDK.
#[instrument(skip_all, fields(user_id = %user_session.user_id))]
pub async fn sim_binding_and_sms_verification(
    app_state: &AppState,
    user_session: &UserSession,
    req: upi_api::SimBindingRequest,
) -> RouterResponse<upi_api::SimBindingResponse> {
    validator::validate_sim_binding(&req)?;

    let lock = locking::lock_user(app_state, &user_session.user_id, "sim_binding")
        .await?
        .is_acquired()?;
    let result = sim_binding_inner(app_state, user_session, req).await;
    locking::release_lock(app_state, lock).await?;

    let response = result?;
    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(
            &user_session.user_id,
            &Flow::SimBinding,
            "sim binding and verification completed",
        ),
    );
    Ok(ApplicationResponse::Json(response))
}

async fn sim_binding_inner(
    app_state: &AppState,
    user_session: &UserSession,
    req: upi_api::SimBindingRequest,
) -> RouterResult<upi_api::SimBindingResponse> {
    let user_id = &user_session.user_id;
    let device_id_plain =
        services::encryption::decrypt_field(req.device_id.clone(), &user_session.session_key)?;

    // Step: mobile mapping type 0. Nothing is persisted yet, so a failure
    // here burns nothing.
    let mapping = classify_bank_failure(
        OperationFamily::Upi,
        Kvb::mobile_mapping(
            app_state.transport.as_ref(),
            &app_state.conf.bank,
            kvb_types::MobileMappingRequest {
                mapping_type: consts::MOBILE_MAPPING_TYPE_REGISTER,
                mobile_number: req.mobile_number.clone(),
                device_id: device_id_plain.clone(),
                device_ip: req.device_ip.clone(),
                os: req.os.to_string(),
                os_version: req.os_version.clone(),
                transaction_id: None,
                client_id: None,
            },
        )
        .await
        .and_then(ensure_mapping_success),
    )?;

    let transaction_id = mapping
        .trans_id
        .ok_or(ApiErrorResponse::InternalServerError)
        .into_report()
        .attach_printable("mobile mapping type 0 succeeded without a transaction id")?;

    // One fresh client id per binding attempt.
    let client_id = helpers::generate_client_id(req.os);

    let cache_only = req.binding_type.as_deref() == Some(consts::CACHE_ONLY_BINDING_TYPE);
    if !cache_only {
        app_state
            .store
            .insert_device(storage::DeviceNew {
                user_id: user_id.clone(),
                device_id_encrypted: req.device_id.clone(),
                mobile_mapping_txn_id: Some(transaction_id.clone()),
                client_id: Some(client_id.clone()),
            })
            .await
            .to_duplicate_response(ApiErrorResponse::InternalServerError)?;
    }

    // Step: verify user. Not retried and not resumable; a failure fails the
    // whole call and burns the identifiers minted above.
    let verify_result = Kvb::verify_user(
        app_state.transport.as_ref(),
        &app_state.conf.bank,
        kvb_types::VerifyUserRequest {
            mobile_number: req.mobile_number.clone(),
            transaction_id: transaction_id.clone(),
            client_id: client_id.clone(),
        },
    )
    .await;

    if let Err(report) = verify_result {
        return helpers::burn_and_classify(app_state, user_id, report).await;
    }

    app_state
        .session_store
        .put(
            user_id,
            ProvisioningSession {
                transaction_id: Some(transaction_id.clone()),
                client_id: Some(client_id.clone()),
                ..Default::default()
            },
        )
        .await?;

    logger::info!(state = ?ProvisioningState::Verified, "sim binding verified");

    Ok(upi_api::SimBindingResponse {
        client_id,
        transaction_id,
    })
}

/// Second half of provisioning: log the bound device in and walk the chain
/// through to an attached bank account and a minted UPI id.
#[instrument(skip_all, fields(user_id = %user_session.user_id))]
pub async fn create_upi_id(
    app_state: &AppState,
    user_session: &UserSession,
    req: upi_api::CreateUpiRequest,
) -> RouterResponse<upi_api::UpiProvisioningResponse> {
    let user_id = &user_session.user_id;

    // Refusal before anything else, including the SMS wait: a present
    // UPI id is terminal and must trigger no bank call.
    let account = app_state
        .store
        .find_account_by_user_id(user_id)
        .await
        .to_not_found_response(ApiErrorResponse::AccountNotFound)?;
    validator::ensure_not_provisioned(&account)?;

    let user = app_state
        .store
        .find_user_by_id(user_id)
        .await
        .to_not_found_response(ApiErrorResponse::UserNotFound)?;

    let lock = locking::lock_user(app_state, user_id, "create_upi_id")
        .await?
        .is_acquired()?;
    let result = create_upi_id_inner(app_state, user_session, &req, &account, &user).await;
    locking::release_lock(app_state, lock).await?;

    let response = result?;
    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(user_id, &Flow::CreateUpiId, "upi id provisioned"),
    );
    Ok(ApplicationResponse::Json(response))
}

async fn create_upi_id_inner(
    app_state: &AppState,
    user_session: &UserSession,
    req: &upi_api::CreateUpiRequest,
    account: &storage::Account,
    user: &storage::User,
) -> RouterResult<upi_api::UpiProvisioningResponse> {
    let user_id = &user_session.user_id;

    helpers::wait_for_binding_sms(app_state).await;

    let device = app_state
        .store
        .find_device_by_user_id(user_id)
        .await
        .to_not_found_response(ApiErrorResponse::DeviceNotFound)?;
    let device_id_plain =
        services::encryption::decrypt_field(req.device_id.clone(), &user_session.session_key)?;

    let transaction_id = resolve_with_device_fallback(
        app_state,
        user_id,
        SessionField::TransactionId,
        device.mobile_mapping_txn_id.clone(),
    )
    .await?;
    let client_id = resolve_with_device_fallback(
        app_state,
        user_id,
        SessionField::ClientId,
        device.client_id.clone(),
    )
    .await?;

    // Step: mobile mapping type 1. Its code steers the flow rather than
    // signalling plain success/failure.
    let mapping = Kvb::mobile_mapping(
        app_state.transport.as_ref(),
        &app_state.conf.bank,
        kvb_types::MobileMappingRequest {
            mapping_type: consts::MOBILE_MAPPING_TYPE_LOGIN,
            mobile_number: user.mobile_number.clone(),
            device_id: device_id_plain.clone(),
            device_ip: String::new(),
            os: req.os.to_string(),
            os_version: req.os_version.clone(),
            transaction_id: Some(transaction_id.clone()),
            client_id: Some(client_id.clone()),
        },
    )
    .await;
    let mapping = match mapping {
        Ok(mapping) => mapping,
        Err(report) => return helpers::burn_and_classify(app_state, user_id, report).await,
    };

    match mapping.resp_code.as_str() {
        consts::BANK_SUCCESS_CODE => {
            logger::info!(state = ?ProvisioningState::LoggedIn, "device recognised, fresh registration path");
            if let Some(server_id) = mapping.server_id.clone() {
                persist_session_rotation(app_state, user_id, Some(server_id), None).await?;
            }
            run_fresh_registration_steps(
                app_state,
                user_session,
                &device_id_plain,
                req.os,
                &req.os_version,
                user,
                account,
                &client_id,
            )
            .await?;
        }
        code if consts::MOBILE_MAPPING_REMAP_CODES.contains(&code) => {
            logger::info!(
                mapping_code = code,
                "device requires remapping before provisioning"
            );
            run_remap_steps(
                app_state,
                user_session,
                &device_id_plain,
                req.os,
                &req.os_version,
                user,
                &client_id,
                RemapFailurePolicy::BurnClientSession,
            )
            .await?;
        }
        consts::MOBILE_MAPPING_SMS_NOT_RECEIVED_CODE => {
            helpers::burn_client_session(app_state, user_id).await;
            return Err(ApiErrorResponse::SmsNotReceived).into_report();
        }
        code => {
            let report = error_stack::report!(
                crate::core::errors::ConnectorError::BankErrorResponse {
                    code: code.to_string(),
                    message: mapping.resp_message.clone(),
                }
            );
            return helpers::burn_and_classify(app_state, user_id, report).await;
        }
    }

    // Step: list accounts, with a freshly built credential.
    let crypto_info = helpers::fresh_crypto_info(
        app_state,
        user_id,
        &device_id_plain,
        req.os,
        &req.os_version,
    )
    .await?
    .build();
    let accounts = match Kvb::list_accounts(
        app_state.transport.as_ref(),
        &app_state.conf.bank,
        kvb_types::ListAccountsRequest {
            crypto_info: crypto_info.clone(),
            mobile_number: user.mobile_number.clone(),
        },
    )
    .await
    {
        Ok(response) => response,
        Err(report) => return helpers::burn_and_classify(app_state, user_id, report).await,
    };

    let own_account_number = account.account_number.peek();
    let listed = accounts
        .accounts
        .iter()
        .find(|detail| &detail.account_number == own_account_number)
        .or_else(|| accounts.accounts.first())
        .ok_or(ApiErrorResponse::BankErrorMessage {
            message: "No bank account found for the registered mobile number".to_string(),
        })
        .into_report()?
        .clone();

    // Step: PSP availability.
    let psp_result = Kvb::psp_availability(
        app_state.transport.as_ref(),
        &app_state.conf.bank,
        kvb_types::PspAvailabilityRequest {
            crypto_info: helpers::fresh_crypto_info(
                app_state,
                user_id,
                &device_id_plain,
                req.os,
                &req.os_version,
            )
            .await?
            .build(),
            psp_handle: app_state.conf.bank.psp_handle.clone(),
        },
    )
    .await;
    if let Err(report) = psp_result {
        return helpers::burn_and_classify(app_state, user_id, report).await;
    }

    // Step: add bank account; the response's Payeraddr is the minted
    // address.
    let added = match Kvb::add_bank_account(
        app_state.transport.as_ref(),
        &app_state.conf.bank,
        kvb_types::AddBankAccountRequest {
            crypto_info: helpers::fresh_crypto_info(
                app_state,
                user_id,
                &device_id_plain,
                req.os,
                &req.os_version,
            )
            .await?
            .build(),
            mobile_number: user.mobile_number.clone(),
            account_number: listed.account_number.clone(),
            ifsc: listed.ifsc.clone(),
        },
    )
    .await
    {
        Ok(response) => response,
        Err(report) => return helpers::burn_and_classify(app_state, user_id, report).await,
    };

    let upi_id = added
        .payer_addr
        .ok_or(ApiErrorResponse::InternalServerError)
        .into_report()
        .attach_printable("add bank account succeeded without a payer address")?;

    // Terminal persistence. A failure past this point is logged and
    // surfaced, but the bank-side success is not compensated.
    app_state
        .store
        .update_account_by_user_id(user_id, storage::AccountUpdate::UpiId { upi_id: upi_id.clone() })
        .await
        .to_not_found_response(ApiErrorResponse::AccountNotFound)?;
    app_state
        .store
        .update_user_by_id(
            user_id,
            storage::UserUpdate::OnboardingStage {
                stage: OnboardingStage::UpiGeneration,
            },
        )
        .await
        .to_not_found_response(ApiErrorResponse::UserNotFound)?;

    logger::info!(state = ?ProvisioningState::Provisioned, "upi id provisioned");

    Ok(upi_api::UpiProvisioningResponse {
        upi_id: Secret::new(upi_id),
        account_number: account.account_number.clone(),
        onboarding_stage: OnboardingStage::UpiGeneration,
    })
}

/// Designated re-entry point for an already provisioned user whose device
/// session expired: re-run mobile mapping type 1 and remap if asked to. On
/// upstream failure the device is marked inactive; the client session stays,
/// the user already holds a UPI id.
#[instrument(skip_all, fields(user_id = %user_session.user_id))]
pub async fn remap_existing_upi_id(
    app_state: &AppState,
    user_session: &UserSession,
    req: upi_api::RemapUpiRequest,
) -> RouterResponse<upi_api::RemapUpiResponse> {
    let user_id = &user_session.user_id;

    let account = app_state
        .store
        .find_account_by_user_id(user_id)
        .await
        .to_not_found_response(ApiErrorResponse::AccountNotFound)?;
    validator::require_upi_id(&account)?;

    let user = app_state
        .store
        .find_user_by_id(user_id)
        .await
        .to_not_found_response(ApiErrorResponse::UserNotFound)?;
    let device = app_state
        .store
        .find_device_by_user_id(user_id)
        .await
        .to_not_found_response(ApiErrorResponse::DeviceNotFound)?;
    let device_id_plain =
        services::encryption::decrypt_field(req.device_id.clone(), &user_session.session_key)?;

    let transaction_id = resolve_with_device_fallback(
        app_state,
        user_id,
        SessionField::TransactionId,
        device.mobile_mapping_txn_id.clone(),
    )
    .await?;
    let client_id = resolve_with_device_fallback(
        app_state,
        user_id,
        SessionField::ClientId,
        device.client_id.clone(),
    )
    .await?;

    let mapping = Kvb::mobile_mapping(
        app_state.transport.as_ref(),
        &app_state.conf.bank,
        kvb_types::MobileMappingRequest {
            mapping_type: consts::MOBILE_MAPPING_TYPE_LOGIN,
            mobile_number: user.mobile_number.clone(),
            device_id: device_id_plain.clone(),
            device_ip: String::new(),
            os: req.os.to_string(),
            os_version: req.os_version.clone(),
            transaction_id: Some(transaction_id),
            client_id: Some(client_id.clone()),
        },
    )
    .await;
    let mapping = match mapping {
        Ok(mapping) => mapping,
        Err(report) => return helpers::deactivate_and_classify(app_state, user_id, report).await,
    };

    match mapping.resp_code.as_str() {
        consts::BANK_SUCCESS_CODE => {
            if let Some(server_id) = mapping.server_id.clone() {
                persist_session_rotation(app_state, user_id, Some(server_id), None).await?;
            }
        }
        code if consts::MOBILE_MAPPING_REMAP_CODES.contains(&code) => {
            run_remap_steps(
                app_state,
                user_session,
                &device_id_plain,
                req.os,
                &req.os_version,
                &user,
                &client_id,
                RemapFailurePolicy::DeactivateDevice,
            )
            .await?;
        }
        code => {
            let report = error_stack::report!(
                crate::core::errors::ConnectorError::BankErrorResponse {
                    code: code.to_string(),
                    message: mapping.resp_message.clone(),
                }
            );
            return helpers::deactivate_and_classify(app_state, user_id, report).await;
        }
    }

    app_state
        .store
        .update_device_by_user_id(user_id, storage::DeviceUpdate::ActiveFlag { is_active: true })
        .await
        .to_not_found_response(ApiErrorResponse::DeviceNotFound)?;

    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(user_id, &Flow::RemapUpiId, "device remapped"),
    );
    Ok(ApplicationResponse::Json(upi_api::RemapUpiResponse {
        remapped: true,
    }))
}

/// Set the UPI PIN. Single bank call, classified but never retried (the OTP
/// inside is single-use).
#[instrument(skip_all, fields(user_id = %user_session.user_id))]
pub async fn set_upi_pin(
    app_state: &AppState,
    user_session: &UserSession,
    req: upi_api::SetUpiPinRequest,
) -> RouterResponse<upi_api::EncryptedPayloadResponse> {
    let context = load_bound_context(app_state, user_session, req.device_id.clone()).await?;

    let crypto_info = helpers::fresh_crypto_info(
        app_state,
        &user_session.user_id,
        &context.device_id_plain,
        req.os,
        &req.os_version,
    )
    .await?
    .build();

    classify_bank_failure(
        OperationFamily::Upi,
        Kvb::set_upi_pin(
            app_state.transport.as_ref(),
            &app_state.conf.bank,
            kvb_types::SetUpiPinRequest {
                crypto_info,
                card_digits: req.card_digits.clone(),
                expiry: req.expiry.clone(),
                otp: req.otp.clone(),
            },
        )
        .await,
    )?;

    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(&user_session.user_id, &Flow::SetUpiPin, "upi pin set"),
    );
    let payload = upi_api::UpiPinSetResponse { pin_set: true };
    services::encryption::encrypt_response(&payload, &user_session.session_key)
        .map(ApplicationResponse::Json)
}

/// Balance enquiry. Single bank call; the balance travels back encrypted.
#[instrument(skip_all, fields(user_id = %user_session.user_id))]
pub async fn check_account_balance(
    app_state: &AppState,
    user_session: &UserSession,
    req: upi_api::BalanceEnquiryRequest,
) -> RouterResponse<upi_api::EncryptedPayloadResponse> {
    let context = load_bound_context(app_state, user_session, req.device_id.clone()).await?;

    let crypto_info = helpers::fresh_crypto_info(
        app_state,
        &user_session.user_id,
        &context.device_id_plain,
        req.os,
        &req.os_version,
    )
    .await?
    .build();

    let response = classify_bank_failure(
        OperationFamily::Upi,
        Kvb::balance_enquiry(
            app_state.transport.as_ref(),
            &app_state.conf.bank,
            kvb_types::BalanceEnquiryRequest {
                crypto_info,
                credential_block: req.credential_block.clone(),
            },
        )
        .await,
    )?;

    let payload = upi_api::AccountBalanceResponse {
        balance: response.balance.unwrap_or_default(),
    };
    services::encryption::encrypt_response(&payload, &user_session.session_key)
        .map(ApplicationResponse::Json)
}

/// Validate a payee address before payment.
#[instrument(skip_all, fields(user_id = %user_session.user_id))]
pub async fn validate_vpa(
    app_state: &AppState,
    user_session: &UserSession,
    req: upi_api::VpaValidationRequest,
) -> RouterResponse<upi_api::EncryptedPayloadResponse> {
    let context = load_bound_context(app_state, user_session, req.device_id.clone()).await?;

    let own_upi_id = validator::require_upi_id(&context.account)?;
    validator::ensure_not_self_vpa(&own_upi_id, req.payee_vpa.peek())?;

    let crypto_info = helpers::fresh_crypto_info(
        app_state,
        &user_session.user_id,
        &context.device_id_plain,
        req.os,
        &req.os_version,
    )
    .await?
    .build();

    let response = classify_bank_failure(
        OperationFamily::Upi,
        Kvb::validate_vpa(
            app_state.transport.as_ref(),
            &app_state.conf.bank,
            kvb_types::VpaValidationRequest {
                crypto_info,
                payee_vpa: req.payee_vpa.clone(),
            },
        )
        .await,
    )?;

    let payload = upi_api::VpaValidationResponse {
        valid: true,
        payee_name: response.payee_name,
    };
    services::encryption::encrypt_response(&payload, &user_session.session_key)
        .map(ApplicationResponse::Json)
}

/// Pay a virtual payment address. The transaction id is issued once and
/// reused across retries; only the bank's explicit technical-error resend
/// code re-issues it.
#[instrument(skip_all, fields(user_id = %user_session.user_id))]
pub async fn process_payment_with_vpa(
    app_state: &AppState,
    user_session: &UserSession,
    req: upi_api::VpaPaymentRequest,
) -> RouterResponse<upi_api::EncryptedPayloadResponse> {
    validator::validate_amount(req.amount)?;

    let context = load_bound_context(app_state, user_session, req.device_id.clone()).await?;
    let own_upi_id = validator::require_upi_id(&context.account)?;
    validator::ensure_not_self_vpa(&own_upi_id, req.payee_vpa.peek())?;

    let user_id = &user_session.user_id;
    let crypto_info = helpers::fresh_crypto_info(
        app_state,
        user_id,
        &context.device_id_plain,
        req.os,
        &req.os_version,
    )
    .await?
    .build();

    let mut transaction_id = utils::generate_transaction_id();
    let policy = RetryPolicy {
        max_attempts: app_state.conf.upi.max_retry_attempts,
        ..Default::default()
    };

    let transport = app_state.transport.clone();
    let bank_conf = app_state.conf.clone();
    let response = call_with_bank_retry(OperationFamily::Payment, policy, |ctx| {
        if ctx.last_bank_code.as_deref() == Some(consts::TECHNICAL_ERROR_RESEND_CODE) {
            // Controlled re-issue path; every other retry reuses the id.
            transaction_id = utils::generate_transaction_id();
            logger::info!("re-issued transaction id after technical-error resend signal");
        }
        let request = kvb_types::VpaPaymentRequest {
            crypto_info: crypto_info.clone(),
            payee_vpa: req.payee_vpa.clone(),
            amount: req.amount,
            remarks: req.remarks.clone(),
            credential_block: req.credential_block.clone(),
            transaction_id: transaction_id.clone(),
        };
        let transport = transport.clone();
        let bank_conf = bank_conf.clone();
        async move { Kvb::pay_vpa(transport.as_ref(), &bank_conf.bank, request).await }
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
            beneficiary_id: None,
            amount: req.amount,
            cbs_status: api_models::enums::CbsTransactionStatus::Pending,
            utr_ref_number: response.utr_ref_number.clone(),
            otp_status: None,
        })
        .await
        .to_duplicate_response(ApiErrorResponse::InternalServerError)?;

    audit::record(
        app_state.audit.clone(),
        audit::AuditEntry::new(user_id, &Flow::VpaPayment, "vpa payment submitted"),
    );

    let payload = upi_api::UpiPaymentResponse {
        transaction_id: final_transaction_id,
        utr_ref_number: response.utr_ref_number,
    };
    services::encryption::encrypt_response(&payload, &user_session.session_key)
        .map(ApplicationResponse::Json)
}

// --- shared step runners ----------------------------------------------------

/// Which failure policy a remap run follows: first-time binding burns the
/// client session, re-provisioning only deactivates the device.
#[derive(Clone, Copy, Debug)]
enum RemapFailurePolicy {
    BurnClientSession,
    DeactivateDevice,
}

#[allow(clippy::too_many_arguments)]
async fn run_fresh_registration_steps(
    app_state: &AppState,
    user_session: &UserSession,
    device_id_plain: &str,
    os: DeviceOs,
    os_version: &str,
    user: &storage::User,
    account: &storage::Account,
    client_id: &str,
) -> RouterResult<()> {
    let user_id = &user_session.user_id;

    // Step: login-challenge validation, skipped when a login-ref id is
    // already cached (the session is treated as authenticated).
    let cached_login_ref = app_state
        .session_store
        .resolve(app_state.store.as_ref(), user_id, SessionField::LoginRefId)
        .await?;
    if cached_login_ref.is_none() {
        let lc = match Kvb::lc_validator(
            app_state.transport.as_ref(),
            &app_state.conf.bank,
            kvb_types::LcValidatorRequest {
                mobile_number: user.mobile_number.clone(),
                client_id: client_id.to_string(),
            },
        )
        .await
        {
            Ok(response) => response,
            Err(report) => return helpers::burn_and_classify(app_state, user_id, report).await,
        };
        persist_session_rotation(app_state, user_id, None, lc.login_ref_id).await?;
    } else {
        logger::info!("login-ref id already cached, skipping lc validation");
    }

    // Step: demographic data feeding profile creation.
    let demographics = match Kvb::demographics(
        app_state.transport.as_ref(),
        &app_state.conf.bank,
        kvb_types::DemographicsRequest {
            customer_id: account.customer_id.clone(),
            mobile_number: user.mobile_number.clone(),
        },
    )
    .await
    {
        Ok(response) => response,
        Err(report) => return helpers::burn_and_classify(app_state, user_id, report).await,
    };

    // Step: profile creation.
    let crypto_info =
        helpers::fresh_crypto_info(app_state, user_id, device_id_plain, os, os_version)
            .await?
            .build();
    let profile_result = Kvb::profile_creation(
        app_state.transport.as_ref(),
        &app_state.conf.bank,
        kvb_types::ProfileCreationRequest {
            crypto_info,
            mobile_number: user.mobile_number.clone(),
            customer_name: demographics.customer_name.unwrap_or_default(),
        },
    )
    .await;
    if let Err(report) = profile_result {
        return helpers::burn_and_classify(app_state, user_id, report).await;
    }
    logger::info!(state = ?ProvisioningState::ProfileCreated, "psp profile created");

    // Step: token keys for the freshly registered profile.
    let crypto_info =
        helpers::fresh_crypto_info(app_state, user_id, device_id_plain, os, os_version)
            .await?
            .build();
    let keys_result = Kvb::list_keys(
        app_state.transport.as_ref(),
        &app_state.conf.bank,
        kvb_types::ListKeysRequest {
            crypto_info,
            mobile_number: user.mobile_number.clone(),
            mode: kvb_types::ListKeysMode::Registered,
        },
    )
    .await;
    if let Err(report) = keys_result {
        return helpers::burn_and_classify(app_state, user_id, report).await;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_remap_steps(
    app_state: &AppState,
    user_session: &UserSession,
    device_id_plain: &str,
    os: DeviceOs,
    os_version: &str,
    user: &storage::User,
    client_id: &str,
    failure_policy: RemapFailurePolicy,
) -> RouterResult<()> {
    let user_id = &user_session.user_id;

    // Step: remapping rotates the server-side session ids.
    let remap = match Kvb::re_mapping(
        app_state.transport.as_ref(),
        &app_state.conf.bank,
        kvb_types::ReMappingRequest {
            mobile_number: user.mobile_number.clone(),
            client_id: client_id.to_string(),
            device_id: device_id_plain.to_string(),
        },
    )
    .await
    {
        Ok(response) => response,
        Err(report) => return fail_remap(app_state, user_id, report, failure_policy).await,
    };

    persist_session_rotation(app_state, user_id, remap.server_id, remap.login_ref_id).await?;

    // Step: token keys for the existing profile.
    let crypto_info =
        helpers::fresh_crypto_info(app_state, user_id, device_id_plain, os, os_version)
            .await?
            .build();
    let keys_result = Kvb::list_keys(
        app_state.transport.as_ref(),
        &app_state.conf.bank,
        kvb_types::ListKeysRequest {
            crypto_info,
            mobile_number: user.mobile_number.clone(),
            mode: kvb_types::ListKeysMode::Existing,
        },
    )
    .await;
    if let Err(report) = keys_result {
        return fail_remap(app_state, user_id, report, failure_policy).await;
    }

    logger::info!(state = ?ProvisioningState::LoggedIn, "remapping completed");
    Ok(())
}

async fn fail_remap<T>(
    app_state: &AppState,
    user_id: &str,
    report: error_stack::Report<crate::core::errors::ConnectorError>,
    failure_policy: RemapFailurePolicy,
) -> RouterResult<T> {
    match failure_policy {
        RemapFailurePolicy::BurnClientSession => {
            helpers::burn_and_classify(app_state, user_id, report).await
        }
        RemapFailurePolicy::DeactivateDevice => {
            helpers::deactivate_and_classify(app_state, user_id, report).await
        }
    }
}

/// Persist rotated server-side identifiers to both the cache and the
/// durable device row.
async fn persist_session_rotation(
    app_state: &AppState,
    user_id: &str,
    server_id: Option<String>,
    login_ref_id: Option<String>,
) -> RouterResult<()> {
    if server_id.is_none() && login_ref_id.is_none() {
        return Ok(());
    }
    app_state
        .session_store
        .put(
            user_id,
            ProvisioningSession {
                server_id: server_id.clone(),
                login_ref_id: login_ref_id.clone(),
                ..Default::default()
            },
        )
        .await?;
    app_state
        .store
        .update_device_by_user_id(
            user_id,
            storage::DeviceUpdate::ClientSession {
                server_id,
                login_ref_id,
            },
        )
        .await
        .to_not_found_response(ApiErrorResponse::DeviceNotFound)?;
    Ok(())
}

/// Cache-then-durable resolution with an explicit row fallback, for the two
/// identifiers the caller has already loaded the device row for.
async fn resolve_with_device_fallback(
    app_state: &AppState,
    user_id: &str,
    field: SessionField,
    durable: Option<String>,
) -> RouterResult<String> {
    if let Some(value) = app_state
        .session_store
        .resolve(app_state.store.as_ref(), user_id, field)
        .await?
    {
        return Ok(value);
    }
    durable
        .ok_or(ApiErrorResponse::InvalidRequestData {
            message: "binding session has expired, please redo sim binding".to_string(),
        })
        .into_report()
}

struct BoundContext {
    account: storage::Account,
    device_id_plain: String,
}

/// Common prelude of post-provisioning operations: active device, account
/// row, decrypted device id.
async fn load_bound_context(
    app_state: &AppState,
    user_session: &UserSession,
    device_id: Secret<String>,
) -> RouterResult<BoundContext> {
    let device = app_state
        .store
        .find_device_by_user_id(&user_session.user_id)
        .await
        .to_not_found_response(ApiErrorResponse::DeviceNotFound)?;
    if !device.is_active {
        return Err(ApiErrorResponse::InvalidRequestData {
            message: "device binding is inactive, please remap the device".to_string(),
        })
        .into_report();
    }

    let account = app_state
        .store
        .find_account_by_user_id(&user_session.user_id)
        .await
        .to_not_found_response(ApiErrorResponse::AccountNotFound)?;

    let device_id_plain =
        services::encryption::decrypt_field(device_id, &user_session.session_key)?;

    Ok(BoundContext {
        account,
        device_id_plain,
    })
}

fn ensure_mapping_success(
    response: kvb_types::MobileMappingResponse,
) -> common_utils::errors::CustomResult<
    kvb_types::MobileMappingResponse,
    crate::core::errors::ConnectorError,
> {
    if response.resp_code == consts::BANK_SUCCESS_CODE {
        Ok(response)
    } else {
        Err(crate::core::errors::ConnectorError::BankErrorResponse {
            code: response.resp_code.clone(),
            message: response.resp_message.clone(),
        })
        .into_report()
    }
}
