//! Callback ingestion: idempotency and partial-update discipline.

mod common;

use api_models::{
    callbacks as callback_api,
    enums::{CbsTransactionStatus, KycStatus, OnboardingStage},
};
use kvb_router::{
    core::{callbacks, errors::ApiErrorResponse},
    db::{AccountInterface, TransactionInterface, UserInterface},
    types::storage,
};
use masking::{PeekInterface, Secret};

use common::{seed_account, seed_user, test_context};

fn account_creation_payload() -> callback_api::AccountCreationCallback {
    callback_api::AccountCreationCallback {
        customer_id: "cust-1".to_string(),
        account_number: Secret::new("5555666677778888".to_string()),
        status_code: "0".to_string(),
        status_message: None,
        ifsc_code: Some("KVBL0000002".to_string()),
    }
}

#[tokio::test]
async fn account_creation_creates_row_and_advances_stage() {
    let ctx = test_context();
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;

    callbacks::handle_account_creation(&ctx.state, account_creation_payload())
        .await
        .expect("callback processed");

    let account = ctx
        .db
        .find_account_by_customer_id("cust-1")
        .await
        .expect("account created");
    assert_eq!(account.account_number.peek(), "5555666677778888");

    let user = ctx.db.find_user_by_id("user-1").await.expect("user");
    assert_eq!(user.onboarding_stage, OnboardingStage::AccountCreation);
}

#[tokio::test]
async fn duplicate_account_creation_fails_loudly() {
    let ctx = test_context();
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;

    callbacks::handle_account_creation(&ctx.state, account_creation_payload())
        .await
        .expect("first delivery processed");

    let report = callbacks::handle_account_creation(&ctx.state, account_creation_payload())
        .await
        .expect_err("duplicate must fail");
    assert_eq!(*report.current_context(), ApiErrorResponse::DuplicateCallback);
}

#[tokio::test]
async fn failed_account_creation_surfaces_classified_message() {
    let ctx = test_context();
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;

    let mut payload = account_creation_payload();
    payload.status_code = "A02".to_string();

    let report = callbacks::handle_account_creation(&ctx.state, payload)
        .await
        .expect_err("failure code");
    assert_eq!(
        *report.current_context(),
        ApiErrorResponse::BankErrorMessage {
            message: "KYC details do not match the submitted documents".to_string()
        }
    );
}

#[tokio::test]
async fn kyc_status_diffs_before_write() {
    let ctx = test_context();
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;

    let payload = callback_api::KycStatusCallback {
        customer_id: "cust-1".to_string(),
        status: KycStatus::Verified,
        remarks: None,
    };

    callbacks::handle_kyc_status(&ctx.state, payload.clone())
        .await
        .expect("first delivery processed");

    let user = ctx.db.find_user_by_id("user-1").await.expect("user");
    assert_eq!(user.kyc_status, Some(KycStatus::Verified));
    assert_eq!(user.onboarding_stage, OnboardingStage::Kyc);

    let report = callbacks::handle_kyc_status(&ctx.state, payload)
        .await
        .expect_err("same status again is a duplicate");
    assert_eq!(*report.current_context(), ApiErrorResponse::DuplicateCallback);
}

#[tokio::test]
async fn payment_status_updates_only_changed_fields() {
    let ctx = test_context();
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", None).await;

    ctx.db
        .insert_transaction(storage::TransactionNew {
            transaction_id: "123456789012".to_string(),
            user_id: "user-1".to_string(),
            beneficiary_id: None,
            amount: 10_000,
            cbs_status: CbsTransactionStatus::Pending,
            utr_ref_number: None,
            otp_status: None,
        })
        .await
        .expect("seed transaction");

    callbacks::handle_payment_status(
        &ctx.state,
        callback_api::PaymentStatusCallback {
            transaction_id: "123456789012".to_string(),
            cbs_status: CbsTransactionStatus::Success,
            utr_ref_number: Some("UTR0009998887".to_string()),
        },
    )
    .await
    .expect("status updated");

    let transaction = ctx
        .db
        .find_transaction_by_transaction_id("123456789012")
        .await
        .expect("transaction");
    assert_eq!(transaction.cbs_status, CbsTransactionStatus::Success);
    assert_eq!(transaction.utr_ref_number.as_deref(), Some("UTR0009998887"));

    let report = callbacks::handle_payment_status(
        &ctx.state,
        callback_api::PaymentStatusCallback {
            transaction_id: "123456789012".to_string(),
            cbs_status: CbsTransactionStatus::Success,
            utr_ref_number: Some("UTR0009998887".to_string()),
        },
    )
    .await
    .expect_err("duplicate delivery must fail");
    assert_eq!(*report.current_context(), ApiErrorResponse::DuplicateCallback);
}

#[tokio::test]
async fn unknown_transaction_callback_is_an_error() {
    let ctx = test_context();

    let report = callbacks::handle_payment_status(
        &ctx.state,
        callback_api::PaymentStatusCallback {
            transaction_id: "does-not-exist".to_string(),
            cbs_status: CbsTransactionStatus::Success,
            utr_ref_number: None,
        },
    )
    .await
    .expect_err("unknown transaction");
    assert_eq!(*report.current_context(), ApiErrorResponse::TransactionNotFound);
}

#[tokio::test]
async fn vcip_audit_gates_on_secondary_status() {
    let ctx = test_context();
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;

    // code 200 + failure status is an error, no state change.
    let report = callbacks::handle_vcip_audit(
        &ctx.state,
        callback_api::VcipAuditCallback {
            customer_id: "cust-1".to_string(),
            code: "200".to_string(),
            status: "failure".to_string(),
            remarks: None,
        },
    )
    .await
    .expect_err("failure status");
    assert!(matches!(
        report.current_context(),
        ApiErrorResponse::BankErrorMessage { .. }
    ));

    // code 200 + success advances the stage.
    callbacks::handle_vcip_audit(
        &ctx.state,
        callback_api::VcipAuditCallback {
            customer_id: "cust-1".to_string(),
            code: "200".to_string(),
            status: "success".to_string(),
            remarks: None,
        },
    )
    .await
    .expect("success status processed");

    let user = ctx.db.find_user_by_id("user-1").await.expect("user");
    assert_eq!(user.onboarding_stage, OnboardingStage::Vcip);

    // Re-delivery is a duplicate.
    let report = callbacks::handle_vcip_audit(
        &ctx.state,
        callback_api::VcipAuditCallback {
            customer_id: "cust-1".to_string(),
            code: "200".to_string(),
            status: "success".to_string(),
            remarks: None,
        },
    )
    .await
    .expect_err("duplicate stage");
    assert_eq!(*report.current_context(), ApiErrorResponse::DuplicateCallback);
}
