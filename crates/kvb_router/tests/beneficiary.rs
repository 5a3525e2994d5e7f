//! Beneficiary family: the classify-and-retry template.

mod common;

use api_models::{
    beneficiary as beneficiary_api,
    enums::{CbsTransactionStatus, OtpStatus, TransferType},
};
use kvb_router::{
    core::{beneficiary, errors::ApiErrorResponse},
    services::ApplicationResponse,
};
use masking::Secret;
use serde_json::json;

use common::{seed_account, seed_user, test_context, user_session};

fn add_request() -> beneficiary_api::AddBeneficiaryRequest {
    beneficiary_api::AddBeneficiaryRequest {
        name: "Meera Iyer".to_string(),
        account_number: Secret::new("000912345678".to_string()),
        ifsc_code: "KVBL0001111".to_string(),
        bank_name: "KVB".to_string(),
        transfer_type: TransferType::Imps,
        nickname: None,
    }
}

#[tokio::test]
async fn retry_exhaustion_surfaces_table_message_after_exactly_three_attempts() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", None).await;

    // Retryable code on the initial attempt and both retries.
    for _ in 0..3 {
        ctx.transport.script(
            "/beneficiary/add",
            json!({"respCode": "B91", "respMessage": "raw CBS text"}),
        );
    }

    let report = beneficiary::add_beneficiary(&ctx.state, &session, add_request())
        .await
        .expect_err("retries exhausted");

    assert_eq!(
        *report.current_context(),
        ApiErrorResponse::BankErrorMessage {
            message: "Unable to add beneficiary right now, please try again".to_string()
        }
    );
    assert_eq!(ctx.transport.calls_to("/beneficiary/add"), 3);
}

#[tokio::test]
async fn add_validate_and_pay_happy_path() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", None).await;

    ctx.transport
        .script("/beneficiary/add", json!({"respCode": "0", "respMessage": "ok"}));
    let added = match beneficiary::add_beneficiary(&ctx.state, &session, add_request())
        .await
        .expect("add succeeds")
    {
        ApplicationResponse::Json(added) => added,
        other => panic!("unexpected response {other:?}"),
    };
    assert_eq!(added.otp_status, OtpStatus::Sent);

    ctx.transport.script(
        "/beneficiary/otp/validate",
        json!({"respCode": "0", "respMessage": "ok"}),
    );
    let validated = match beneficiary::validate_otp_beneficiary(
        &ctx.state,
        &session,
        beneficiary_api::ValidateOtpBeneficiaryRequest {
            beneficiary_id: added.beneficiary_id.clone(),
            otp: Secret::new("123456".to_string()),
        },
    )
    .await
    .expect("otp validation succeeds")
    {
        ApplicationResponse::Json(validated) => validated,
        other => panic!("unexpected response {other:?}"),
    };
    assert_eq!(validated.otp_status, OtpStatus::Validated);

    ctx.transport.script(
        "/beneficiary/payment",
        json!({
            "respCode": "0",
            "respMessage": "ok",
            "utrRefNumber": "UTR0001112223"
        }),
    );
    let paid = match beneficiary::beneficiary_payment(
        &ctx.state,
        &session,
        beneficiary_api::BeneficiaryPaymentRequest {
            beneficiary_id: added.beneficiary_id.clone(),
            amount: 50_000,
            remarks: "rent".to_string(),
        },
    )
    .await
    .expect("payment succeeds")
    {
        ApplicationResponse::Json(paid) => paid,
        other => panic!("unexpected response {other:?}"),
    };

    assert_eq!(paid.cbs_status, CbsTransactionStatus::Pending);
    assert_eq!(paid.utr_ref_number.as_deref(), Some("UTR0001112223"));

    let transaction = kvb_router::db::TransactionInterface::find_transaction_by_transaction_id(
        ctx.db.as_ref(),
        &paid.transaction_id,
    )
    .await
    .expect("transaction recorded");
    assert_eq!(transaction.amount, 50_000);
    assert_eq!(
        transaction.beneficiary_id.as_deref(),
        Some(added.beneficiary_id.as_str())
    );
}

#[tokio::test]
async fn duplicate_registration_is_refused_before_the_bank_call() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", None).await;

    ctx.transport
        .script("/beneficiary/add", json!({"respCode": "0", "respMessage": "ok"}));
    beneficiary::add_beneficiary(&ctx.state, &session, add_request())
        .await
        .expect("first add succeeds");

    let report = beneficiary::add_beneficiary(&ctx.state, &session, add_request())
        .await
        .expect_err("second add must be refused");
    assert_eq!(*report.current_context(), ApiErrorResponse::DuplicateBeneficiary);
    assert_eq!(ctx.transport.calls_to("/beneficiary/add"), 1);
}

#[tokio::test]
async fn fatal_code_is_not_retried() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", None).await;

    ctx.transport.script(
        "/beneficiary/add",
        json!({"respCode": "B02", "respMessage": "raw text"}),
    );

    let report = beneficiary::add_beneficiary(&ctx.state, &session, add_request())
        .await
        .expect_err("fatal code");
    assert_eq!(
        *report.current_context(),
        ApiErrorResponse::BankErrorMessage {
            message: "Beneficiary limit reached for the day".to_string()
        }
    );
    assert_eq!(ctx.transport.calls_to("/beneficiary/add"), 1);
}

#[tokio::test]
async fn paying_own_account_is_rejected_without_bank_call() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", None).await;

    let mut request = add_request();
    // The seeded account's own number.
    request.account_number = Secret::new("1234567890123456".to_string());

    let report = beneficiary::add_beneficiary(&ctx.state, &session, request)
        .await
        .expect_err("self transfer must be rejected");
    assert_eq!(*report.current_context(), ApiErrorResponse::SelfTransferNotAllowed);
    assert!(ctx.transport.calls().is_empty());
}
