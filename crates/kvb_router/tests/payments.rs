//! VPA validation and payment over a provisioned binding.

mod common;

use api_models::{enums::DeviceOs, upi as upi_api};
use kvb_router::{
    core::{errors::ApiErrorResponse, upi},
    db::DeviceInterface,
    services::ApplicationResponse,
    types::storage,
};
use masking::Secret;
use serde_json::json;

use common::{decrypt_payload, encrypt_field, seed_account, seed_user, test_context, user_session};

async fn seed_provisioned_binding(ctx: &common::TestContext) {
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", Some("9876543210@kvb")).await;
    ctx.db
        .insert_device(storage::DeviceNew {
            user_id: "user-1".to_string(),
            device_id_encrypted: encrypt_field("device-imei-1"),
            mobile_mapping_txn_id: Some("123456789012".to_string()),
            client_id: Some("1111222233334444".to_string()),
        })
        .await
        .expect("seed device");
    ctx.db
        .update_device_by_user_id(
            "user-1",
            storage::DeviceUpdate::ClientSession {
                server_id: Some("srv-1".to_string()),
                login_ref_id: Some("lrf-1".to_string()),
            },
        )
        .await
        .expect("seed session ids");
}

fn payment_request(payee: &str) -> upi_api::VpaPaymentRequest {
    upi_api::VpaPaymentRequest {
        device_id: encrypt_field("device-imei-1"),
        os: DeviceOs::Android,
        os_version: "14".to_string(),
        payee_vpa: Secret::new(payee.to_string()),
        amount: 25_000,
        remarks: "groceries".to_string(),
        credential_block: Secret::new("enc-cred-block".to_string()),
    }
}

#[tokio::test]
async fn vpa_payment_happy_path_returns_encrypted_payload() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_provisioned_binding(&ctx).await;

    ctx.transport.script(
        "/upi/pay",
        json!({
            "respCode": "0",
            "respMessage": "ok",
            "transactionId": "999888777666",
            "utrRefNumber": "UTR0004445556"
        }),
    );

    let response = upi::process_payment_with_vpa(&ctx.state, &session, payment_request("shop@upi"))
        .await
        .expect("payment succeeds");
    let envelope = match response {
        ApplicationResponse::Json(envelope) => envelope,
        other => panic!("unexpected response {other:?}"),
    };

    let payload: upi_api::UpiPaymentResponse = decrypt_payload(&envelope);
    assert_eq!(payload.transaction_id, "999888777666");
    assert_eq!(payload.utr_ref_number.as_deref(), Some("UTR0004445556"));

    let transaction = kvb_router::db::TransactionInterface::find_transaction_by_transaction_id(
        ctx.db.as_ref(),
        "999888777666",
    )
    .await
    .expect("transaction recorded");
    assert_eq!(transaction.amount, 25_000);
}

#[tokio::test]
async fn technical_error_resend_reissues_the_transaction_id() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_provisioned_binding(&ctx).await;

    ctx.transport
        .script("/upi/pay", json!({"respCode": "TE1", "respMessage": "resend"}));
    ctx.transport.script(
        "/upi/pay",
        json!({"respCode": "0", "respMessage": "ok", "utrRefNumber": "UTR0001234567"}),
    );

    let response = upi::process_payment_with_vpa(&ctx.state, &session, payment_request("shop@upi"))
        .await
        .expect("second attempt succeeds");
    let envelope = match response {
        ApplicationResponse::Json(envelope) => envelope,
        other => panic!("unexpected response {other:?}"),
    };

    assert_eq!(ctx.transport.calls_to("/upi/pay"), 2);
    let payload: upi_api::UpiPaymentResponse = decrypt_payload(&envelope);
    assert_eq!(payload.utr_ref_number.as_deref(), Some("UTR0001234567"));
}

#[tokio::test]
async fn self_transfer_is_refused_before_any_bank_call() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_provisioned_binding(&ctx).await;

    let report =
        upi::process_payment_with_vpa(&ctx.state, &session, payment_request("9876543210@kvb"))
            .await
            .expect_err("self transfer must fail");
    assert_eq!(*report.current_context(), ApiErrorResponse::SelfTransferNotAllowed);
    assert!(ctx.transport.calls().is_empty());
}

#[tokio::test]
async fn fatal_payment_code_maps_to_user_message() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_provisioned_binding(&ctx).await;

    ctx.transport
        .script("/upi/pay", json!({"respCode": "Z9", "respMessage": "raw text"}));

    let report = upi::process_payment_with_vpa(&ctx.state, &session, payment_request("shop@upi"))
        .await
        .expect_err("declined");
    assert_eq!(
        *report.current_context(),
        ApiErrorResponse::BankErrorMessage {
            message: "Insufficient funds in the account".to_string()
        }
    );
    assert_eq!(ctx.transport.calls_to("/upi/pay"), 1);
}

#[tokio::test]
async fn inactive_device_requires_remap_first() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_provisioned_binding(&ctx).await;
    ctx.db
        .update_device_by_user_id(
            "user-1",
            storage::DeviceUpdate::ActiveFlag { is_active: false },
        )
        .await
        .expect("deactivate");

    let report = upi::validate_vpa(
        &ctx.state,
        &session,
        upi_api::VpaValidationRequest {
            device_id: encrypt_field("device-imei-1"),
            os: DeviceOs::Android,
            os_version: "14".to_string(),
            payee_vpa: Secret::new("shop@upi".to_string()),
        },
    )
    .await
    .expect_err("inactive binding");
    assert!(matches!(
        report.current_context(),
        ApiErrorResponse::InvalidRequestData { .. }
    ));
    assert!(ctx.transport.calls().is_empty());
}
