//! End-to-end provisioning scenarios against the scripted bank transport.

mod common;

use api_models::{enums::DeviceOs, upi as upi_api};
use kvb_router::{
    core::{errors::ApiErrorResponse, upi},
    db::{AccountInterface, DeviceInterface, UserInterface},
    services::ApplicationResponse,
};
use masking::PeekInterface;
use serde_json::json;

use common::{encrypt_field, seed_account, seed_user, test_context, user_session};

fn sim_binding_request() -> upi_api::SimBindingRequest {
    upi_api::SimBindingRequest {
        device_id: encrypt_field("device-imei-1"),
        device_ip: "10.1.2.3".to_string(),
        mobile_number: masking::Secret::new("9876543210".to_string()),
        os: DeviceOs::Android,
        os_version: "14".to_string(),
        binding_type: None,
    }
}

fn create_upi_request() -> upi_api::CreateUpiRequest {
    upi_api::CreateUpiRequest {
        device_id: encrypt_field("device-imei-1"),
        os: DeviceOs::Android,
        os_version: "14".to_string(),
    }
}

fn script_successful_binding(transport: &common::MockBankTransport) {
    transport.script(
        "/mobile/mapping",
        json!({"respCode": "0", "respMessage": "ok", "transId": "123456789012"}),
    );
    transport.script("/mobile/verify", json!({"respCode": "0", "respMessage": "ok"}));
}

fn script_successful_provisioning(transport: &common::MockBankTransport, payer_addr: &str) {
    transport.script(
        "/mobile/mapping",
        json!({"respCode": "0", "respMessage": "ok", "serverId": "srv-77"}),
    );
    transport.script(
        "/upi/lcvalidator",
        json!({"respCode": "0", "respMessage": "ok", "loginRefId": "lrf-42"}),
    );
    transport.script(
        "/customer/demographics",
        json!({"respCode": "0", "respMessage": "ok", "customerName": "Priya Raman"}),
    );
    transport.script("/upi/profile", json!({"respCode": "0", "respMessage": "ok"}));
    transport.script("/upi/listkeys", json!({"respCode": "0", "respMessage": "ok", "keys": {}}));
    transport.script(
        "/upi/accounts/list",
        json!({
            "respCode": "0",
            "respMessage": "ok",
            "accounts": [
                {"accountNumber": "1234567890123456", "ifsc": "KVBL0000001", "accountType": "SB"}
            ]
        }),
    );
    transport.script("/upi/psp/availability", json!({"respCode": "0", "respMessage": "ok"}));
    transport.script(
        "/upi/accounts/add",
        json!({"respCode": "0", "respMessage": "ok", "Payeraddr": payer_addr}),
    );
}

#[tokio::test]
async fn first_time_binding_and_provisioning_happy_path() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", None).await;

    script_successful_binding(&ctx.transport);
    let binding = upi::sim_binding_and_sms_verification(&ctx.state, &session, sim_binding_request())
        .await
        .expect("sim binding succeeds");
    let binding = match binding {
        ApplicationResponse::Json(binding) => binding,
        other => panic!("unexpected response {other:?}"),
    };
    assert_eq!(binding.transaction_id, "123456789012");
    assert_eq!(binding.client_id.len(), 16);
    assert!(binding.client_id.chars().all(|c| c.is_ascii_digit()));

    script_successful_provisioning(&ctx.transport, "9876543210@kvb");
    let provisioned = upi::create_upi_id(&ctx.state, &session, create_upi_request())
        .await
        .expect("provisioning succeeds");
    let provisioned = match provisioned {
        ApplicationResponse::Json(provisioned) => provisioned,
        other => panic!("unexpected response {other:?}"),
    };

    // The address is exactly the bank's Payeraddr echo.
    assert_eq!(provisioned.upi_id.peek(), "9876543210@kvb");

    let account = ctx
        .db
        .find_account_by_user_id("user-1")
        .await
        .expect("account exists");
    assert_eq!(account.upi_id.as_deref(), Some("9876543210@kvb"));

    let user = ctx.db.find_user_by_id("user-1").await.expect("user exists");
    assert_eq!(
        user.onboarding_stage,
        api_models::enums::OnboardingStage::UpiGeneration
    );
}

#[tokio::test]
async fn sms_not_received_burns_the_client_session() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", None).await;

    script_successful_binding(&ctx.transport);
    upi::sim_binding_and_sms_verification(&ctx.state, &session, sim_binding_request())
        .await
        .expect("sim binding succeeds");
    assert!(ctx.db.find_device_by_user_id("user-1").await.is_ok());

    // Mobile mapping type 1 rejects the binding.
    ctx.transport
        .script("/mobile/mapping", json!({"respCode": "1", "respMessage": "rejected"}));

    let report = upi::create_upi_id(&ctx.state, &session, create_upi_request())
        .await
        .expect_err("provisioning must fail");
    assert_eq!(*report.current_context(), ApiErrorResponse::SmsNotReceived);
    assert_eq!(report.current_context().to_string(), "sms not received");

    // The client id is burned: the device row is gone.
    assert!(ctx.db.find_device_by_user_id("user-1").await.is_err());
}

#[tokio::test]
async fn existing_upi_id_refuses_without_any_bank_call() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", Some("existing@kvb")).await;

    for _ in 0..2 {
        let report = upi::create_upi_id(&ctx.state, &session, create_upi_request())
            .await
            .expect_err("must refuse");
        assert_eq!(*report.current_context(), ApiErrorResponse::UpiIdAlreadyExists);
    }

    assert!(ctx.transport.calls().is_empty(), "no network call may happen");
}

#[tokio::test]
async fn step_failure_mid_chain_burns_and_surfaces_classified_message() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", None).await;

    script_successful_binding(&ctx.transport);
    upi::sim_binding_and_sms_verification(&ctx.state, &session, sim_binding_request())
        .await
        .expect("sim binding succeeds");

    // Login succeeds but account listing fails with a classified code.
    ctx.transport.script(
        "/mobile/mapping",
        json!({"respCode": "0", "respMessage": "ok", "serverId": "srv-77"}),
    );
    ctx.transport.script(
        "/upi/lcvalidator",
        json!({"respCode": "0", "respMessage": "ok", "loginRefId": "lrf-42"}),
    );
    ctx.transport.script(
        "/customer/demographics",
        json!({"respCode": "0", "respMessage": "ok", "customerName": "Priya Raman"}),
    );
    ctx.transport
        .script("/upi/profile", json!({"respCode": "0", "respMessage": "ok"}));
    ctx.transport
        .script("/upi/listkeys", json!({"respCode": "0", "respMessage": "ok"}));
    ctx.transport.script(
        "/upi/accounts/list",
        json!({"respCode": "XH", "respMessage": "raw partner text"}),
    );

    let report = upi::create_upi_id(&ctx.state, &session, create_upi_request())
        .await
        .expect_err("provisioning must fail");
    assert_eq!(
        *report.current_context(),
        ApiErrorResponse::BankErrorMessage {
            message: "Account does not belong to this mobile number".to_string()
        }
    );
    assert!(ctx.db.find_device_by_user_id("user-1").await.is_err());
}

#[tokio::test]
async fn remap_existing_user_rotates_session_and_reactivates() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", Some("existing@kvb")).await;

    ctx.db
        .insert_device(kvb_router::types::storage::DeviceNew {
            user_id: "user-1".to_string(),
            device_id_encrypted: encrypt_field("device-imei-1"),
            mobile_mapping_txn_id: Some("123456789012".to_string()),
            client_id: Some("1111222233334444".to_string()),
        })
        .await
        .expect("seed device");

    ctx.transport
        .script("/mobile/mapping", json!({"respCode": "4", "respMessage": "remap"}));
    ctx.transport.script(
        "/mobile/remap",
        json!({"respCode": "0", "respMessage": "ok", "serverId": "srv-9", "loginRefId": "lrf-9"}),
    );
    ctx.transport
        .script("/upi/listkeys", json!({"respCode": "0", "respMessage": "ok"}));

    let response = upi::remap_existing_upi_id(
        &ctx.state,
        &session,
        upi_api::RemapUpiRequest {
            device_id: encrypt_field("device-imei-1"),
            os: DeviceOs::Android,
            os_version: "14".to_string(),
        },
    )
    .await
    .expect("remap succeeds");
    assert!(matches!(
        response,
        ApplicationResponse::Json(upi_api::RemapUpiResponse { remapped: true })
    ));

    let device = ctx.db.find_device_by_user_id("user-1").await.expect("device");
    assert!(device.is_active);
    assert_eq!(device.server_id.as_deref(), Some("srv-9"));
    assert_eq!(device.login_ref_id.as_deref(), Some("lrf-9"));
}

#[tokio::test]
async fn remap_failure_deactivates_but_keeps_the_device() {
    let ctx = test_context();
    let session = user_session("user-1");
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", Some("existing@kvb")).await;

    ctx.db
        .insert_device(kvb_router::types::storage::DeviceNew {
            user_id: "user-1".to_string(),
            device_id_encrypted: encrypt_field("device-imei-1"),
            mobile_mapping_txn_id: Some("123456789012".to_string()),
            client_id: Some("1111222233334444".to_string()),
        })
        .await
        .expect("seed device");

    ctx.transport
        .script("/mobile/mapping", json!({"respCode": "U17", "respMessage": "binding broken"}));

    let report = upi::remap_existing_upi_id(
        &ctx.state,
        &session,
        upi_api::RemapUpiRequest {
            device_id: encrypt_field("device-imei-1"),
            os: DeviceOs::Android,
            os_version: "14".to_string(),
        },
    )
    .await
    .expect_err("remap must fail");
    assert_eq!(
        *report.current_context(),
        ApiErrorResponse::BankErrorMessage {
            message: "Device binding could not be verified".to_string()
        }
    );

    // Softer failure mode than first-time binding: row kept, inactive.
    let device = ctx.db.find_device_by_user_id("user-1").await.expect("device kept");
    assert!(!device.is_active);
}

#[tokio::test]
async fn concurrent_provisioning_is_single_flight() {
    let ctx = test_context();
    seed_user(&ctx.db, "user-1", Some("cust-1")).await;
    seed_account(&ctx.db, "user-1", "cust-1", None).await;

    // Hold the user lock as a concurrent request would.
    let held = kvb_router::core::locking::lock_user(&ctx.state, "user-1", "create_upi_id")
        .await
        .expect("lock");
    assert!(matches!(held, kvb_router::core::locking::LockStatus::Acquired(_)));

    let session = user_session("user-1");
    let report = upi::create_upi_id(&ctx.state, &session, create_upi_request())
        .await
        .expect_err("second request must be refused");
    assert_eq!(*report.current_context(), ApiErrorResponse::OperationInProgress);
}
