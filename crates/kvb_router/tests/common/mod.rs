//! Shared test harness: scripted bank transport, in-memory state, fixtures.

#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use base64::Engine;
use common_utils::{
    consts::BASE64_ENGINE,
    crypto::{EncodeMessage, GcmAes256},
    errors::CustomResult,
    request::Request,
};
use error_stack::{IntoReport, ResultExt};
use kvb_router::{
    configs::Settings,
    core::{errors::ConnectorError, session::InMemorySessionCache},
    db::MockDb,
    routes::{AppState, UserSession},
    services::{BankTransport, LogAuditSink, Response},
    types::storage,
};
use masking::{Secret, StrongSecret};

pub const TEST_SESSION_KEY: [u8; 32] = [7_u8; 32];

/// Transport that replays scripted responses per path and records every
/// outgoing call.
#[derive(Debug, Default)]
pub struct MockBankTransport {
    scripted: Mutex<HashMap<String, VecDeque<serde_json::Value>>>,
    calls: Mutex<Vec<String>>,
}

impl MockBankTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response for the given path; responses are consumed in FIFO
    /// order per path.
    pub fn script(&self, path: &str, response: serde_json::Value) {
        self.scripted
            .lock()
            .expect("scripted lock")
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    /// Paths of every call made so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Number of calls made to one path.
    pub fn calls_to(&self, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|called| called.as_str() == path)
            .count()
    }
}

#[async_trait]
impl BankTransport for MockBankTransport {
    async fn send(&self, request: Request) -> CustomResult<Response, ConnectorError> {
        let mut scripted = self.scripted.lock().expect("scripted lock");
        let path = scripted
            .keys()
            .find(|path| request.url.ends_with(path.as_str()))
            .cloned();

        let Some(path) = path else {
            return Err(ConnectorError::TransportFailure)
                .into_report()
                .attach_printable(format!("no scripted response for {}", request.url));
        };

        self.calls.lock().expect("calls lock").push(path.clone());

        let response = scripted
            .get_mut(&path)
            .and_then(VecDeque::pop_front)
            .ok_or(ConnectorError::TransportFailure)
            .into_report()
            .attach_printable(format!("scripted responses for {path} exhausted"))?;

        Ok(Response {
            response: bytes::Bytes::from(serde_json::to_vec(&response).expect("serialize")),
            status_code: 200,
        })
    }
}

/// Settings tuned for tests: no SMS wait, local fake bank URL.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.bank.base_url = "http://bank.test".to_string();
    settings.upi.long_sms_wait_time_secs = 0;
    settings.upi.session_ttl_secs = 600;
    settings
}

pub struct TestContext {
    pub state: AppState,
    pub db: Arc<MockDb>,
    pub transport: Arc<MockBankTransport>,
}

/// Fresh state over MockDb, the in-memory session cache and a scripted
/// transport.
pub fn test_context() -> TestContext {
    let db = Arc::new(MockDb::new());
    let transport = MockBankTransport::new();
    let state = AppState::new(
        test_settings(),
        db.clone(),
        Arc::new(InMemorySessionCache::default()),
        transport.clone(),
        Arc::new(LogAuditSink),
    );
    TestContext {
        state,
        db,
        transport,
    }
}

pub fn user_session(user_id: &str) -> UserSession {
    UserSession {
        user_id: user_id.to_string(),
        session_key: StrongSecret::new(TEST_SESSION_KEY.to_vec()),
    }
}

/// Encrypt a plaintext field the way the app does, for request fixtures.
pub fn encrypt_field(plaintext: &str) -> Secret<String> {
    let ciphertext = GcmAes256
        .encode_message(&TEST_SESSION_KEY, plaintext.as_bytes())
        .expect("encrypt fixture");
    Secret::new(BASE64_ENGINE.encode(ciphertext))
}

/// Decrypt an encrypted response envelope, as the app would.
pub fn decrypt_payload<T: serde::de::DeserializeOwned>(
    response: &api_models::upi::EncryptedPayloadResponse,
) -> T {
    use common_utils::crypto::DecodeMessage;

    let ciphertext = BASE64_ENGINE
        .decode(&response.payload)
        .expect("payload is base64");
    let plaintext = GcmAes256
        .decode_message(&TEST_SESSION_KEY, ciphertext.into())
        .expect("payload decrypts");
    serde_json::from_slice(&plaintext).expect("payload parses")
}

pub async fn seed_user(db: &MockDb, user_id: &str, customer_id: Option<&str>) -> storage::User {
    kvb_router::db::UserInterface::insert_user(
        db,
        storage::UserNew {
            user_id: user_id.to_string(),
            customer_id: customer_id.map(str::to_string),
            mobile_number: Secret::new("9876543210".to_string()),
        },
    )
    .await
    .expect("seed user")
}

pub async fn seed_account(
    db: &MockDb,
    user_id: &str,
    customer_id: &str,
    upi_id: Option<&str>,
) -> storage::Account {
    let account = kvb_router::db::AccountInterface::insert_account(
        db,
        storage::AccountNew {
            user_id: user_id.to_string(),
            customer_id: customer_id.to_string(),
            account_number: Secret::new("1234567890123456".to_string()),
            ifsc_code: Some("KVBL0000001".to_string()),
        },
    )
    .await
    .expect("seed account");

    match upi_id {
        Some(upi_id) => kvb_router::db::AccountInterface::update_account_by_user_id(
            db,
            user_id,
            storage::AccountUpdate::UpiId {
                upi_id: upi_id.to_string(),
            },
        )
        .await
        .expect("seed upi id"),
        None => account,
    }
}
