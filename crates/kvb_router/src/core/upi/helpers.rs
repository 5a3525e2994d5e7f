//! Helpers shared by the provisioning orchestrators.

use api_models::enums::DeviceOs;
use error_stack::IntoReport;
use router_env::logger;

use crate::{
    connector::kvb::transformers::CryptoInfo,
    consts,
    core::{
        bank_codes::OperationFamily,
        errors::{ApiErrorResponse, ConnectorError, RouterResult},
        retry::classify_bank_failure,
        session::SessionField,
    },
    db::DeviceInterface,
    routes::AppState,
};

/// Mint a client id in the partner's per-platform format: 16-digit numeric
/// on Android, 16-char hex on iOS.
pub fn generate_client_id(os: DeviceOs) -> String {
    match os {
        DeviceOs::Android => common_utils::generate_digits(consts::CLIENT_ID_LENGTH),
        DeviceOs::Ios => common_utils::generate_hex(consts::CLIENT_ID_LENGTH),
    }
}

/// Delete the user's client session outright: device row and cached session
/// both go. A burned client id must never be reused; the next attempt
/// starts from SIM binding.
pub async fn burn_client_session(state: &AppState, user_id: &str) {
    logger::warn!("burning client session after irrecoverable step failure");
    if let Err(error) = state.store.delete_device_by_user_id(user_id).await {
        logger::error!(?error, "failed to delete device row while burning session");
    }
    if let Err(error) = state.session_store.delete(user_id).await {
        logger::error!(?error, "failed to drop cached session while burning session");
    }
}

/// Soft failure for already provisioned users: flip the device inactive and
/// keep the client session; the user re-enters through remapping.
pub async fn deactivate_device(state: &AppState, user_id: &str) {
    logger::warn!("marking device inactive after remap failure");
    if let Err(error) = state
        .store
        .update_device_by_user_id(
            user_id,
            crate::types::storage::DeviceUpdate::ActiveFlag { is_active: false },
        )
        .await
    {
        logger::error!(?error, "failed to deactivate device");
    }
}

/// Burn the client session, then classify the failed step's error. Used on
/// every first-time-binding step failure.
pub async fn burn_and_classify<T>(
    state: &AppState,
    user_id: &str,
    report: error_stack::Report<ConnectorError>,
) -> RouterResult<T> {
    burn_client_session(state, user_id).await;
    classify_bank_failure(OperationFamily::Upi, Err(report))
}

/// Deactivate the device, then classify the failed step's error. Used on
/// remap-path failures for already provisioned users.
pub async fn deactivate_and_classify<T>(
    state: &AppState,
    user_id: &str,
    report: error_stack::Report<ConnectorError>,
) -> RouterResult<T> {
    deactivate_device(state, user_id).await;
    classify_bank_failure(OperationFamily::Upi, Err(report))
}

/// Wait for the out-of-band binding SMS to land at the bank before the
/// provisioning chain proceeds. A plain bounded sleep: the protocol offers
/// no signal to wait on. Cancel-safe; dropping the caller's future aborts
/// the wait.
pub async fn wait_for_binding_sms(state: &AppState) {
    let wait = std::time::Duration::from_secs(state.conf.upi.long_sms_wait_time_secs);
    if wait.is_zero() {
        return;
    }
    logger::info!(wait_secs = wait.as_secs(), "waiting for binding sms window");
    tokio::time::sleep(wait).await;
}

/// Build the session credential fresh from the resolved session fields.
/// Never cached: server and login-ref ids rotate on remapping.
pub async fn fresh_crypto_info(
    state: &AppState,
    user_id: &str,
    device_id_plain: &str,
    os: DeviceOs,
    os_version: &str,
) -> RouterResult<CryptoInfo> {
    let client_id = resolve_required(state, user_id, SessionField::ClientId).await?;
    let server_id = resolve_required(state, user_id, SessionField::ServerId).await?;
    let login_ref_id = resolve_required(state, user_id, SessionField::LoginRefId).await?;

    Ok(CryptoInfo {
        device_id: device_id_plain.to_string(),
        client_id,
        server_id,
        os_version: os_version.to_string(),
        os: os.to_string(),
        login_ref_id,
    })
}

async fn resolve_required(
    state: &AppState,
    user_id: &str,
    field: SessionField,
) -> RouterResult<String> {
    state
        .session_store
        .resolve(state.store.as_ref(), user_id, field)
        .await?
        .ok_or(ApiErrorResponse::InvalidRequestData {
            message: "device session has expired, please redo sim binding".to_string(),
        })
        .into_report()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn android_client_id_is_numeric() {
        let id = generate_client_id(DeviceOs::Android);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn ios_client_id_is_hex() {
        let id = generate_client_id(DeviceOs::Ios);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
