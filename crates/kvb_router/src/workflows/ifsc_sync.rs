//! Daily IFSC directory mirror.
//!
//! A singleton background loop with a durable do-once-per-day gate: the
//! last-synced date lives in a config row, not in memory, so a restart does
//! not re-run a completed day. Running multiple replicas requires external
//! coordination; nothing here prevents duplicate runs across processes.

use common_utils::request::{Method, RequestBuilder};
use error_stack::ResultExt;
use router_env::{instrument, logger, tracing, Flow};

use crate::{
    consts,
    core::errors::{ApiErrorResponse, RouterResult, StorageErrorExt},
    db::{ConfigInterface, IfscInterface},
    routes::AppState,
    services,
    types::storage::{ConfigEntry, IfscEntry},
};

/// Run the scheduler loop until the process shuts down.
pub async fn run_scheduler(app_state: AppState) {
    if !app_state.conf.ifsc_sync.enabled {
        logger::info!("ifsc sync disabled by configuration");
        return;
    }

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(
        app_state.conf.ifsc_sync.check_interval_secs,
    ));
    loop {
        interval.tick().await;
        match sync_if_due(&app_state).await {
            Ok(Some(count)) => logger::info!(rows = count, "ifsc dataset mirrored"),
            Ok(None) => logger::debug!("ifsc dataset already mirrored today"),
            Err(error) => logger::error!(?error, "ifsc sync failed"),
        }
    }
}

/// Mirror the dataset unless it already ran today. Returns the row count
/// when a sync happened.
#[instrument(skip_all)]
pub async fn sync_if_due(app_state: &AppState) -> RouterResult<Option<usize>> {
    let today = common_utils::date_time::today_as_string();

    match app_state
        .store
        .find_config_by_key(consts::IFSC_LAST_SYNCED_KEY)
        .await
    {
        Ok(entry) if entry.value == today => return Ok(None),
        Ok(_) => {}
        Err(err) if err.current_context().is_db_not_found() => {}
        Err(err) => {
            return Err(err).to_not_found_response(ApiErrorResponse::InternalServerError);
        }
    }

    let count = sync_once(app_state).await?;

    app_state
        .store
        .upsert_config(ConfigEntry::new(consts::IFSC_LAST_SYNCED_KEY, today))
        .await
        .to_not_found_response(ApiErrorResponse::InternalServerError)?;

    Ok(Some(count))
}

/// Fetch and replace the mirrored dataset.
#[instrument(skip_all)]
pub async fn sync_once(app_state: &AppState) -> RouterResult<usize> {
    logger::info!(flow = ?Flow::IfscSync, "fetching ifsc dataset");

    let request = RequestBuilder::new()
        .method(Method::Get)
        .url(&app_state.conf.ifsc_sync.source_url)
        .build();

    let entries: Vec<IfscEntry> =
        services::execute_bank_request(app_state.transport.as_ref(), request, "Vec<IfscEntry>")
            .await
            .change_context(ApiErrorResponse::BankUnreachable)?;

    app_state
        .store
        .replace_ifsc_entries(entries)
        .await
        .to_not_found_response(ApiErrorResponse::InternalServerError)
}
