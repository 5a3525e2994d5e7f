//! Service entrypoint: configuration, logging, state wiring and background
//! workflows. The HTTP handler layer mounts on top of the exported
//! [`kvb_router::AppState`].

use std::sync::Arc;

use error_stack::ResultExt;
use kvb_router::{
    configs::Settings,
    core::errors::ApiErrorResponse,
    db::MockDb,
    routes::AppState,
    services::{LogAuditSink, ReqwestTransport},
    workflows::ifsc_sync,
};
use router_env::logger;

#[tokio::main]
async fn main() -> common_utils::errors::CustomResult<(), ApiErrorResponse> {
    let conf = Settings::new().change_context(ApiErrorResponse::InternalServerError)?;
    if let Err(message) = conf.validate() {
        return Err(error_stack::report!(ApiErrorResponse::InvalidRequestData {
            message: message.to_string(),
        }));
    }

    let _guard = router_env::setup(&conf.log, "kvb_router", ["kvb_router", "redis_interface"]);

    let session_cache: Arc<dyn kvb_router::core::session::SessionCache> =
        match redis_interface::RedisConnectionPool::new(&conf.redis).await {
            Ok(pool) => Arc::new(pool),
            Err(error) => {
                // Degraded mode: sessions survive only within this process.
                logger::error!(?error, "redis unavailable, using in-memory session cache");
                Arc::new(kvb_router::core::session::InMemorySessionCache::default())
            }
        };

    let transport = ReqwestTransport::new(std::time::Duration::from_secs(
        conf.bank.request_timeout_secs,
    ))
    .change_context(ApiErrorResponse::InternalServerError)?;

    let state = AppState::new(
        conf,
        Arc::new(MockDb::new()),
        session_cache,
        Arc::new(transport),
        Arc::new(LogAuditSink),
    );

    let scheduler_state = state.clone();
    let scheduler = tokio::spawn(ifsc_sync::run_scheduler(scheduler_state));

    logger::info!("kvb_router started");
    if let Err(error) = tokio::signal::ctrl_c().await {
        logger::error!(?error, "failed to listen for shutdown signal");
    }
    logger::info!("shutting down");
    scheduler.abort();

    Ok(())
}
