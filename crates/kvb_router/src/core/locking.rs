//! Per-user advisory locking.
//!
//! The UPI binding chain and other check-then-insert sequences must not run
//! twice concurrently for the same user. The lock is a SETNX key with
//! expiry in the session cache; the expiry bounds how long a crashed request
//! can keep a user locked out.

use std::time::Duration;

use error_stack::{IntoReport, ResultExt};
use router_env::{instrument, logger, tracing};

use super::{
    errors::{ApiErrorResponse, RouterResult},
    session::SessionCache,
};
use crate::{consts, routes::AppState};

/// Outcome of a lock acquisition attempt.
#[derive(Clone, Debug)]
pub enum LockStatus {
    /// The lock is held by this request.
    Acquired(String),
    /// Another request holds the lock.
    AlreadyLocked(String),
}

impl LockStatus {
    /// Error out unless the lock was acquired.
    pub fn is_acquired(self) -> RouterResult<Self> {
        match self {
            acquired @ Self::Acquired(_) => Ok(acquired),
            Self::AlreadyLocked(key) => Err(ApiErrorResponse::OperationInProgress)
                .into_report()
                .attach_printable(format!("lock {key} is held by another request")),
        }
    }
}

fn lock_key(user_id: &str) -> String {
    format!("{}{user_id}", consts::USER_LOCK_KEY_PREFIX)
}

/// Try to take the per-user lock for the given API.
#[instrument(skip(state))]
pub async fn lock_user(
    state: &AppState,
    user_id: &str,
    api_identifier: &str,
) -> RouterResult<LockStatus> {
    let key = lock_key(user_id);
    let ttl = Duration::from_secs(state.conf.upi.lock_ttl_secs);

    let acquired = state
        .session_store
        .cache()
        .set_if_not_exists(&key, ttl)
        .await
        .change_context(ApiErrorResponse::InternalServerError)?;

    if acquired {
        logger::debug!(%api_identifier, "user lock acquired");
        Ok(LockStatus::Acquired(key))
    } else {
        logger::info!(%api_identifier, "user lock already held");
        Ok(LockStatus::AlreadyLocked(key))
    }
}

/// Release a previously acquired lock. Releasing a lock that was never
/// acquired is a no-op.
#[instrument(skip(state))]
pub async fn release_lock(state: &AppState, lock: LockStatus) -> RouterResult<()> {
    match lock {
        LockStatus::Acquired(key) => {
            if let Err(error) = state.session_store.cache().delete(&key).await {
                // The expiry will reap it; the user is locked out until then.
                logger::error!(?error, %key, "failed to release user lock");
            }
            Ok(())
        }
        LockStatus::AlreadyLocked(_) => Ok(()),
    }
}
