//! Bounded retry execution for bank calls.
//!
//! The executor knows nothing about payload shape: any per-attempt state
//! mutation (re-issuing a transaction id, attaching a resend flag) happens
//! inside the caller's closure before it builds the next request.

use std::future::Future;

use common_utils::errors::CustomResult;
use router_env::logger;

use super::{
    bank_codes::{classify, ErrorDisposition, OperationFamily},
    errors::{ApiErrorResponse, ConnectorError, RouterResult},
};
use crate::consts;

/// Retry bounds and pacing for one operation.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Attempts after the initial call.
    pub max_attempts: u8,
    /// Pause between attempts. The partner protocol historically runs with
    /// no pause; keeping it a parameter lets deployments add one without
    /// changing the call contract.
    pub delay: std::time::Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: consts::MAX_BANK_RETRY_ATTEMPTS,
            delay: std::time::Duration::ZERO,
        }
    }
}

/// What the closure gets to know about the attempt it is building.
#[derive(Clone, Debug, Default)]
pub struct RetryContext {
    /// 0 for the initial call, then 1..=max_attempts.
    pub attempt: u8,
    /// Bank code of the previous failure, when there was one.
    pub last_bank_code: Option<String>,
}

/// Run `op` up to `max_attempts` times, returning the first success or the
/// error of the last attempt.
pub async fn retry<T, E, F, Fut>(max_attempts: u8, mut op: F) -> CustomResult<T, E>
where
    F: FnMut(u8) -> Fut,
    Fut: Future<Output = CustomResult<T, E>>,
{
    let mut attempt: u8 = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                attempt = attempt.saturating_add(1);
                if attempt >= max_attempts {
                    return Err(error);
                }
            }
        }
    }
}

/// The uniform call protocol toward the bank: call, classify the failure,
/// retry when the classifier allows it, and surface the right message.
///
/// * A retryable code triggers up to `policy.max_attempts` further calls;
///   once exhausted, the retry table's message is returned, not the raw
///   upstream one.
/// * A fatal code short-circuits with its mapped message, also mid-retry.
/// * An unclassified code surfaces the raw upstream message unmodified.
/// * Transport errors are never retried here; callers that want that wrap
///   the closure themselves.
pub async fn call_with_bank_retry<T, F, Fut>(
    family: OperationFamily,
    policy: RetryPolicy,
    mut op: F,
) -> RouterResult<T>
where
    F: FnMut(RetryContext) -> Fut,
    Fut: Future<Output = CustomResult<T, ConnectorError>>,
{
    let initial = op(RetryContext::default()).await;

    let mut report = match initial {
        Ok(value) => return Ok(value),
        Err(report) => report,
    };

    let mut retry_exhausted_message = match disposition_of(family, &report) {
        StepDisposition::Fatal(message) => {
            return Err(report.change_context(ApiErrorResponse::BankErrorMessage { message }))
        }
        StepDisposition::Raw(message) => {
            return Err(report.change_context(ApiErrorResponse::BankErrorMessage { message }))
        }
        StepDisposition::Transport => {
            return Err(report.change_context(ApiErrorResponse::BankUnreachable))
        }
        StepDisposition::Retryable(message) => message,
    };

    for attempt in 1..=policy.max_attempts {
        if !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }

        let last_bank_code = report
            .current_context()
            .bank_error()
            .map(|(code, _)| code.to_string());
        logger::info!(family = %family, attempt, ?last_bank_code, "retrying bank call");

        match op(RetryContext {
            attempt,
            last_bank_code,
        })
        .await
        {
            Ok(value) => return Ok(value),
            Err(next_report) => {
                report = next_report;
                match disposition_of(family, &report) {
                    StepDisposition::Fatal(message) => {
                        return Err(
                            report.change_context(ApiErrorResponse::BankErrorMessage { message })
                        )
                    }
                    StepDisposition::Raw(message) => {
                        return Err(
                            report.change_context(ApiErrorResponse::BankErrorMessage { message })
                        )
                    }
                    StepDisposition::Transport => {
                        return Err(report.change_context(ApiErrorResponse::BankUnreachable))
                    }
                    StepDisposition::Retryable(message) => retry_exhausted_message = message,
                }
            }
        }
    }

    Err(report.change_context(ApiErrorResponse::BankErrorMessage {
        message: retry_exhausted_message,
    }))
}

/// Classify a bank call once, without retrying. For protocol chains (UPI
/// binding) whose steps are unsafe to replay blindly.
pub fn classify_bank_failure<T>(
    family: OperationFamily,
    result: CustomResult<T, ConnectorError>,
) -> RouterResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(report) => match disposition_of(family, &report) {
            StepDisposition::Fatal(message) | StepDisposition::Retryable(message) => {
                // No retry wrapper here: a retryable code in a non-retried
                // chain still surfaces its mapped message.
                Err(report.change_context(ApiErrorResponse::BankErrorMessage { message }))
            }
            StepDisposition::Raw(message) => {
                Err(report.change_context(ApiErrorResponse::BankErrorMessage { message }))
            }
            StepDisposition::Transport => {
                Err(report.change_context(ApiErrorResponse::BankUnreachable))
            }
        },
    }
}

enum StepDisposition {
    Fatal(String),
    Retryable(String),
    Raw(String),
    Transport,
}

fn disposition_of(
    family: OperationFamily,
    report: &error_stack::Report<ConnectorError>,
) -> StepDisposition {
    match report.current_context().bank_error() {
        Some((code, raw_message)) => match classify(family, code) {
            ErrorDisposition::Retryable { message } => {
                StepDisposition::Retryable(message.to_string())
            }
            ErrorDisposition::Fatal { message } => StepDisposition::Fatal(message.to_string()),
            ErrorDisposition::Unknown => StepDisposition::Raw(raw_message.to_string()),
        },
        None => StepDisposition::Transport,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    };

    use error_stack::IntoReport;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("step failed: {0}")]
    struct StepError(u8);

    #[tokio::test]
    async fn retry_stops_at_first_success() {
        let calls = Arc::new(AtomicU8::new(0));
        let counter = calls.clone();

        let result: CustomResult<u8, StepError> = retry(3, |attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if attempt == 1 {
                    Ok(attempt)
                } else {
                    Err(StepError(attempt)).into_report()
                }
            }
        })
        .await;

        assert_eq!(result.ok(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_returns_last_error_after_exhaustion() {
        let calls = Arc::new(AtomicU8::new(0));
        let counter = calls.clone();

        let result: CustomResult<(), StepError> = retry(3, |attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(StepError(attempt)).into_report()
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let report = result.expect_err("all attempts fail");
        assert_eq!(report.current_context().0, 2);
    }

    #[tokio::test]
    async fn bank_retry_exhaustion_returns_table_message_not_raw() {
        let calls = Arc::new(AtomicU8::new(0));
        let counter = calls.clone();

        let result: RouterResult<()> = call_with_bank_retry(
            OperationFamily::Beneficiary,
            RetryPolicy::default(),
            |_ctx| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ConnectorError::BankErrorResponse {
                        code: "B91".to_string(),
                        message: "raw CBS gibberish".to_string(),
                    })
                    .into_report()
                }
            },
        )
        .await;

        // 1 initial + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let report = result.expect_err("retries exhausted");
        assert_eq!(
            *report.current_context(),
            ApiErrorResponse::BankErrorMessage {
                message: "Unable to add beneficiary right now, please try again".to_string()
            }
        );
    }

    #[tokio::test]
    async fn bank_retry_fatal_code_short_circuits() {
        let calls = Arc::new(AtomicU8::new(0));
        let counter = calls.clone();

        let result: RouterResult<()> = call_with_bank_retry(
            OperationFamily::Beneficiary,
            RetryPolicy::default(),
            |_ctx| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ConnectorError::BankErrorResponse {
                        code: "B01".to_string(),
                        message: "duplicate".to_string(),
                    })
                    .into_report()
                }
            },
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let report = result.expect_err("fatal code");
        assert_eq!(
            *report.current_context(),
            ApiErrorResponse::BankErrorMessage {
                message: "Beneficiary already exists".to_string()
            }
        );
    }

    #[tokio::test]
    async fn bank_retry_unknown_code_surfaces_raw_message() {
        let result: RouterResult<()> = call_with_bank_retry(
            OperationFamily::Beneficiary,
            RetryPolicy::default(),
            |_ctx| async {
                Err(ConnectorError::BankErrorResponse {
                    code: "WHO-KNOWS".to_string(),
                    message: "backend said no".to_string(),
                })
                .into_report()
            },
        )
        .await;

        let report = result.expect_err("unknown code");
        assert_eq!(
            *report.current_context(),
            ApiErrorResponse::BankErrorMessage {
                message: "backend said no".to_string()
            }
        );
    }

    #[tokio::test]
    async fn bank_retry_passes_last_code_to_closure() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_in_closure = seen.clone();

        let _result: RouterResult<()> = call_with_bank_retry(
            OperationFamily::Payment,
            RetryPolicy::default(),
            move |ctx| {
                seen_in_closure
                    .lock()
                    .expect("poisoned")
                    .push(ctx.last_bank_code.clone());
                async {
                    Err(ConnectorError::BankErrorResponse {
                        code: "TE1".to_string(),
                        message: "resend".to_string(),
                    })
                    .into_report()
                }
            },
        )
        .await;

        let seen = seen.lock().expect("poisoned");
        assert_eq!(
            *seen,
            vec![None, Some("TE1".to_string()), Some("TE1".to_string())]
        );
    }
}
