//! Bounded retry with exponential backoff for collaborator calls.

use crate::config::RetryConfig;
use crate::error::MendError;
use std::thread;
use tracing::warn;

/// Calls `call` up to `config.max_attempts` times, sleeping with
/// exponential backoff between attempts.
///
/// `retry_if` decides whether a given failure is transient; a permanent
/// failure stops retrying immediately. Either way the final error is
/// folded into [`MendError::ExternalService`] with the attempt count and
/// the collaborator's own message preserved.
pub fn with_backoff<T, E, F, P>(
    config: &RetryConfig,
    operation: &str,
    mut call: F,
    retry_if: P,
) -> Result<T, MendError>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match call() {
            Ok(value) => return Ok(value),
            Err(err) => {
                let transient = retry_if(&err);
                if !transient || attempt >= config.max_attempts {
                    return Err(MendError::ExternalService {
                        operation: operation.to_string(),
                        attempts: attempt,
                        reason: err.to_string(),
                    });
                }
                let backoff = config.backoff_before(attempt + 1);
                warn!(
                    operation,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "transient failure, backing off"
                );
                thread::sleep(backoff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_backoff_ms: 1,
            multiplier: 2,
        }
    }

    #[test]
    fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0u32);
        let result = with_backoff(
            &fast_retry(),
            "probe",
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err("flaky")
                } else {
                    Ok(42)
                }
            },
            |_| true,
        );
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_exhaustion_reports_attempts() {
        let err = with_backoff(&fast_retry(), "probe", || Err::<(), _>("down"), |_| true)
            .unwrap_err();
        match err {
            MendError::ExternalService {
                operation,
                attempts,
                reason,
            } => {
                assert_eq!(operation, "probe");
                assert_eq!(attempts, 3);
                assert_eq!(reason, "down");
            }
            other => panic!("expected ExternalService, got {other:?}"),
        }
    }

    #[test]
    fn test_permanent_failure_stops_immediately() {
        let calls = Cell::new(0u32);
        let err = with_backoff(
            &fast_retry(),
            "probe",
            || {
                calls.set(calls.get() + 1);
                Err::<(), _>("fatal")
            },
            |_| false,
        )
        .unwrap_err();
        assert_eq!(calls.get(), 1);
        assert!(matches!(
            err,
            MendError::ExternalService { attempts: 1, .. }
        ));
    }
}
