//! Bounded fixed-interval retries for services that may still be starting.

use std::fmt::Display;
use std::future::Future;

use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::error::CheckError;
use crate::service::{Language, LanguageService};

/// Run `op` until it succeeds or `policy.max_attempts` is used up.
///
/// Sleeps `policy.interval` between attempts and returns the last error on
/// exhaustion. Dropping the returned future cancels the loop.
pub async fn retry_fixed<T, E, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                debug!(what, attempt, "succeeded");
                return Ok(value);
            }
            Err(e) if attempt >= attempts => {
                warn!(what, attempt, error = %e, "giving up");
                return Err(e);
            }
            Err(e) => {
                debug!(what, attempt, error = %e, "attempt failed, retrying");
                tokio::time::sleep(policy.interval).await;
                attempt += 1;
            }
        }
    }
}

/// Poll the language list until the service answers.
pub async fn load_languages<S>(service: &S, policy: RetryPolicy) -> Result<Vec<Language>, CheckError>
where
    S: LanguageService,
{
    retry_fixed(policy, "language list", |_| service.languages()).await
}
