//! Bounded retry loop with exponential backoff.
//!
//! The delay is delegated to a [`Sleeper`] so tests can record the backoff
//! sequence instead of actually waiting.

use std::{future::Future, time::Duration};

use async_trait::async_trait;

use crate::{errors::Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Backoff {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returned when every attempt failed.
#[derive(Debug)]
pub struct Exhausted {
    pub attempts: u32,
    pub last_error: Error,
}

/// Run `op` until it succeeds or `backoff.max_attempts()` is reached.
///
/// `op` receives the 1-based attempt number.
pub async fn retry_with_backoff<T, F, Fut>(
    backoff: &Backoff,
    sleeper: &dyn Sleeper,
    label: &str,
    mut op: F,
) -> std::result::Result<T, Exhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = backoff.max_attempts();
    let mut attempt = 1u32;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_attempts => {
                let delay = backoff.delay_for(attempt - 1);
                tracing::warn!(
                    operation = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, retrying"
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(operation = label, attempts = attempt, error = %e, "giving up");
                return Err(Exhausted {
                    attempts: attempt,
                    last_error: e,
                });
            }
        }
    }
}
