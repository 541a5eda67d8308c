//! Bounded retry for collaborator calls.
//!
//! Retries transport and parse failures, lowering the sampling temperature on
//! every attempt. A rejected request (bad credentials, malformed payload) is
//! returned immediately.

use parley_core::config::RetryConfig;
use parley_core::error::GenerationError;
use std::future::Future;
use std::time::Duration;

/// Temperature used for the zero-based `attempt`.
pub fn attempt_temperature(config: &RetryConfig, base: f32, attempt: u32) -> f32 {
    let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
    (base * config.temperature_decay.powi(exp)).max(0.0)
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is spent. The closure receives the temperature to use.
///
/// Exhaustion yields [`GenerationError::Exhausted`] wrapping the last failure.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    label: &str,
    base_temperature: f32,
    mut operation: F,
) -> Result<T, GenerationError>
where
    F: FnMut(f32) -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = Duration::from_millis(config.initial_delay_ms);
    let max_delay = Duration::from_millis(config.max_delay_ms);
    let mut last_error = None;

    for attempt in 0..max_attempts {
        let temperature = attempt_temperature(config, base_temperature, attempt);
        match operation(temperature).await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!("{} succeeded on attempt {}", label, attempt + 1);
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => {
                tracing::warn!("{} failed without retry: {}", label, e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    "{} failed on attempt {}/{} (temperature {:.2}): {}",
                    label,
                    attempt + 1,
                    max_attempts,
                    temperature,
                    e
                );
                last_error = Some(e);
            }
        }

        if attempt + 1 < max_attempts && !delay.is_zero() {
            let sleep_time = delay + Duration::from_millis(rand_jitter());
            tracing::debug!(
                "{} retrying in {:.1}s",
                label,
                sleep_time.as_secs_f64()
            );
            tokio::time::sleep(sleep_time).await;
            delay = Duration::from_secs_f64(
                (delay.as_secs_f64() * config.backoff_factor).min(max_delay.as_secs_f64()),
            );
        }
    }

    Err(GenerationError::Exhausted {
        attempts: max_attempts,
        last: Box::new(
            last_error.unwrap_or_else(|| GenerationError::Transport("no attempt made".into())),
        ),
    })
}

/// Simple jitter: random 0-250ms using timestamp as poor-man's random.
fn rand_jitter() -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    u64::from(nanos % 250)
}
