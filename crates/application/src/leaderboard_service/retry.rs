use std::future::Future;
use std::time::Duration;

use tracing::warn;

use summitdesk_core::AppResult;

/// Random delay added on top of exponential backoff.
#[derive(Debug, Clone, Copy)]
pub enum Jitter {
    /// Pure exponential backoff.
    None,
    /// Backoff plus a uniform random delay below the cap. Used where
    /// concurrent lookups would otherwise retry in lockstep.
    UpTo(Duration),
}

impl Jitter {
    fn sample(self) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::UpTo(cap) => {
                let cap_millis = u64::try_from(cap.as_millis()).unwrap_or(u64::MAX);
                if cap_millis == 0 {
                    return Duration::ZERO;
                }

                let mut bytes = [0_u8; 8];
                getrandom::fill(&mut bytes).unwrap_or(());
                Duration::from_millis(u64::from_le_bytes(bytes) % cap_millis)
            }
        }
    }
}

/// Runs `operation`, retrying rate-limited failures with exponential
/// backoff.
///
/// Attempt `n` (zero-based) waits `base_delay * 2^n` before the next try.
/// Any non-rate-limit error propagates immediately. At most
/// `max_retries + 1` calls are made; the last error propagates once the
/// budget is spent. The loop is deliberately iterative so attempt state
/// and suspension points stay explicit.
pub async fn with_retry<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    jitter: Jitter,
    mut operation: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0_u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_rate_limited() && attempt < max_retries => {
                let backoff = base_delay.saturating_mul(2_u32.saturating_pow(attempt));
                let delay = backoff.saturating_add(jitter.sample());
                warn!(
                    attempt = attempt + 1,
                    max_retries,
                    delay_millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "upstream rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
