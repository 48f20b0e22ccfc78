use std::time::Duration;

/// Tuning knobs for sampling, pacing, retries and caching.
///
/// The pacing defaults approximate the upstream request-rate ceiling with
/// fixed pauses instead of a token bucket; the result is cached, so
/// throughput is deliberately traded for simplicity.
#[derive(Debug, Clone, Copy)]
pub struct LeaderboardConfig {
    /// How long a computed snapshot stays fresh.
    pub ttl: Duration,
    /// Keys requested per datastore list page.
    pub page_size: u32,
    /// Record fetches per micro-batch.
    pub record_batch_size: usize,
    /// Pause after each record fetch inside a batch.
    pub record_pause: Duration,
    /// Pause between micro-batches within a page.
    pub batch_pause: Duration,
    /// Pause between list pages.
    pub page_pause: Duration,
    /// Retries per upstream call on a rate-limit response.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub retry_base_delay: Duration,
    /// Server-side ceiling for requested top limits.
    pub top_limit_cap: usize,
    /// Server-side ceiling for requested sample sizes.
    pub sample_size_cap: usize,
    /// Top limit applied when the request does not specify one.
    pub default_top_limit: usize,
    /// Sample size applied when the request does not specify one.
    pub default_sample_size: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            page_size: 100,
            record_batch_size: 5,
            record_pause: Duration::from_millis(200),
            batch_pause: Duration::from_millis(500),
            page_pause: Duration::from_secs(1),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            top_limit_cap: 50,
            sample_size_cap: 10_000,
            default_top_limit: 10,
            default_sample_size: 200,
        }
    }
}
