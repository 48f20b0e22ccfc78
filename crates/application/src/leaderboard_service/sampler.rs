use tokio::time::sleep;
use tracing::{debug, warn};

use summitdesk_core::{AppError, AppResult};
use summitdesk_domain::{Candidate, summit_value, user_id_from_entry_key};

use super::retry::{Jitter, with_retry};
use super::LeaderboardService;

/// Result of one sampling run.
pub(super) struct SampleOutcome {
    /// Candidates in upstream discovery order.
    pub(super) candidates: Vec<Candidate>,
    /// True when the upstream dataset ran out, as opposed to the page
    /// budget being spent or throttling stopping the run.
    pub(super) exhausted: bool,
    /// True when the run was cut short by a rate limit that survived the
    /// retry budget.
    pub(super) throttled: bool,
}

impl SampleOutcome {
    fn partial(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            exhausted: false,
            throttled: true,
        }
    }
}

impl LeaderboardService {
    /// Pages through the datastore key list, fetching records in paced
    /// micro-batches until `max_candidates` are collected or the page
    /// budget `ceil(max_candidates / page_size)` is spent.
    pub(super) async fn sample(
        &self,
        max_candidates: usize,
        page_size: u32,
    ) -> AppResult<SampleOutcome> {
        let config = &self.config;
        let max_pages = max_candidates.div_ceil(page_size.max(1) as usize).max(1);

        let mut candidates: Vec<Candidate> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages_fetched = 0_usize;
        let mut exhausted = false;

        while candidates.len() < max_candidates && pages_fetched < max_pages {
            let datastore = self.datastore.as_ref();
            let cursor_ref = cursor.as_deref();
            let page = match with_retry(
                config.max_retries,
                config.retry_base_delay,
                Jitter::None,
                move || datastore.list_keys(page_size, cursor_ref),
            )
            .await
            {
                Ok(page) => page,
                Err(error) if error.is_rate_limited() => {
                    warn!(pages_fetched, "key listing throttled beyond retry budget");
                    return Ok(SampleOutcome::partial(candidates));
                }
                Err(error) => return Err(error),
            };

            if page.keys.is_empty() {
                exhausted = true;
                break;
            }

            debug!(
                page = pages_fetched + 1,
                keys = page.keys.len(),
                "sampling datastore page"
            );

            for (batch_index, batch) in page.keys.chunks(config.record_batch_size).enumerate() {
                if candidates.len() >= max_candidates {
                    break;
                }
                if batch_index > 0 {
                    sleep(config.batch_pause).await;
                }

                for key in batch {
                    match self.fetch_candidate(key).await {
                        Ok(Some(candidate)) => candidates.push(candidate),
                        Ok(None) => {}
                        Err(error) if error.is_rate_limited() => {
                            warn!(key, "record fetch throttled beyond retry budget");
                            return Ok(SampleOutcome::partial(candidates));
                        }
                        Err(error) => return Err(error),
                    }

                    sleep(config.record_pause).await;
                }
            }

            cursor = page.next_cursor;
            pages_fetched += 1;

            if cursor.is_none() {
                exhausted = true;
                break;
            }
            if candidates.len() < max_candidates && pages_fetched < max_pages {
                sleep(config.page_pause).await;
            }
        }

        Ok(SampleOutcome {
            candidates,
            exhausted,
            throttled: false,
        })
    }

    /// Fetches one record and extracts its summit count.
    ///
    /// Missing entries and non-positive counts yield `None`; both are
    /// expected in a datastore full of players who never summited.
    async fn fetch_candidate(&self, key: &str) -> AppResult<Option<Candidate>> {
        let config = &self.config;
        let datastore = self.datastore.as_ref();
        let raw = match with_retry(
            config.max_retries,
            config.retry_base_delay,
            Jitter::None,
            move || datastore.get_entry(key),
        )
        .await
        {
            Ok(raw) => raw,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(error) => return Err(error),
        };

        // Keep strictly positive values only. NaN (a record like
        // `{"summit": "NaN"}` parses to it) must not reach the board.
        let summit = summit_value(&raw);
        if summit.is_nan() || summit <= 0.0 {
            return Ok(None);
        }

        Ok(Some(Candidate {
            user_id: user_id_from_entry_key(key).to_owned(),
            summit,
            raw,
        }))
    }
}
