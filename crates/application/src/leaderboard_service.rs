mod config;
mod finish;
mod retry;
mod sampler;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use summitdesk_core::{AppError, AppResult};
use summitdesk_domain::{LeaderboardEntry, LeaderboardSnapshot};

use crate::ports::{DataStoreClient, LeaderboardCache, NameResolver, SnapshotStore};

pub use config::LeaderboardConfig;
pub use retry::{Jitter, with_retry};

/// Read request for the leaderboard entrypoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaderboardQuery {
    /// Requested number of ranked entries; capped server-side.
    pub top_limit: Option<usize>,
    /// Requested number of candidates to sample; capped server-side.
    pub sample_size: Option<usize>,
    /// When set, sampling runs even if the cache is fresh.
    pub force_refresh: bool,
}

/// Caller-facing leaderboard result with cache metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardView {
    /// Ranked entries, truncated to the requested top limit.
    pub entries: Vec<LeaderboardEntry>,
    /// Number of candidates behind the snapshot.
    pub sample_size: usize,
    /// Instant the underlying snapshot was computed.
    pub computed_at: DateTime<Utc>,
    /// Whether the response was served from a cached snapshot.
    pub cached: bool,
    /// Snapshot age in seconds; 0 for freshly computed responses.
    pub cache_age_seconds: u64,
}

/// Rate-limited, paginated, cached leaderboard engine.
///
/// Samples player records from the datastore with paced micro-batches,
/// ranks them by summit count, resolves display names for the surviving
/// top entries and caches the finished snapshot for a TTL window. Stale
/// snapshots are preferred over surfacing refresh failures.
#[derive(Clone)]
pub struct LeaderboardService {
    datastore: Arc<dyn DataStoreClient>,
    names: Arc<dyn NameResolver>,
    cache: Arc<dyn LeaderboardCache>,
    store: Arc<dyn SnapshotStore>,
    config: LeaderboardConfig,
}

impl LeaderboardService {
    /// Creates a new leaderboard service.
    #[must_use]
    pub fn new(
        datastore: Arc<dyn DataStoreClient>,
        names: Arc<dyn NameResolver>,
        cache: Arc<dyn LeaderboardCache>,
        store: Arc<dyn SnapshotStore>,
        config: LeaderboardConfig,
    ) -> Self {
        Self {
            datastore,
            names,
            cache,
            store,
            config,
        }
    }

    /// Serves the leaderboard, from cache when possible.
    ///
    /// Read path: in-memory cache, then the durable snapshot store (cold
    /// start), then a full refresh. A forced refresh skips both caches.
    /// When a refresh fails and any prior snapshot exists the old data is
    /// served instead of the error.
    pub async fn get_leaderboard(&self, query: LeaderboardQuery) -> AppResult<LeaderboardView> {
        let top_limit = query
            .top_limit
            .unwrap_or(self.config.default_top_limit)
            .clamp(1, self.config.top_limit_cap);
        let sample_size = query
            .sample_size
            .unwrap_or(self.config.default_sample_size)
            .clamp(1, self.config.sample_size_cap);

        if !query.force_refresh {
            if let Some(snapshot) = self.cache.read().await? {
                return Ok(self.view(snapshot, top_limit, true));
            }

            match self.store.load().await {
                Ok(Some(snapshot)) if snapshot.is_fresh(Utc::now(), self.config.ttl) => {
                    info!("warming leaderboard cache from persisted snapshot");
                    self.cache.write(snapshot.clone()).await?;
                    return Ok(self.view(snapshot, top_limit, true));
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(%error, "failed to load persisted leaderboard snapshot");
                }
            }
        }

        match self.refresh(sample_size).await {
            Ok(snapshot) => Ok(self.view(snapshot, top_limit, false)),
            Err(error) => match self.cache.force_read().await? {
                Some(snapshot) => {
                    warn!(%error, "leaderboard refresh failed, serving stale snapshot");
                    Ok(self.view(snapshot, top_limit, true))
                }
                None => Err(error),
            },
        }
    }

    /// Computes and stores a fresh snapshot.
    ///
    /// The snapshot retains up to the server-side top cap so that later
    /// cached reads with a different limit can be served by truncation.
    async fn refresh(&self, sample_size: usize) -> AppResult<LeaderboardSnapshot> {
        info!(sample_size, "refreshing leaderboard");

        let outcome = self.sample(sample_size, self.config.page_size).await?;
        if outcome.throttled && outcome.candidates.is_empty() {
            return Err(AppError::RateLimited(
                "sampling aborted before any candidate was collected".to_owned(),
            ));
        }
        if outcome.throttled {
            warn!(
                candidates = outcome.candidates.len(),
                "sampling stopped early by upstream throttling, ranking partial sample"
            );
        } else {
            info!(
                candidates = outcome.candidates.len(),
                exhausted = outcome.exhausted,
                "sampling complete"
            );
        }

        let snapshot = self
            .finish(outcome.candidates, self.config.top_limit_cap)
            .await;
        self.cache.write(snapshot.clone()).await?;

        // Opportunistic durability; a failed write must not fail the refresh.
        if let Err(error) = self.store.save(&snapshot).await {
            warn!(%error, "failed to persist leaderboard snapshot");
        }

        Ok(snapshot)
    }

    fn view(
        &self,
        snapshot: LeaderboardSnapshot,
        top_limit: usize,
        cached: bool,
    ) -> LeaderboardView {
        let cache_age_seconds = if cached {
            snapshot.age_seconds(Utc::now())
        } else {
            0
        };
        let mut entries = snapshot.entries;
        entries.truncate(top_limit);

        LeaderboardView {
            entries,
            sample_size: snapshot.sample_size,
            computed_at: snapshot.computed_at,
            cached,
            cache_age_seconds,
        }
    }
}
