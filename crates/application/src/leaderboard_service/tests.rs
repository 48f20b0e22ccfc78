use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use summitdesk_core::{AppError, AppResult};
use summitdesk_domain::{LeaderboardEntry, LeaderboardSnapshot};

use crate::ports::{DataStoreClient, KeyListPage, LeaderboardCache, NameResolver, SnapshotStore};

use super::retry::{Jitter, with_retry};
use super::{LeaderboardConfig, LeaderboardQuery, LeaderboardService};

#[derive(Default)]
struct FakeDataStore {
    pages: Vec<KeyListPage>,
    records: HashMap<String, Value>,
    rate_limited_keys: Vec<String>,
    throttle_listing: bool,
    fail_listing: bool,
    list_calls: Mutex<u32>,
    get_calls: Mutex<Vec<String>>,
}

impl FakeDataStore {
    fn with_pages(key_pages: Vec<Vec<&str>>) -> Self {
        let last = key_pages.len().saturating_sub(1);
        let pages = key_pages
            .into_iter()
            .enumerate()
            .map(|(index, keys)| KeyListPage {
                keys: keys.into_iter().map(str::to_owned).collect(),
                next_cursor: (index < last).then(|| (index + 1).to_string()),
            })
            .collect();

        Self {
            pages,
            ..Self::default()
        }
    }

    fn with_record(mut self, key: &str, value: Value) -> Self {
        self.records.insert(key.to_owned(), value);
        self
    }
}

#[async_trait]
impl DataStoreClient for FakeDataStore {
    async fn list_keys(&self, _page_size: u32, cursor: Option<&str>) -> AppResult<KeyListPage> {
        *self.list_calls.lock().await += 1;

        if self.fail_listing {
            return Err(AppError::Upstream("listing unavailable".to_owned()));
        }
        if self.throttle_listing {
            return Err(AppError::RateLimited("listing throttled".to_owned()));
        }

        let index: usize = cursor.map(|c| c.parse().unwrap_or(0)).unwrap_or(0);
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }

    async fn get_entry(&self, key: &str) -> AppResult<Value> {
        self.get_calls.lock().await.push(key.to_owned());

        if self.rate_limited_keys.iter().any(|k| k == key) {
            return Err(AppError::RateLimited("record throttled".to_owned()));
        }

        self.records
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("entry '{key}' not found")))
    }

    async fn set_entry(&self, _key: &str, _value: &Value) -> AppResult<()> {
        Ok(())
    }

    async fn delete_entry(&self, _key: &str) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeNames {
    usernames: HashMap<String, String>,
    fail: bool,
}

#[async_trait]
impl NameResolver for FakeNames {
    async fn user_id_for_username(&self, username: &str) -> AppResult<String> {
        Err(AppError::NotFound(format!("user '{username}' not found")))
    }

    async fn usernames_for_user_ids(
        &self,
        user_ids: &[String],
    ) -> AppResult<HashMap<String, String>> {
        if self.fail {
            return Err(AppError::Upstream("directory unavailable".to_owned()));
        }

        Ok(user_ids
            .iter()
            .filter_map(|id| self.usernames.get(id).map(|name| (id.clone(), name.clone())))
            .collect())
    }
}

struct FakeCache {
    ttl: Duration,
    slot: Mutex<Option<LeaderboardSnapshot>>,
    writes: Mutex<u32>,
}

impl FakeCache {
    fn empty(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
            writes: Mutex::new(0),
        }
    }

    fn holding(ttl: Duration, snapshot: LeaderboardSnapshot) -> Self {
        Self {
            ttl,
            slot: Mutex::new(Some(snapshot)),
            writes: Mutex::new(0),
        }
    }
}

#[async_trait]
impl LeaderboardCache for FakeCache {
    async fn read(&self) -> AppResult<Option<LeaderboardSnapshot>> {
        Ok(self
            .slot
            .lock()
            .await
            .clone()
            .filter(|snapshot| snapshot.is_fresh(Utc::now(), self.ttl)))
    }

    async fn force_read(&self) -> AppResult<Option<LeaderboardSnapshot>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn write(&self, snapshot: LeaderboardSnapshot) -> AppResult<()> {
        *self.writes.lock().await += 1;
        *self.slot.lock().await = Some(snapshot);
        Ok(())
    }
}

#[derive(Default)]
struct FakeStore {
    slot: Mutex<Option<LeaderboardSnapshot>>,
    fail_save: bool,
    saves: Mutex<u32>,
}

#[async_trait]
impl SnapshotStore for FakeStore {
    async fn load(&self) -> AppResult<Option<LeaderboardSnapshot>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, snapshot: &LeaderboardSnapshot) -> AppResult<()> {
        *self.saves.lock().await += 1;
        if self.fail_save {
            return Err(AppError::Upstream("persist failed".to_owned()));
        }
        *self.slot.lock().await = Some(snapshot.clone());
        Ok(())
    }
}

fn test_config() -> LeaderboardConfig {
    LeaderboardConfig {
        retry_base_delay: Duration::from_millis(10),
        ..LeaderboardConfig::default()
    }
}

struct Harness {
    datastore: Arc<FakeDataStore>,
    cache: Arc<FakeCache>,
    store: Arc<FakeStore>,
    service: LeaderboardService,
}

fn harness(datastore: FakeDataStore, names: FakeNames, cache: FakeCache, store: FakeStore) -> Harness {
    let datastore = Arc::new(datastore);
    let cache = Arc::new(cache);
    let store = Arc::new(store);
    let service = LeaderboardService::new(
        datastore.clone(),
        Arc::new(names),
        cache.clone(),
        store.clone(),
        test_config(),
    );

    Harness {
        datastore,
        cache,
        store,
        service,
    }
}

fn aged_snapshot(age_seconds: i64) -> LeaderboardSnapshot {
    LeaderboardSnapshot {
        entries: vec![LeaderboardEntry {
            rank: 1,
            username: "climber".to_owned(),
            user_id: "1".to_owned(),
            summit: 77.0,
        }],
        sample_size: 1,
        computed_at: Utc::now() - TimeDelta::seconds(age_seconds),
    }
}

/// Dataset from the ranking scenario: four players, one with no summits.
fn scenario_datastore() -> FakeDataStore {
    FakeDataStore::with_pages(vec![vec![
        "Player_1", "Player_2", "Player_3", "Player_4",
    ]])
    .with_record("Player_1", json!({ "summit": 50 }))
    .with_record("Player_2", json!({ "summit": 0 }))
    .with_record("Player_3", json!({ "summit": 200 }))
    .with_record("Player_4", json!({ "summit": 100 }))
}

fn scenario_names() -> FakeNames {
    FakeNames {
        usernames: HashMap::from([
            ("1".to_owned(), "alice".to_owned()),
            ("3".to_owned(), "carol".to_owned()),
            ("4".to_owned(), "dave".to_owned()),
        ]),
        fail: false,
    }
}

mod retry {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_rate_limits() {
        let calls = Mutex::new(0_u32);
        let calls = &calls;
        let result = with_retry(3, Duration::from_millis(10), Jitter::None, move || async move {
            let mut calls = calls.lock().await;
            *calls += 1;
            if *calls <= 2 {
                Err(AppError::RateLimited("429".to_owned()))
            } else {
                Ok(*calls)
            }
        })
        .await;

        assert!(matches!(result, Ok(3)));
        assert_eq!(*calls.lock().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn propagates_after_retry_budget_is_spent() {
        let calls = Mutex::new(0_u32);
        let calls = &calls;
        let result: AppResult<()> =
            with_retry(3, Duration::from_millis(10), Jitter::None, move || async move {
                *calls.lock().await += 1;
                Err(AppError::RateLimited("429".to_owned()))
            })
            .await;

        assert!(matches!(result, Err(AppError::RateLimited(_))));
        assert_eq!(*calls.lock().await, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_errors_are_not_retried() {
        let calls = Mutex::new(0_u32);
        let calls = &calls;
        let result: AppResult<()> =
            with_retry(3, Duration::from_millis(10), Jitter::None, move || async move {
                *calls.lock().await += 1;
                Err(AppError::Upstream("503".to_owned()))
            })
            .await;

        assert!(matches!(result, Err(AppError::Upstream(_))));
        assert_eq!(*calls.lock().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn jitter_stays_below_its_cap() {
        let started = tokio::time::Instant::now();
        let calls = Mutex::new(0_u32);
        let calls = &calls;
        let result = with_retry(
            1,
            Duration::from_millis(10),
            Jitter::UpTo(Duration::from_millis(1000)),
            move || async move {
                let mut calls = calls.lock().await;
                *calls += 1;
                if *calls == 1 {
                    Err(AppError::RateLimited("429".to_owned()))
                } else {
                    Ok(())
                }
            },
        )
        .await;

        assert!(result.is_ok());
        assert!(started.elapsed() < Duration::from_millis(1011));
    }
}

mod sampling {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn page_budget_bounds_listing() {
        // Three pages of 100 zero-score keys; budget for 250 candidates at
        // page size 100 is exactly 3 pages even though a cursor remains.
        let mut pages: Vec<Vec<String>> = Vec::new();
        let mut datastore = FakeDataStore::default();
        for page in 0..4 {
            let keys: Vec<String> = (0..100).map(|i| format!("Player_{}", page * 100 + i)).collect();
            pages.push(keys);
        }
        for keys in &pages {
            for key in keys {
                datastore.records.insert(key.clone(), json!({ "summit": 0 }));
            }
        }
        datastore.pages = pages
            .iter()
            .enumerate()
            .map(|(index, keys)| KeyListPage {
                keys: keys.clone(),
                next_cursor: Some((index + 1).to_string()),
            })
            .collect();

        let harness = harness(
            datastore,
            FakeNames::default(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let outcome = harness
            .service
            .sample(250, 100)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(*harness.datastore.list_calls.lock().await, 3);
        assert!(outcome.candidates.is_empty());
        assert!(!outcome.exhausted);
        assert!(!outcome.throttled);
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_data_is_reported_as_exhausted() {
        let harness = harness(
            scenario_datastore(),
            FakeNames::default(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let outcome = harness
            .service
            .sample(200, 100)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(outcome.exhausted);
        assert_eq!(outcome.candidates.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_records_are_skipped_silently() {
        let datastore = FakeDataStore::with_pages(vec![vec!["Player_1", "Player_9", "Player_3"]])
            .with_record("Player_1", json!({ "summit": 5 }))
            .with_record("Player_3", json!({ "summit": 9 }));

        let harness = harness(
            datastore,
            FakeNames::default(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let outcome = harness
            .service
            .sample(200, 100)
            .await
            .unwrap_or_else(|_| unreachable!());

        let ids: Vec<&str> = outcome
            .candidates
            .iter()
            .map(|c| c.user_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_throttling_yields_a_partial_sample() {
        let datastore = FakeDataStore {
            rate_limited_keys: vec!["Player_3".to_owned()],
            ..FakeDataStore::with_pages(vec![vec!["Player_1", "Player_3", "Player_4"]])
                .with_record("Player_1", json!({ "summit": 5 }))
                .with_record("Player_4", json!({ "summit": 9 }))
        };

        let harness = harness(
            datastore,
            FakeNames::default(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let outcome = harness
            .service
            .sample(200, 100)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(outcome.throttled);
        assert!(!outcome.exhausted);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].user_id, "1");
    }

    #[tokio::test(start_paused = true)]
    async fn nan_summit_values_never_rank() {
        let datastore = FakeDataStore::with_pages(vec![vec!["Player_1", "Player_2"]])
            .with_record("Player_1", json!({ "summit": "NaN" }))
            .with_record("Player_2", json!({ "summit": 3 }));

        let harness = harness(
            datastore,
            FakeNames::default(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let outcome = harness
            .service
            .sample(200, 100)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].user_id, "2");
    }

    #[tokio::test(start_paused = true)]
    async fn opaque_record_bodies_never_rank() {
        let datastore = FakeDataStore::with_pages(vec![vec!["Player_1", "Player_2"]])
            .with_record("Player_1", json!("not json at all"))
            .with_record("Player_2", json!({ "summit": 2 }));

        let harness = harness(
            datastore,
            FakeNames::default(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let outcome = harness
            .service
            .sample(200, 100)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].user_id, "2");
    }
}

mod leaderboard_reads {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ranks_top_entries_and_excludes_zero_scores() {
        let harness = harness(
            scenario_datastore(),
            scenario_names(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let view = harness
            .service
            .get_leaderboard(LeaderboardQuery {
                top_limit: Some(2),
                ..LeaderboardQuery::default()
            })
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(!view.cached);
        assert_eq!(view.cache_age_seconds, 0);
        assert_eq!(view.sample_size, 3);
        assert_eq!(view.entries.len(), 2);

        assert_eq!(view.entries[0].rank, 1);
        assert_eq!(view.entries[0].user_id, "3");
        assert_eq!(view.entries[0].username, "carol");
        assert_eq!(view.entries[0].summit, 200.0);

        assert_eq!(view.entries[1].rank, 2);
        assert_eq!(view.entries[1].user_id, "4");
        assert_eq!(view.entries[1].summit, 100.0);

        assert!(view.entries.iter().all(|entry| entry.user_id != "2"));
        assert!(view.sample_size >= view.entries.len());
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_reads_within_ttl_hit_the_cache() {
        let harness = harness(
            scenario_datastore(),
            scenario_names(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let query = LeaderboardQuery {
            top_limit: Some(2),
            ..LeaderboardQuery::default()
        };
        let first = harness
            .service
            .get_leaderboard(query)
            .await
            .unwrap_or_else(|_| unreachable!());
        let second = harness
            .service
            .get_leaderboard(query)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(*harness.datastore.list_calls.lock().await, 1);
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.entries, first.entries);
        assert_eq!(second.computed_at, first.computed_at);
    }

    #[tokio::test(start_paused = true)]
    async fn forced_refresh_samples_even_when_fresh() {
        let harness = harness(
            scenario_datastore(),
            scenario_names(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let fresh = harness
            .service
            .get_leaderboard(LeaderboardQuery::default())
            .await;
        assert!(fresh.is_ok());

        let forced = harness
            .service
            .get_leaderboard(LeaderboardQuery {
                force_refresh: true,
                ..LeaderboardQuery::default()
            })
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(*harness.datastore.list_calls.lock().await, 2);
        assert!(!forced.cached);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_cache_triggers_a_new_sample() {
        let harness = harness(
            scenario_datastore(),
            scenario_names(),
            FakeCache::holding(Duration::from_secs(600), aged_snapshot(601)),
            FakeStore::default(),
        );

        let view = harness
            .service
            .get_leaderboard(LeaderboardQuery::default())
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(*harness.datastore.list_calls.lock().await, 1);
        assert!(!view.cached);
        assert_eq!(view.entries[0].user_id, "3");
    }

    #[tokio::test(start_paused = true)]
    async fn near_expiry_cache_still_serves() {
        let harness = harness(
            scenario_datastore(),
            scenario_names(),
            FakeCache::holding(Duration::from_secs(600), aged_snapshot(599)),
            FakeStore::default(),
        );

        let view = harness
            .service
            .get_leaderboard(LeaderboardQuery::default())
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(*harness.datastore.list_calls.lock().await, 0);
        assert!(view.cached);
        assert_eq!(view.cache_age_seconds, 599);
        assert_eq!(view.entries[0].username, "climber");
    }

    #[tokio::test(start_paused = true)]
    async fn cold_start_serves_persisted_snapshot() {
        let store = FakeStore::default();
        *store.slot.lock().await = Some(aged_snapshot(30));

        let harness = harness(
            scenario_datastore(),
            scenario_names(),
            FakeCache::empty(Duration::from_secs(600)),
            store,
        );

        let view = harness
            .service
            .get_leaderboard(LeaderboardQuery::default())
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(*harness.datastore.list_calls.lock().await, 0);
        assert!(view.cached);
        assert_eq!(view.entries[0].username, "climber");
        // The warmed snapshot now lives in the in-memory slot.
        assert_eq!(*harness.cache.writes.lock().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_persisted_snapshot_is_ignored() {
        let store = FakeStore::default();
        *store.slot.lock().await = Some(aged_snapshot(900));

        let harness = harness(
            scenario_datastore(),
            scenario_names(),
            FakeCache::empty(Duration::from_secs(600)),
            store,
        );

        let view = harness
            .service
            .get_leaderboard(LeaderboardQuery::default())
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(!view.cached);
        assert_eq!(*harness.datastore.list_calls.lock().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_failure_serves_stale_snapshot() {
        let datastore = FakeDataStore {
            fail_listing: true,
            ..FakeDataStore::default()
        };
        let harness = harness(
            datastore,
            scenario_names(),
            FakeCache::holding(Duration::from_secs(600), aged_snapshot(4000)),
            FakeStore::default(),
        );

        let view = harness
            .service
            .get_leaderboard(LeaderboardQuery::default())
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(view.cached);
        assert_eq!(view.entries[0].username, "climber");
        assert!(view.cache_age_seconds >= 4000);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_failure_without_history_surfaces() {
        let datastore = FakeDataStore {
            fail_listing: true,
            ..FakeDataStore::default()
        };
        let harness = harness(
            datastore,
            scenario_names(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let result = harness
            .service
            .get_leaderboard(LeaderboardQuery::default())
            .await;

        assert!(matches!(result, Err(AppError::Upstream(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn throttled_empty_sample_counts_as_failed_refresh() {
        let datastore = FakeDataStore {
            throttle_listing: true,
            ..FakeDataStore::default()
        };
        let harness = harness(
            datastore,
            scenario_names(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let result = harness
            .service
            .get_leaderboard(LeaderboardQuery::default())
            .await;

        assert!(matches!(result, Err(AppError::RateLimited(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn name_resolution_failure_falls_back_to_ids() {
        let harness = harness(
            scenario_datastore(),
            FakeNames {
                fail: true,
                ..FakeNames::default()
            },
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let view = harness
            .service
            .get_leaderboard(LeaderboardQuery {
                top_limit: Some(1),
                ..LeaderboardQuery::default()
            })
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(view.entries[0].username, "3");
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_persistence_failure_is_invisible() {
        let harness = harness(
            scenario_datastore(),
            scenario_names(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore {
                fail_save: true,
                ..FakeStore::default()
            },
        );

        let view = harness
            .service
            .get_leaderboard(LeaderboardQuery::default())
            .await;

        assert!(view.is_ok());
        assert_eq!(*harness.store.saves.lock().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn requested_limits_are_capped_server_side() {
        let harness = harness(
            scenario_datastore(),
            scenario_names(),
            FakeCache::empty(Duration::from_secs(600)),
            FakeStore::default(),
        );

        let view = harness
            .service
            .get_leaderboard(LeaderboardQuery {
                top_limit: Some(5000),
                sample_size: Some(1_000_000),
                ..LeaderboardQuery::default()
            })
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(view.entries.len() <= 50);
        // 10_000 sampled keys at page size 100 is a 100 page budget; the
        // scenario dataset ends after one page regardless.
        assert_eq!(*harness.datastore.list_calls.lock().await, 1);
    }
}
