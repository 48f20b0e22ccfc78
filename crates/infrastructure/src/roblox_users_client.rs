use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::warn;

use summitdesk_application::{Jitter, NameResolver, with_retry};
use summitdesk_core::{AppError, AppResult};

const USERS_API_BASE: &str = "https://users.roblox.com/v1";

/// Bulk lookups are capped by the upstream API.
const BATCH_LOOKUP_LIMIT: usize = 100;

/// Roblox Users API adapter for username/id resolution.
///
/// Name lookups retry with jitter because several lookups commonly fire
/// together right after a sampling run.
pub struct RobloxUsersClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl RobloxUsersClient {
    /// Creates a client against the public Users API.
    #[must_use]
    pub fn new(http: reqwest::Client, max_retries: u32, retry_base_delay: Duration) -> Self {
        Self {
            http,
            base_url: USERS_API_BASE.to_owned(),
            max_retries,
            retry_base_delay,
        }
    }

    async fn post_json(&self, path: &str, payload: &Value) -> AppResult<Value> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|error| AppError::Upstream(format!("users request failed: {error}")))?;

        read_json_response(response).await
    }

    async fn get_json(&self, path: &str) -> AppResult<Value> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|error| AppError::Upstream(format!("users request failed: {error}")))?;

        read_json_response(response).await
    }

    /// Resolves one chunk of ids, falling back to per-id lookups when the
    /// bulk endpoint fails. Individual failures are absorbed; absent ids
    /// simply stay unresolved.
    async fn resolve_chunk(&self, chunk: &[String], names: &mut HashMap<String, String>) {
        let numeric_ids: Vec<i64> = chunk
            .iter()
            .filter_map(|id| id.parse::<i64>().ok())
            .collect();
        if numeric_ids.is_empty() {
            return;
        }

        let payload = json!({ "userIds": numeric_ids, "excludeBannedUsers": false });
        let payload_ref = &payload;
        let client = self;
        let bulk = with_retry(
            self.max_retries,
            self.retry_base_delay,
            Jitter::UpTo(Duration::from_secs(1)),
            move || client.post_json("/users", payload_ref),
        )
        .await;

        match bulk {
            Ok(body) => names.extend(collect_usernames(&body)),
            Err(error) => {
                warn!(ids = chunk.len(), %error, "bulk username lookup failed, trying singles");
                for id in &numeric_ids {
                    match self.get_json(&format!("/users/{id}")).await {
                        Ok(body) => {
                            if let Some(name) = body.get("name").and_then(Value::as_str) {
                                names.insert(id.to_string(), name.to_owned());
                            }
                        }
                        Err(error) => {
                            warn!(user_id = id, %error, "single username lookup failed");
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl NameResolver for RobloxUsersClient {
    async fn user_id_for_username(&self, username: &str) -> AppResult<String> {
        let payload = json!({ "usernames": [username], "excludeBannedUsers": false });
        let payload_ref = &payload;
        let client = self;
        let body = with_retry(
            self.max_retries,
            self.retry_base_delay,
            Jitter::UpTo(Duration::from_secs(1)),
            move || client.post_json("/usernames/users", payload_ref),
        )
        .await?;

        match_user_id(&body, username)
            .ok_or_else(|| AppError::NotFound(format!("no user named {username}")))
    }

    async fn usernames_for_user_ids(
        &self,
        user_ids: &[String],
    ) -> AppResult<HashMap<String, String>> {
        let mut names = HashMap::with_capacity(user_ids.len());
        for chunk in user_ids.chunks(BATCH_LOOKUP_LIMIT) {
            self.resolve_chunk(chunk, &mut names).await;
        }

        Ok(names)
    }
}

async fn read_json_response(response: reqwest::Response) -> AppResult<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(match status {
            StatusCode::NOT_FOUND => AppError::NotFound(body),
            StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited(body),
            status => AppError::Upstream(format!("users API returned {status}: {body}")),
        });
    }

    response
        .json()
        .await
        .map_err(|error| AppError::Upstream(format!("users response was not JSON: {error}")))
}

/// Picks the exact (case-insensitive) username match out of a
/// `/usernames/users` response.
fn match_user_id(body: &Value, username: &str) -> Option<String> {
    let data = body.get("data")?.as_array()?;

    data.iter()
        .find(|entry| {
            ["requestedUsername", "name"].iter().any(|field| {
                entry
                    .get(*field)
                    .and_then(Value::as_str)
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(username))
            })
        })
        .and_then(|entry| entry.get("id"))
        .and_then(Value::as_i64)
        .map(|id| id.to_string())
}

/// Flattens a `/users` bulk response into an id-to-name map.
fn collect_usernames(body: &Value) -> HashMap<String, String> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let id = entry.get("id").and_then(Value::as_i64)?;
                    let name = entry.get("name").and_then(Value::as_str)?;
                    Some((id.to_string(), name.to_owned()))
                })
                .collect()
        })
        .unwrap_or_default()
}
