use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use summitdesk_application::{DataStoreClient, KeyListPage};
use summitdesk_core::{AppError, AppResult};

/// Connection settings for one scoped standard datastore.
#[derive(Debug, Clone)]
pub struct RobloxDataStoreConfig {
    /// Open Cloud API key with datastore permissions.
    pub api_key: String,
    /// Universe (experience) the datastore belongs to.
    pub universe_id: String,
    /// Datastore name, e.g. `PlayerData`.
    pub datastore_name: String,
    /// Datastore scope, e.g. `global`.
    pub scope: String,
}

/// Open Cloud standard-datastore adapter (v1 entries API).
pub struct RobloxDataStoreClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    datastore_name: String,
    scope: String,
}

impl RobloxDataStoreClient {
    /// Creates a client for one scoped datastore.
    #[must_use]
    pub fn new(http: reqwest::Client, config: RobloxDataStoreConfig) -> Self {
        let base_url = format!(
            "https://apis.roblox.com/datastores/v1/universes/{}/standard-datastores",
            config.universe_id
        );

        Self {
            http,
            base_url,
            api_key: config.api_key,
            datastore_name: config.datastore_name,
            scope: config.scope,
        }
    }

    fn entry_url(&self) -> String {
        format!("{}/datastore/entries/entry", self.base_url)
    }

    fn list_url(&self) -> String {
        format!("{}/datastore/entries", self.base_url)
    }

    fn entry_query<'a>(&'a self, key: &'a str) -> [(&'a str, &'a str); 3] {
        [
            ("datastoreName", self.datastore_name.as_str()),
            ("scope", self.scope.as_str()),
            ("entryKey", key),
        ]
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        builder
            .header("x-api-key", self.api_key.as_str())
            .send()
            .await
            .map_err(|error| AppError::Upstream(format!("datastore request failed: {error}")))
    }

    /// Maps a non-success datastore response onto the error taxonomy.
    async fn failure(&self, response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = extract_error_message(&body);

        match status {
            StatusCode::NOT_FOUND => AppError::NotFound(detail),
            StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited(detail),
            status => AppError::Upstream(format!("datastore returned {status}: {detail}")),
        }
    }
}

#[async_trait]
impl DataStoreClient for RobloxDataStoreClient {
    async fn list_keys(&self, page_size: u32, cursor: Option<&str>) -> AppResult<KeyListPage> {
        let page_size = page_size.to_string();
        let mut query = vec![
            ("datastoreName", self.datastore_name.as_str()),
            ("scope", self.scope.as_str()),
            ("limit", page_size.as_str()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let response = self.send(self.http.get(self.list_url()).query(&query)).await?;
        if !response.status().is_success() {
            return Err(self.failure(response).await);
        }

        let body: Value = response.json().await.map_err(|error| {
            AppError::Upstream(format!("datastore list response was not JSON: {error}"))
        })?;

        Ok(parse_list_response(&body))
    }

    async fn get_entry(&self, key: &str) -> AppResult<Value> {
        let response = self
            .send(self.http.get(self.entry_url()).query(&self.entry_query(key)))
            .await?;
        if !response.status().is_success() {
            return Err(self.failure(response).await);
        }

        let body = response.text().await.map_err(|error| {
            AppError::Upstream(format!("failed to read datastore entry body: {error}"))
        })?;

        // Records are stored as JSON, but some game versions wrote plain
        // strings. Fall back to an opaque value instead of failing.
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    async fn set_entry(&self, key: &str, value: &Value) -> AppResult<()> {
        let response = self
            .send(
                self.http
                    .post(self.entry_url())
                    .query(&self.entry_query(key))
                    .json(value),
            )
            .await?;
        if !response.status().is_success() {
            return Err(self.failure(response).await);
        }

        Ok(())
    }

    async fn delete_entry(&self, key: &str) -> AppResult<()> {
        let response = self
            .send(
                self.http
                    .delete(self.entry_url())
                    .query(&self.entry_query(key)),
            )
            .await?;
        if !response.status().is_success() {
            return Err(self.failure(response).await);
        }

        Ok(())
    }
}

/// Normalizes both observed list response shapes into one key page.
///
/// Older universes return `{ keys: [...] }` where elements are strings or
/// `{ key }` objects; newer ones return `{ entries: [{ entryKey }] }`.
fn parse_list_response(body: &Value) -> KeyListPage {
    let mut keys: Vec<String> = body
        .get("entries")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("entryKey").and_then(Value::as_str))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    if keys.is_empty() {
        if let Some(raw_keys) = body.get("keys").and_then(Value::as_array) {
            keys = raw_keys
                .iter()
                .filter_map(|raw| match raw {
                    Value::String(key) => Some(key.clone()),
                    Value::Object(object) => object
                        .get("key")
                        .or_else(|| object.get("entryKey"))
                        .and_then(Value::as_str)
                        .map(str::to_owned),
                    _ => None,
                })
                .collect();
        }
    }

    let next_cursor = body
        .get("nextPageCursor")
        .and_then(Value::as_str)
        .filter(|cursor| !cursor.is_empty())
        .map(str::to_owned);

    KeyListPage { keys, next_cursor }
}

/// Pulls a human-readable message out of an upstream error payload.
fn extract_error_message(body: &str) -> String {
    let Ok(payload) = serde_json::from_str::<Value>(body) else {
        return body.to_owned();
    };

    for field in ["message", "error", "errorMessage"] {
        if let Some(message) = payload.get(field).and_then(Value::as_str) {
            return message.to_owned();
        }
    }

    body.to_owned()
}
