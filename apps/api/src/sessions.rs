use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use summitdesk_core::{AppError, AppResult};
use tokio::sync::RwLock;

/// How long an issued admin session stays valid.
const SESSION_LIFETIME_HOURS: i64 = 24;

/// In-memory bearer-token session store for the single admin login.
///
/// Tokens are process-local; a restart signs everyone out, which is
/// acceptable for an operations console with one shared credential.
pub struct SessionStore {
    tokens: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Issues a fresh session token.
    pub async fn issue(&self) -> AppResult<String> {
        let token = generate_token()?;
        let expires_at = Utc::now() + Duration::hours(SESSION_LIFETIME_HOURS);

        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, expiry| *expiry > Utc::now());
        tokens.insert(token.clone(), expires_at);

        Ok(token)
    }

    /// Whether a token identifies a live session.
    pub async fn validate(&self, token: &str) -> bool {
        self.tokens
            .read()
            .await
            .get(token)
            .is_some_and(|expiry| *expiry > Utc::now())
    }

    /// Ends a session. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &str) {
        self.tokens.write().await.remove(token);
    }
}

/// Generates a cryptographically random session token as hex.
fn generate_token() -> AppResult<String> {
    use std::fmt::Write;

    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate session token: {error}")))?;

    Ok(bytes
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        }))
}

#[cfg(test)]
mod tests {
    use super::SessionStore;

    #[tokio::test]
    async fn issued_tokens_validate_until_revoked() {
        let sessions = SessionStore::new();
        let token = sessions.issue().await.unwrap_or_else(|_| unreachable!());

        assert_eq!(token.len(), 64);
        assert!(sessions.validate(&token).await);

        sessions.revoke(&token).await;
        assert!(!sessions.validate(&token).await);
    }

    #[tokio::test]
    async fn unknown_tokens_are_rejected() {
        let sessions = SessionStore::new();
        assert!(!sessions.validate("not-a-token").await);
    }

    #[tokio::test]
    async fn tokens_are_unique_per_issue() {
        let sessions = SessionStore::new();
        let first = sessions.issue().await.unwrap_or_else(|_| unreachable!());
        let second = sessions.issue().await.unwrap_or_else(|_| unreachable!());
        assert_ne!(first, second);
    }
}
