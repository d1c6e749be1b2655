use std::path::PathBuf;

use chrono::Utc;

use crate::{
    Res,
    config::{self, Settings},
    error::ExportError,
    spotify,
    types::Token,
    warning,
};

/// Seconds before expiry at which a token is refreshed.
const EXPIRY_MARGIN_SECS: u64 = 240;

pub struct TokenManager {
    username: String,
    token: Token,
}

impl TokenManager {
    pub fn new(username: &str, token: Token) -> Self {
        TokenManager {
            username: username.to_string(),
            token,
        }
    }

    pub async fn load(username: &str) -> Res<Self> {
        let content = async_fs::read_to_string(Self::token_path(username)).await?;
        let token: Token = serde_json::from_str(&content)?;
        Ok(Self::new(username, token))
    }

    pub async fn persist(&self) -> Res<()> {
        let path = Self::token_path(&self.username);
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.token)?;
        async_fs::write(path, json).await?;
        Ok(())
    }

    /// Returns an access token, refreshing it first when it is about to
    /// expire.
    pub async fn get_valid_token(&mut self, settings: &Settings) -> Res<String> {
        if self.is_expired() {
            let mut refreshed = spotify::auth::refresh_token(settings, &self.token.refresh_token)
                .await
                .map_err(|e| ExportError::Auth(format!("token refresh failed: {e}")))?;
            if refreshed.scope.is_empty() {
                refreshed.scope = self.token.scope.clone();
            }
            self.token = refreshed;
            if let Err(e) = self.persist().await {
                warning!("Failed to save refreshed token to cache: {}", e);
            }
        }

        Ok(self.token.access_token.clone())
    }

    /// Whether the cached token was granted every scope in `scopes`.
    pub fn covers_scopes(&self, scopes: &str) -> bool {
        let granted: Vec<&str> = self.token.scope.split_whitespace().collect();
        scopes.split_whitespace().all(|s| granted.contains(&s))
    }

    fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + EXPIRY_MARGIN_SECS >= self.token.obtained_at + self.token.expires_in
    }

    fn token_path(username: &str) -> PathBuf {
        let mut path = config::app_dir();
        path.push(format!("cache/token-{username}.json"));
        path
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }
}
