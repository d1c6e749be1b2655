use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::{Client, Url};
use tokio::sync::Mutex;

use crate::{
    Res,
    config::Settings,
    error::ExportError,
    info,
    management::TokenManager,
    server::start_api_server,
    types::{AuthSession, Token, TokenResponse},
    utils, warning,
};

/// How long the user gets to approve the request in the browser.
const AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Returns a token manager holding a token that covers `scopes`.
///
/// A cached token for the configured user is reused when it was granted all
/// requested scopes; otherwise the browser flow runs and the new token is
/// cached.
pub async fn get_token(settings: &Settings, scopes: &str) -> Res<TokenManager> {
    if let Ok(manager) = TokenManager::load(&settings.username).await {
        if manager.covers_scopes(scopes) {
            return Ok(manager);
        }
        info!("Cached token lacks required scopes, authorizing again");
    }

    let token = authorize(settings, scopes).await?;
    let manager = TokenManager::new(&settings.username, token);
    if let Err(e) = manager.persist().await {
        warning!("Failed to save token to cache: {}", e);
    }
    Ok(manager)
}

/// Runs the authorization-code flow through the local callback server.
pub async fn authorize(settings: &Settings, scopes: &str) -> Res<Token> {
    let csrf_state = utils::generate_state();
    let shared_state: Arc<Mutex<Option<AuthSession>>> = Arc::new(Mutex::new(Some(AuthSession {
        csrf_state: csrf_state.clone(),
        token: None,
    })));

    let callback_path = Url::parse(&settings.redirect_uri)
        .map_err(|e| ExportError::Config(format!("invalid redirect URI: {e}")))?
        .path()
        .to_string();

    let server_state = Arc::clone(&shared_state);
    let server_settings = settings.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state, server_settings, callback_path).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    let auth_url = Url::parse_with_params(
        &settings.auth_url,
        &[
            ("client_id", settings.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("state", csrf_state.as_str()),
            ("scope", scopes),
        ],
    )
    .map_err(|e| ExportError::Config(format!("invalid auth URL: {e}")))?;

    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_token(shared_state).await;
    server.abort();

    token.ok_or_else(|| ExportError::Auth("authorization failed or timed out".to_string()))
}

async fn wait_for_token(shared_state: Arc<Mutex<Option<AuthSession>>>) -> Option<Token> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < AUTH_TIMEOUT {
        let lock = shared_state.lock().await;
        if let Some(session) = lock.as_ref() {
            if let Some(token) = &session.token {
                return Some(token.clone());
            }
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

pub async fn exchange_code(settings: &Settings, code: &str) -> Res<Token> {
    let client = Client::new();
    let res = client
        .post(&settings.token_url)
        .basic_auth(&settings.client_id, Some(&settings.client_secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", settings.redirect_uri.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?;

    let json: TokenResponse = res.json().await?;
    Ok(into_token(json, None))
}

pub async fn refresh_token(settings: &Settings, refresh_token: &str) -> Res<Token> {
    let client = Client::new();
    let res = client
        .post(&settings.token_url)
        .basic_auth(&settings.client_id, Some(&settings.client_secret))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await?
        .error_for_status()?;

    let json: TokenResponse = res.json().await?;
    Ok(into_token(json, Some(refresh_token)))
}

fn into_token(response: TokenResponse, previous_refresh: Option<&str>) -> Token {
    Token {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .or_else(|| previous_refresh.map(String::from))
            .unwrap_or_default(),
        scope: response.scope,
        expires_in: response.expires_in.unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    }
}
