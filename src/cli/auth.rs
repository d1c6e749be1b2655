use crate::{
    config::Settings,
    error,
    management::TokenManager,
    query::{QueryKind, required_scopes},
    spotify, success, warning,
};

pub async fn auth() {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Cannot load settings. Err: {}", e),
    };

    let scopes = required_scopes(&QueryKind::ALL);
    let token = match spotify::auth::authorize(&settings, &scopes).await {
        Ok(token) => token,
        Err(e) => error!("{}", e),
    };

    let token_mgr = TokenManager::new(&settings.username, token);
    if let Err(e) = token_mgr.persist().await {
        warning!("Failed to save token to cache: {}", e);
    }

    success!(
        "Authentication successful! Granted scopes: {}",
        token_mgr.current_token().scope
    );
}
