//! Configuration management for the Spotify exporter.
//!
//! Values come from the process environment, optionally seeded from `.env`
//! files. They are read once into an immutable [`Settings`] value that is
//! passed to every component that needs it.
//!
//! The lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. `.env` file in the working directory
//! 4. Application defaults (URLs, server address, timeout)

use std::{env, path::PathBuf, time::Duration};

use crate::{Res, error::ExportError};

pub const APP_DIR: &str = "spotdump";

const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Loads environment variables from `.env` files.
///
/// The file in the platform-specific local data directory is tried first:
/// - Linux: `~/.local/share/spotdump/.env`
/// - macOS: `~/Library/Application Support/spotdump/.env`
/// - Windows: `%LOCALAPPDATA%/spotdump/.env`
///
/// Missing files are not an error; already set variables are never
/// overwritten.
pub async fn load_env() -> Res<()> {
    let path = app_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| ExportError::Config(e.to_string()))?;
    }
    dotenv::dotenv().ok();
    Ok(())
}

/// Platform-specific data directory of the application.
pub fn app_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Immutable runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub username: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub server_address: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub request_timeout: Duration,
}

impl Settings {
    /// Reads the settings from the environment.
    ///
    /// # Errors
    ///
    /// Fails with [`ExportError::Config`] when one of the four credentials
    /// is missing or the timeout is not a number of seconds.
    pub fn from_env() -> Res<Self> {
        let timeout = match env::var("SPOTIFY_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ExportError::Config(format!(
                    "SPOTIFY_REQUEST_TIMEOUT_SECS must be a number of seconds, got '{raw}'"
                ))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            username: required("SPOTIFY_USER_ID")?,
            client_id: required("SPOTIFY_API_AUTH_CLIENT_ID")?,
            client_secret: required("SPOTIFY_API_AUTH_CLIENT_SECRET")?,
            redirect_uri: required("SPOTIFY_API_REDIRECT_URI")?,
            server_address: optional("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            auth_url: optional("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: optional("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: optional("SPOTIFY_API_URL", DEFAULT_API_URL),
            request_timeout: Duration::from_secs(timeout),
        })
    }
}

fn required(name: &str) -> Res<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ExportError::Config(format!("{name} must be set"))),
    }
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
