use std::time::Duration;

use reqwest::{Client, Response, header::RETRY_AFTER};
use serde_json::Value;
use tokio::{sync::Mutex, time::sleep};

use crate::{
    Res, config::Settings, error::ExportError, management::TokenManager, types::TimeRange,
    warning,
};

/// Number of extra attempts after a transient failure.
const MAX_RETRIES: u32 = 1;
/// Pause before the retry when Spotify gives no `Retry-After` hint.
const RETRY_BACKOFF: Duration = Duration::from_secs(5);
/// Longest `Retry-After` we are willing to sleep through.
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Endpoints of the Spotify Web API used by the exporter.
///
/// Every method returns the raw JSON body. The pipeline only depends on this
/// trait, so it runs unchanged against [`SpotifyClient`] or an in-memory
/// stand-in.
#[allow(async_fn_in_trait)]
pub trait SpotifyApi {
    async fn recently_played(&self, limit: u32) -> Res<Value>;
    async fn top_artists(&self, limit: u32, time_range: TimeRange) -> Res<Value>;
    async fn top_tracks(&self, limit: u32, time_range: TimeRange) -> Res<Value>;
    async fn playlists(&self, limit: u32) -> Res<Value>;
    async fn playlist_items(&self, playlist_id: &str, limit: u32) -> Res<Value>;
    async fn audio_features(&self, ids: &[String]) -> Res<Value>;
    async fn artists(&self, ids: &[String]) -> Res<Value>;
}

/// Authenticated HTTP session against the Spotify Web API.
pub struct SpotifyClient {
    http: Client,
    settings: Settings,
    token_mgr: Mutex<TokenManager>,
}

impl SpotifyClient {
    pub fn new(settings: Settings, token_mgr: TokenManager) -> Res<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            http,
            settings,
            token_mgr: Mutex::new(token_mgr),
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Res<Value> {
        let url = format!(
            "{base}/{path}",
            base = self.settings.api_url.trim_end_matches('/'),
            path = path
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            let token = self
                .token_mgr
                .lock()
                .await
                .get_valid_token(&self.settings)
                .await?;

            let response = self
                .http
                .get(&url)
                .query(query)
                .bearer_auth(token)
                .send()
                .await;

            let backoff = match response {
                Ok(resp) if resp.status().is_success() => return Ok(resp.json::<Value>().await?),
                Ok(resp) => {
                    let err = ExportError::Status {
                        status: resp.status(),
                        url: url.clone(),
                    };
                    if attempt > MAX_RETRIES || !err.is_transient() {
                        return Err(err);
                    }
                    match retry_after(&resp) {
                        Some(secs) if secs > MAX_RETRY_AFTER_SECS => {
                            warning!(
                                "Retry after has reached an abnormal high of {} seconds. Try again later.",
                                secs
                            );
                            return Err(err);
                        }
                        Some(secs) => Duration::from_secs(secs),
                        None => RETRY_BACKOFF,
                    }
                }
                Err(e) => {
                    let err = ExportError::from(e);
                    if attempt > MAX_RETRIES || !err.is_transient() {
                        return Err(err);
                    }
                    RETRY_BACKOFF
                }
            };

            warning!(
                "Request to {} failed, retrying in {} seconds",
                path,
                backoff.as_secs()
            );
            sleep(backoff).await;
        }
    }
}

fn retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}

impl SpotifyApi for SpotifyClient {
    async fn recently_played(&self, limit: u32) -> Res<Value> {
        self.get_json("me/player/recently-played", &[("limit", limit.to_string())])
            .await
    }

    async fn top_artists(&self, limit: u32, time_range: TimeRange) -> Res<Value> {
        self.get_json(
            "me/top/artists",
            &[
                ("limit", limit.to_string()),
                ("time_range", time_range.to_string()),
            ],
        )
        .await
    }

    async fn top_tracks(&self, limit: u32, time_range: TimeRange) -> Res<Value> {
        self.get_json(
            "me/top/tracks",
            &[
                ("limit", limit.to_string()),
                ("time_range", time_range.to_string()),
            ],
        )
        .await
    }

    async fn playlists(&self, limit: u32) -> Res<Value> {
        self.get_json("me/playlists", &[("limit", limit.to_string())])
            .await
    }

    async fn playlist_items(&self, playlist_id: &str, limit: u32) -> Res<Value> {
        self.get_json(
            &format!("playlists/{playlist_id}/tracks"),
            &[("limit", limit.to_string())],
        )
        .await
    }

    async fn audio_features(&self, ids: &[String]) -> Res<Value> {
        self.get_json("audio-features", &[("ids", ids.join(","))])
            .await
    }

    async fn artists(&self, ids: &[String]) -> Res<Value> {
        self.get_json("artists", &[("ids", ids.join(","))]).await
    }
}
