#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

use reqwest::StatusCode;
use serde_json::{Value, json};
use spotdump::{Res, error::ExportError, spotify::SpotifyApi, types::TimeRange};

/// In-memory stand-in for the Spotify Web API.
#[derive(Default)]
pub struct FakeApi {
    pub recently_played: Value,
    pub top_artists: Value,
    pub top_tracks: Value,
    pub playlists: Value,
    pub playlist_items: HashMap<String, Value>,
    pub audio_features: HashMap<String, Value>,
    pub artists: HashMap<String, Value>,
    /// Feature calls (1-based) that fail with a bad gateway.
    pub failing_feature_calls: Vec<usize>,
    /// Feature and playlist item calls fail as if the token refresh failed.
    pub auth_lost: bool,
    pub feature_calls: RefCell<Vec<(String, Vec<String>)>>,
    pub calls: Cell<usize>,
}

impl FakeApi {
    pub fn with_track(mut self, id: &str) -> Self {
        self.audio_features
            .insert(id.to_string(), audio_feature(id, 0.5));
        self
    }

    pub fn with_artist(mut self, id: &str, genres: &[&str]) -> Self {
        self.artists
            .insert(id.to_string(), artist(id, &id.to_uppercase(), genres));
        self
    }

    pub fn feature_call_sizes(&self, endpoint: &str) -> Vec<usize> {
        self.feature_calls
            .borrow()
            .iter()
            .filter(|(name, _)| name == endpoint)
            .map(|(_, ids)| ids.len())
            .collect()
    }

    fn feature_call(&self, endpoint: &str, ids: &[String]) -> Res<()> {
        self.feature_calls
            .borrow_mut()
            .push((endpoint.to_string(), ids.to_vec()));
        let call = self.feature_calls.borrow().len();
        if self.auth_lost {
            return Err(ExportError::Auth("token refresh failed".to_string()));
        }
        if self.failing_feature_calls.contains(&call) {
            return Err(ExportError::Status {
                status: StatusCode::BAD_GATEWAY,
                url: format!("fake://{endpoint}"),
            });
        }
        Ok(())
    }
}

impl SpotifyApi for FakeApi {
    async fn recently_played(&self, _limit: u32) -> Res<Value> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.recently_played.clone())
    }

    async fn top_artists(&self, _limit: u32, _time_range: TimeRange) -> Res<Value> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.top_artists.clone())
    }

    async fn top_tracks(&self, _limit: u32, _time_range: TimeRange) -> Res<Value> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.top_tracks.clone())
    }

    async fn playlists(&self, _limit: u32) -> Res<Value> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.playlists.clone())
    }

    async fn playlist_items(&self, playlist_id: &str, _limit: u32) -> Res<Value> {
        self.calls.set(self.calls.get() + 1);
        if self.auth_lost {
            return Err(ExportError::Auth("token refresh failed".to_string()));
        }
        self.playlist_items
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| ExportError::Status {
                status: StatusCode::NOT_FOUND,
                url: format!("fake://playlists/{playlist_id}/tracks"),
            })
    }

    async fn audio_features(&self, ids: &[String]) -> Res<Value> {
        self.feature_call("audio_features", ids)?;
        let records: Vec<Value> = ids
            .iter()
            .map(|id| self.audio_features.get(id).cloned().unwrap_or(Value::Null))
            .collect();
        Ok(json!({ "audio_features": records }))
    }

    async fn artists(&self, ids: &[String]) -> Res<Value> {
        self.feature_call("artists", ids)?;
        let records: Vec<Value> = ids
            .iter()
            .map(|id| self.artists.get(id).cloned().unwrap_or(Value::Null))
            .collect();
        Ok(json!({ "artists": records }))
    }
}

pub fn audio_feature(id: &str, danceability: f64) -> Value {
    json!({
        "id": id,
        "danceability": danceability,
        "energy": 0.8,
        "key": 5,
        "loudness": -6.5,
        "mode": 1,
        "speechiness": 0.04,
        "acousticness": 0.1,
        "instrumentalness": 0.0,
        "liveness": 0.2,
        "valence": 0.6,
        "type": "audio_features"
    })
}

pub fn artist(id: &str, name: &str, genres: &[&str]) -> Value {
    json!({
        "id": id,
        "name": name,
        "genres": genres,
        "popularity": 70,
        "followers": { "href": null, "total": 1200 },
        "type": "artist"
    })
}

/// A track object as returned inside top tracks and playlist items.
pub fn track(id: &str, artists: &[(&str, &str)], duration_ms: u64, release_date: &str) -> Value {
    let artists: Vec<Value> = artists
        .iter()
        .map(|(name, id)| json!({ "name": name, "id": id, "type": "artist" }))
        .collect();
    json!({
        "id": id,
        "name": format!("Song {id}"),
        "artists": artists,
        "duration_ms": duration_ms,
        "explicit": false,
        "popularity": 42,
        "album": {
            "id": format!("album-{id}"),
            "name": format!("Album {id}"),
            "release_date": release_date,
            "type": "album"
        },
        "type": "track"
    })
}

/// A recently played entry wrapping `track`.
pub fn play(track: Value, played_at: &str) -> Value {
    json!({ "track": track, "played_at": played_at, "context": null })
}
