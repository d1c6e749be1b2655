//! # Parsers Module
//!
//! One pipeline per record type. Each turns a raw Spotify response into a
//! [`Table`] by flattening it with the record type's [`columns`] projection,
//! splitting list-valued cells and, for tracks, enriching the rows with audio
//! features and artist features.
//!
//! Steps that target a column the flattened table does not have are skipped.
//! Malformed values (timestamps, release dates, durations) become nulls for
//! the affected row only.

pub mod columns;

use serde_json::{Map, Value};

use crate::{
    Res,
    error::ExportError,
    spotify::SpotifyApi,
    table::{ColumnSpec, Table, enrich, flatten, split_primary_other, unfold_list_column},
    utils,
};

use columns::{
    ARTIST_ENRICHMENT, PLAYLISTS, SONGPLAYS, TOP_ARTISTS, TOP_TRACKS, TRACK_ENRICHMENT,
};

const RESULT_KEY: &str = "items";

/// Recently played tracks, enriched with audio and artist features.
///
/// # Arguments
///
/// * `api` - Used for the audio feature and artist lookups
/// * `data` - Body of `GET /me/player/recently-played`
///
/// # Returns
///
/// One row per play with `songplays_id` as its 1-based position, the played
/// at timestamp as `YYYY-MM-DD HH:MM:SS` (UTC), the duration in minutes, the
/// release year, the primary and other artists, the audio features and the
/// primary artist's popularity, followers and genres.
///
/// # Errors
///
/// [`ExportError::MissingField`] when the response no longer has the expected
/// shape, [`ExportError::Auth`] when the authorization is lost during
/// enrichment.
pub async fn parse_songplays<A: SpotifyApi>(api: &A, data: &Value) -> Res<Table> {
    parse_track_listing(api, data, &SONGPLAYS).await
}

/// Top tracks, enriched the same way as songplays.
pub async fn parse_top_tracks<A: SpotifyApi>(api: &A, data: &Value) -> Res<Table> {
    parse_track_listing(api, data, &TOP_TRACKS).await
}

pub fn parse_top_artists(data: &Value) -> Res<Table> {
    let mut table = flatten(data, &TOP_ARTISTS, Some(RESULT_KEY))?;
    unfold_list_column(&mut table, "artist_genres", "artist_genre");
    Ok(table)
}

pub fn parse_playlists(data: &Value) -> Res<Table> {
    flatten(data, &PLAYLISTS, Some(RESULT_KEY))
}

/// Tracks of one playlist, tagged with the playlist they came from.
///
/// Playlist items wrap the track object; the wrapper is removed before the
/// top-tracks pipeline runs. `data` itself is left untouched.
///
/// # Arguments
///
/// * `api` - Used for the audio feature and artist lookups
/// * `data` - Body of `GET /playlists/{id}/tracks`
/// * `playlist_id` - Written into the `playlist_id` column of every row
pub async fn parse_playlist_items<A: SpotifyApi>(
    api: &A,
    data: &Value,
    playlist_id: &str,
) -> Res<Table> {
    let items = data
        .get(RESULT_KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| ExportError::MissingField(RESULT_KEY.to_string()))?;

    let tracks: Vec<Value> = items
        .iter()
        .map(|item| item.get("track").cloned().unwrap_or(Value::Null))
        .collect();

    let mut unwrapped = Map::new();
    unwrapped.insert(RESULT_KEY.to_string(), Value::Array(tracks));

    let mut table = parse_top_tracks(api, &Value::Object(unwrapped)).await?;
    table.set_constant("playlist_id", Value::String(playlist_id.to_string()));
    Ok(table)
}

async fn parse_track_listing<A: SpotifyApi>(
    api: &A,
    data: &Value,
    spec: &ColumnSpec,
) -> Res<Table> {
    let mut table = flatten(data, spec, Some(RESULT_KEY))?;

    split_artists(&mut table);

    table.map_column("track_played_at", |v| {
        v.as_str()
            .and_then(utils::format_played_at)
            .map(Value::String)
            .unwrap_or(Value::Null)
    });
    table.map_column("track_duration", utils::ms_to_minutes);
    table.map_column("album_release_year", |v| {
        v.as_str()
            .and_then(utils::parse_release_year)
            .map(Value::from)
            .unwrap_or(Value::Null)
    });

    let table = enrich(api, table, &TRACK_ENRICHMENT).await?;
    let mut table = enrich(api, table, &ARTIST_ENRICHMENT).await?;

    unfold_list_column(&mut table, "artist_genres", "artist_genre");
    Ok(table)
}

/// Replaces the `artists` list with primary/other name and id columns.
fn split_artists(table: &mut Table) {
    let Some(values) = table.column("artists") else {
        return;
    };

    let mut names = Vec::with_capacity(values.len());
    let mut name_others = Vec::with_capacity(values.len());
    let mut ids = Vec::with_capacity(values.len());
    let mut id_others = Vec::with_capacity(values.len());

    for value in values {
        let artists = value.as_array().map(Vec::as_slice).unwrap_or(&[]);
        let field = |name: &str| -> Vec<Value> {
            artists
                .iter()
                .map(|a| a.get(name).cloned().unwrap_or(Value::Null))
                .collect()
        };

        let (name, others) = split_primary_other(&field("name"));
        names.push(name.unwrap_or(Value::Null));
        name_others.push(Value::String(others));

        let (id, others) = split_primary_other(&field("id"));
        ids.push(id.unwrap_or(Value::Null));
        id_others.push(Value::String(others));
    }

    table.add_column("artist_name", names);
    table.add_column("artist_name_others", name_others);
    table.add_column("artist_id", ids);
    table.add_column("artist_id_others", id_others);
    table.drop_column("artists");
}
