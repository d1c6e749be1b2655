//! The closed set of exports the tool knows about.
//!
//! Each [`QueryKind`] names its Spotify endpoint, the OAuth scope it needs,
//! the CSV file it produces and the parser that turns the response into a
//! table. [`QueryKind::ALL`] is the read-only registry iterated by the export
//! command.

use clap::ValueEnum;
use serde_json::Value;

use crate::{
    Res,
    error::ExportError,
    info, parsers,
    spotify::SpotifyApi,
    table::{Table, cell_text},
    types::TimeRange,
    warning,
};

/// Spotify caps playlist item pages at 100 entries.
pub const PLAYLIST_ITEMS_LIMIT: u32 = 100;
pub const PLAYLIST_ITEMS_FILE: &str = "playlist_items.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum QueryKind {
    TopArtists,
    RecentlyPlayed,
    TopTracks,
    Playlists,
}

impl QueryKind {
    pub const ALL: [QueryKind; 4] = [
        QueryKind::TopArtists,
        QueryKind::RecentlyPlayed,
        QueryKind::TopTracks,
        QueryKind::Playlists,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QueryKind::TopArtists => "current_user_top_artists",
            QueryKind::RecentlyPlayed => "current_user_recently_played",
            QueryKind::TopTracks => "current_user_top_tracks",
            QueryKind::Playlists => "current_user_playlists",
        }
    }

    pub fn scope(&self) -> &'static str {
        match self {
            QueryKind::TopArtists | QueryKind::TopTracks => "user-top-read",
            QueryKind::RecentlyPlayed => "user-read-recently-played",
            QueryKind::Playlists => "playlist-read-private",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name())
    }

    /// Fetches and parses this kind.
    ///
    /// # Arguments
    ///
    /// * `api` - Spotify endpoint implementation
    /// * `limit` - Number of items requested from the kind's endpoint (1-50)
    /// * `time_range` - Period for top artists and top tracks; ignored otherwise
    ///
    /// # Returns
    ///
    /// One [`QueryOutput`] per file to write. Playlists add a second output
    /// with the items of every playlist, unless no playlist had any items.
    ///
    /// # Errors
    ///
    /// Fails when the kind's own request fails, when its response changed
    /// shape, or with [`ExportError::Auth`] from any request made on its
    /// behalf. Failures of single playlists or feature chunks are only
    /// reported.
    ///
    /// # Example
    ///
    /// ```
    /// let outputs = QueryKind::TopTracks
    ///     .collect(&client, 50, TimeRange::ShortTerm)
    ///     .await?;
    /// ```
    pub async fn collect<A: SpotifyApi>(
        &self,
        api: &A,
        limit: u32,
        time_range: TimeRange,
    ) -> Res<Vec<QueryOutput>> {
        let output = |file_name: String, table: Table| QueryOutput { file_name, table };

        match self {
            QueryKind::RecentlyPlayed => {
                let data = api.recently_played(limit).await?;
                let table = parsers::parse_songplays(api, &data).await?;
                Ok(vec![output(self.file_name(), table)])
            }
            QueryKind::TopArtists => {
                let data = api.top_artists(limit, time_range).await?;
                let table = parsers::parse_top_artists(&data)?;
                Ok(vec![output(self.file_name(), table)])
            }
            QueryKind::TopTracks => {
                let data = api.top_tracks(limit, time_range).await?;
                let table = parsers::parse_top_tracks(api, &data).await?;
                Ok(vec![output(self.file_name(), table)])
            }
            QueryKind::Playlists => {
                let data = api.playlists(limit).await?;
                let playlists = parsers::parse_playlists(&data)?;
                let items = collect_playlist_items(api, &playlists).await?;

                let mut outputs = vec![output(self.file_name(), playlists)];
                if items.columns().is_empty() {
                    info!("No playlist items found, skipping {}", PLAYLIST_ITEMS_FILE);
                } else {
                    outputs.push(output(PLAYLIST_ITEMS_FILE.to_string(), items));
                }
                Ok(outputs)
            }
        }
    }
}

/// A table ready to be written under `file_name`.
#[derive(Debug, Clone)]
pub struct QueryOutput {
    pub file_name: String,
    pub table: Table,
}

/// Space-joined union of the scopes the given kinds need.
pub fn required_scopes(kinds: &[QueryKind]) -> String {
    let mut scopes: Vec<&str> = Vec::new();
    for kind in kinds {
        if !scopes.contains(&kind.scope()) {
            scopes.push(kind.scope());
        }
    }
    scopes.join(" ")
}

/// Items of every playlist in `playlists`. A playlist whose items cannot be
/// fetched or parsed is reported and left out; a lost authorization is not.
async fn collect_playlist_items<A: SpotifyApi>(api: &A, playlists: &Table) -> Res<Table> {
    let ids: Vec<String> = playlists
        .column("playlist_id")
        .unwrap_or_default()
        .into_iter()
        .filter(|v| !v.is_null())
        .map(cell_text)
        .collect();

    let mut tables = Vec::new();
    for playlist_id in ids {
        let data = match api.playlist_items(&playlist_id, PLAYLIST_ITEMS_LIMIT).await {
            Ok(data) => data,
            Err(e @ ExportError::Auth(_)) => return Err(e),
            Err(e) => {
                warning!("Failed to fetch items of playlist {}: {}", playlist_id, e);
                continue;
            }
        };

        let is_empty = data
            .get("items")
            .and_then(Value::as_array)
            .is_none_or(|items| items.is_empty());
        if is_empty {
            continue;
        }

        match parsers::parse_playlist_items(api, &data, &playlist_id).await {
            Ok(table) => tables.push(table),
            Err(e @ ExportError::Auth(_)) => return Err(e),
            Err(e) => warning!("Failed to parse items of playlist {}: {}", playlist_id, e),
        }
    }

    Ok(Table::concat(tables))
}
