//! Source path to column name projections for every record type.

use crate::table::{ColumnSpec, Enrichment, FeatureEndpoint};

pub const SONGPLAYS: ColumnSpec = ColumnSpec::new(&[
    ("index", "songplays_id"),
    ("track.id", "track_id"),
    ("track.name", "track_name"),
    ("track.artists", "artists"),
    ("track.duration_ms", "track_duration"),
    ("track.explicit", "track_is_explicit"),
    ("track.popularity", "track_popularity"),
    ("played_at", "track_played_at"),
    ("track.album.id", "album_id"),
    ("track.album.name", "album_name"),
    ("track.album.release_date", "album_release_year"),
    ("track.album.type", "album_type"),
])
.with_identity("track.id");

pub const TOP_TRACKS: ColumnSpec = ColumnSpec::new(&[
    ("index", "track_rank"),
    ("id", "track_id"),
    ("name", "track_name"),
    ("artists", "artists"),
    ("duration_ms", "track_duration"),
    ("explicit", "track_is_explicit"),
    ("popularity", "track_popularity"),
    ("album.id", "album_id"),
    ("album.name", "album_name"),
    ("album.release_date", "album_release_year"),
    ("album.type", "album_type"),
])
.with_identity("id");

pub const TOP_ARTISTS: ColumnSpec = ColumnSpec::new(&[
    ("index", "artist_rank"),
    ("id", "artist_id"),
    ("name", "artist_name"),
    ("genres", "artist_genres"),
    ("popularity", "artist_popularity"),
    ("followers.total", "artist_followers"),
])
.with_identity("id");

pub const PLAYLISTS: ColumnSpec = ColumnSpec::new(&[
    ("index", "playlist_rank"),
    ("id", "playlist_id"),
    ("name", "playlist_name"),
    ("tracks.total", "playlist_size"),
    ("public", "playlist_is_public"),
    ("collaborative", "playlist_is_collaborative"),
])
.with_identity("id");

pub const TRACK_FEATURES: ColumnSpec = ColumnSpec::new(&[
    ("id", "track_id"),
    ("danceability", "track_danceability"),
    ("energy", "track_energy"),
    ("key", "track_key"),
    ("loudness", "track_loudness"),
    ("mode", "track_mode"),
    ("speechiness", "track_speechiness"),
    ("acousticness", "track_acousticness"),
    ("instrumentalness", "track_instrumentalness"),
    ("liveness", "track_liveness"),
    ("valence", "track_valence"),
])
.with_identity("id");

pub const ARTIST_FEATURES: ColumnSpec = ColumnSpec::new(&[
    ("id", "artist_id"),
    ("genres", "artist_genres"),
    ("popularity", "artist_popularity"),
    ("followers.total", "artist_followers"),
])
.with_identity("id");

pub const TRACK_ENRICHMENT: Enrichment = Enrichment {
    key: "track_id",
    endpoint: FeatureEndpoint::AudioFeatures,
    columns: TRACK_FEATURES,
    result_key: Some("audio_features"),
};

pub const ARTIST_ENRICHMENT: Enrichment = Enrichment {
    key: "artist_id",
    endpoint: FeatureEndpoint::Artists,
    columns: ARTIST_FEATURES,
    result_key: Some("artists"),
};
