//! # Spotify Integration Module
//!
//! The integration layer between the exporter and the Spotify Web API. It
//! handles authorization, token lifetime and the HTTP calls that produce
//! the raw JSON the table pipeline consumes.
//!
//! ## Architecture
//!
//! ```text
//! Export Layer (query kinds, CSV output)
//!          ↓
//! Table Pipeline (flatten, split, enrich)
//!          ↓
//! SpotifyApi trait
//!          ↓
//! SpotifyClient (reqwest, retry, timeout)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Modules
//!
//! ### Authentication
//!
//! [`auth`] - Authorization-code flow with client secret:
//! - **Token Reuse**: a cached token is used when it covers the requested scopes
//! - **Browser Integration**: the authorization page is opened automatically
//! - **Local Callback Server**: receives the redirect and exchanges the code
//! - **Refresh**: tokens are refreshed through the token endpoint
//!
//! ### Client
//!
//! [`SpotifyClient`] - one method per endpoint the export needs:
//! - `GET /me/player/recently-played`
//! - `GET /me/top/artists`, `GET /me/top/tracks`
//! - `GET /me/playlists`, `GET /playlists/{id}/tracks`
//! - `GET /audio-features`, `GET /artists` (batched by id)
//!
//! Every request carries a timeout. Connect errors, timeouts, HTTP 429 and
//! HTTP 5xx are retried once; a 429 waits for `Retry-After` when Spotify sends
//! one and it is at most two minutes.
//!
//! ## Error Types
//!
//! All functions return [`crate::Res`], failing with
//! [`crate::error::ExportError`].

pub mod auth;
mod client;

pub use client::{SpotifyApi, SpotifyClient};
