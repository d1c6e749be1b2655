//! # API Module
//!
//! HTTP endpoints of the short-lived local server used during authorization.
//!
//! - [`callback`] - receives Spotify's redirect after the user approved the
//!   requested scopes, verifies the `state` parameter and exchanges the
//!   authorization code for a token.
//!
//! The route is mounted on the path of the configured redirect URI by
//! [`crate::server::start_api_server`].

mod callback;

pub use callback::callback;
