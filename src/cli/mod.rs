//! # CLI Module
//!
//! The command-line layer of spotdump. Each command loads the settings,
//! talks to the Spotify layer and reports progress with the crate's output
//! macros.
//!
//! ## Commands
//!
//! - [`auth`] - runs the authorization flow for every scope the exporter can
//!   need and caches the token
//! - [`export`] - fetches the selected query kinds, turns them into tables and
//!   writes one CSV file per table
//!
//! ## Error Handling
//!
//! Missing configuration and failed authorization end the program. A failure
//! while exporting one query kind is reported as a warning and the remaining
//! kinds are still exported; the final summary marks the failed kind.
//!
//! ## Usage Patterns
//!
//! ```bash
//! spotdump auth                                  # Authenticate with Spotify
//! spotdump export                                # Export everything to ./data
//! spotdump export --query top-tracks --time-range short-term
//! ```

mod auth;
mod export;

pub use auth::auth;
pub use export::ExportOptions;
pub use export::export;
