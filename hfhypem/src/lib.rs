//! Hype Machine feed library for HypeFeed
//!
//! This crate turns a hypem.com listing page into a JSON feed of
//! downloadable tracks.
//!
//! # Pipeline
//!
//! 1. **Fetch** the listing page with a session-authenticated client
//! 2. **Extract** the JSON embedded in its `displayList-data` script
//! 3. **Derive** a signed `/serve/source` URL for every track
//! 4. **Resolve** each URL, one request at a time, into a download link
//! 5. **Merge** tracks and links into [`OutputItem`]s
//!
//! # Example
//!
//! ```no_run
//! use hfhypem::{FeedAssembler, HypemClient, HypemSettings, SessionCookie};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = HypemSettings {
//!         session: Some(SessionCookie::new("AUTH", "03%3A...", "hypem.com")),
//!         ..HypemSettings::default()
//!     };
//!
//!     let client = HypemClient::from_settings(&settings)?;
//!     let report = FeedAssembler::from_settings(client, &settings)
//!         .assemble()
//!         .await?;
//!
//!     println!("{}", serde_json::to_string_pretty(&report.items)?);
//!     Ok(())
//! }
//! ```
//!
//! # Failure policy
//!
//! A track whose link cannot be resolved either fails the whole feed
//! ([`ResolutionPolicy::FailFast`], the default) or is left out and
//! reported ([`ResolutionPolicy::SkipFailed`]). Links are recorded by
//! track position, so a skipped track never shifts the links of the
//! tracks after it.

pub mod assembler;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod extractor;
pub mod link;
pub mod models;
pub mod resolver;

#[cfg(feature = "server")]
pub mod api_rest;
#[cfg(feature = "server")]
pub mod server_ext;
#[cfg(feature = "server")]
mod server_impl;

// Re-exports
pub use assembler::{decode_display_list, merge, FeedAssembler};
pub use client::{ClientBuilder, HypemClient, SessionCookie, Transport};
pub use config_ext::{HypemConfigExt, HypemSettings, ResolutionPolicy};
pub use error::{Error, ErrorKind, Result};
pub use extractor::{extract_embedded_json, extract_from_html, DISPLAY_LIST_MARKER};
pub use link::LinkDeriver;
pub use models::{
    DisplayList, FeedReport, OutputItem, ResolvedLink, ResolvedLinks, SkippedTrack, TrackRecord,
};
pub use resolver::{decode_link, resolve_link};

#[cfg(feature = "server")]
pub use server_ext::{HypemServerExt, HypemState};
