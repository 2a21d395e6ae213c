//! Data models for hypem.com payloads and the published feed
//!
//! The page payload and the link response keep the upstream field names
//! through serde renames; the feed items use the names existing
//! consumers of the endpoint expect.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Page payload
// ============================================================================

/// The `displayList-data` object embedded in a listing page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayList {
    /// Tracks, in page order
    pub tracks: Vec<TrackRecord>,
}

/// One song entry of the page payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackRecord {
    /// Opaque hypem item id (e.g. "2x8f5")
    pub id: String,
    /// Signing timestamp, only used to build the resolution URL
    #[serde(rename = "ts")]
    pub timestamp: i64,
    #[serde(rename = "postid", default)]
    pub post_id: i64,
    /// Blog post the track was found on
    #[serde(rename = "posturl", default)]
    pub post_url: String,
    /// Opaque signing token
    pub key: String,
    #[serde(default)]
    pub artist: String,
    #[serde(rename = "song", default)]
    pub title: String,
}

// ============================================================================
// Link resolution
// ============================================================================

/// Response of `/serve/source/{id}/{key}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedLink {
    #[serde(rename = "URL", alias = "url")]
    pub url: String,
}

/// Links resolved during one pipeline run, keyed by track position
///
/// Keying by position instead of pushing into a parallel vector means a
/// skipped or failed track leaves a hole that the merge can see, rather
/// than shifting every later link onto the wrong track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLinks {
    links: BTreeMap<usize, ResolvedLink>,
}

impl ResolvedLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, link: ResolvedLink) {
        self.links.insert(index, link);
    }

    pub fn get(&self, index: usize) -> Option<&ResolvedLink> {
        self.links.get(&index)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Highest track position holding a link
    pub fn last_index(&self) -> Option<usize> {
        self.links.keys().next_back().copied()
    }
}

// ============================================================================
// Published feed
// ============================================================================

/// One entry of the JSON array served by the feed endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputItem {
    #[serde(rename = "Artist")]
    pub artist: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "DownloadURL")]
    pub download_url: String,
    #[serde(rename = "OriginalURL")]
    pub original_url: String,
}

impl OutputItem {
    pub fn from_parts(track: &TrackRecord, link: &ResolvedLink) -> Self {
        Self {
            artist: track.artist.clone(),
            title: track.title.clone(),
            download_url: link.url.clone(),
            original_url: track.post_url.clone(),
        }
    }
}

/// A track left out of the feed under the `skip_failed` policy
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedTrack {
    pub index: usize,
    pub id: String,
    pub reason: String,
}

/// Result of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedReport {
    pub items: Vec<OutputItem>,
    pub skipped: Vec<SkippedTrack>,
}

impl FeedReport {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}
