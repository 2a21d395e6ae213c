//! Feed assembly: page → track list → resolved links → feed items
//!
//! Everything runs sequentially. Links are requested one at a time in
//! track order, recorded by track position, and merged back by explicit
//! lookup.

use crate::client::Transport;
use crate::config_ext::{HypemSettings, ResolutionPolicy, DEFAULT_PAGE_URL};
use crate::error::{Error, Result};
use crate::extractor::{extract_from_html, DISPLAY_LIST_MARKER};
use crate::link::LinkDeriver;
use crate::models::{DisplayList, FeedReport, OutputItem, ResolvedLinks, SkippedTrack, TrackRecord};
use crate::resolver::resolve_link;
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Decodes the embedded `displayList-data` payload
pub fn decode_display_list(json: &str) -> Result<Vec<TrackRecord>> {
    let list: DisplayList =
        serde_json::from_str(json).map_err(|e| Error::decode("embedded track list", e))?;
    Ok(list.tracks)
}

/// Pairs every track with the link resolved for it
///
/// With `allow_missing`, tracks without a link are left out; otherwise a
/// missing link is an [`Error::Alignment`]. A link recorded for a position
/// past the end of the track list is always an alignment error.
pub fn merge(
    tracks: &[TrackRecord],
    links: &ResolvedLinks,
    allow_missing: bool,
) -> Result<Vec<OutputItem>> {
    let overflow = links.last_index().is_some_and(|last| last >= tracks.len());
    if overflow || (!allow_missing && links.len() != tracks.len()) {
        return Err(Error::Alignment {
            tracks: tracks.len(),
            links: links.len(),
        });
    }

    Ok(tracks
        .iter()
        .enumerate()
        .filter_map(|(index, track)| {
            links
                .get(index)
                .map(|link| OutputItem::from_parts(track, link))
        })
        .collect())
}

/// Drives one pipeline run over a [`Transport`]
///
/// # Example
///
/// ```no_run
/// use hfhypem::{FeedAssembler, HypemClient, HypemSettings};
///
/// # async fn example() -> hfhypem::Result<()> {
/// let settings = HypemSettings::default();
/// let client = HypemClient::from_settings(&settings)?;
/// let report = FeedAssembler::from_settings(client, &settings).assemble().await?;
/// for item in &report.items {
///     println!("{} - {}: {}", item.artist, item.title, item.download_url);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FeedAssembler<T> {
    transport: T,
    page_url: String,
    marker: String,
    deriver: LinkDeriver,
    policy: ResolutionPolicy,
    pipeline_timeout: Option<Duration>,
}

impl<T: Transport> FeedAssembler<T> {
    /// Assembler with hypem.com defaults and no deadline
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            page_url: DEFAULT_PAGE_URL.to_string(),
            marker: DISPLAY_LIST_MARKER.to_string(),
            deriver: LinkDeriver::default(),
            policy: ResolutionPolicy::default(),
            pipeline_timeout: None,
        }
    }

    pub fn from_settings(transport: T, settings: &HypemSettings) -> Self {
        Self::new(transport)
            .page_url(&settings.page_url)
            .marker(&settings.marker)
            .link_deriver(LinkDeriver::new(&settings.base_url))
            .policy(settings.policy)
            .pipeline_timeout(settings.pipeline_timeout)
    }

    pub fn page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = url.into();
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn link_deriver(mut self, deriver: LinkDeriver) -> Self {
        self.deriver = deriver;
        self
    }

    pub fn policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn pipeline_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pipeline_timeout = timeout;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs the whole pipeline once
    pub async fn assemble(&self) -> Result<FeedReport> {
        let deadline = self.pipeline_timeout.map(|t| Instant::now() + t);

        let tracks = within(deadline, self.fetch_tracks(), 0, 0).await?;
        info!(count = tracks.len(), page = %self.page_url, "Track list decoded");

        let (links, skipped) = self.resolve_all(&tracks, deadline).await?;
        let items = merge(&tracks, &links, self.policy == ResolutionPolicy::SkipFailed)?;

        Ok(FeedReport { items, skipped })
    }

    /// Fetches the listing page and decodes its embedded track list
    pub async fn fetch_tracks(&self) -> Result<Vec<TrackRecord>> {
        info!(url = %self.page_url, "Fetching listing page");
        let html = self.transport.get_text(&self.page_url).await?;

        let json = extract_from_html(&html, &self.marker);
        if json.is_empty() {
            return Err(Error::Extraction {
                marker: self.marker.clone(),
            });
        }

        decode_display_list(&json)
    }

    /// Resolves every track, strictly one after the other
    pub async fn resolve_all(
        &self,
        tracks: &[TrackRecord],
        deadline: Option<Instant>,
    ) -> Result<(ResolvedLinks, Vec<SkippedTrack>)> {
        let mut links = ResolvedLinks::new();
        let mut skipped = Vec::new();

        for (index, track) in tracks.iter().enumerate() {
            let url = self.deriver.derive(track);
            debug!(index, id = %track.id, %url, "Resolving track link");

            let resolved = within(
                deadline,
                resolve_link(&self.transport, &url),
                links.len(),
                tracks.len(),
            )
            .await;

            match resolved {
                Ok(link) => links.insert(index, link),
                Err(err @ Error::Timeout { .. }) => return Err(err),
                Err(err) => {
                    let err = err.for_track(index, &track.id);
                    match self.policy {
                        ResolutionPolicy::FailFast => return Err(err),
                        ResolutionPolicy::SkipFailed => {
                            warn!("Skipping {}", err);
                            skipped.push(SkippedTrack {
                                index,
                                id: track.id.clone(),
                                reason: err.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok((links, skipped))
    }
}

/// Runs `fut` against the optional deadline
async fn within<F, R>(deadline: Option<Instant>, fut: F, resolved: usize, total: usize) -> Result<R>
where
    F: Future<Output = Result<R>>,
{
    match deadline {
        Some(deadline) => timeout_at(deadline, fut)
            .await
            .map_err(|_| Error::Timeout { resolved, total })?,
        None => fut.await,
    }
}
