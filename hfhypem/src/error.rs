//! Error types for the Hype Machine feed pipeline

/// Result type alias for hypem operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building the feed
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed at the transport level
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The page carries no embedded track list
    #[error("no <script> marked {marker:?} found in the page")]
    Extraction { marker: String },

    /// JSON payload did not match the expected shape
    #[error("cannot decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Resolved links do not line up with the track list
    #[error("{links} resolved links for {tracks} tracks")]
    Alignment { tracks: usize, links: usize },

    /// Resolution failed for one track
    #[error("track #{index} ({id}): {source}")]
    TrackResolution {
        index: usize,
        id: String,
        #[source]
        source: Box<Error>,
    },

    /// The pipeline deadline elapsed
    #[error("feed timed out after resolving {resolved} of {total} tracks")]
    Timeout { resolved: usize, total: usize },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Configuration error (from hfconfig/anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

/// Coarse error classification, used for HTTP status mapping and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Extraction,
    Decode,
    Alignment,
    Timeout,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Fetch => "fetch_error",
            ErrorKind::Extraction => "extraction_error",
            ErrorKind::Decode => "decode_error",
            ErrorKind::Alignment => "alignment_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Config => "config_error",
        }
    }
}

impl Error {
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }

    /// Attach the failing track to a fetch or decode error
    pub fn for_track(self, index: usize, id: impl Into<String>) -> Self {
        Self::TrackResolution {
            index,
            id: id.into(),
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Fetch { .. } => ErrorKind::Fetch,
            Error::Extraction { .. } => ErrorKind::Extraction,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Alignment { .. } => ErrorKind::Alignment,
            Error::TrackResolution { source, .. } => source.kind(),
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::InvalidUrl(_) | Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Index and id of the track the error belongs to, if any
    pub fn track(&self) -> Option<(usize, &str)> {
        match self {
            Error::TrackResolution { index, id, .. } => Some((*index, id.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{").unwrap_err()
    }

    #[test]
    fn test_track_resolution_keeps_inner_kind() {
        let err = Error::decode("link response", json_error()).for_track(3, "2xyz");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.track(), Some((3, "2xyz")));
        assert!(err.to_string().starts_with("track #3 (2xyz): cannot decode link response"));
    }

    #[test]
    fn test_kind_names() {
        let err = Error::Alignment {
            tracks: 2,
            links: 1,
        };
        assert_eq!(err.kind().as_str(), "alignment_error");
        assert_eq!(err.track(), None);
        assert_eq!(err.to_string(), "1 resolved links for 2 tracks");
    }
}
