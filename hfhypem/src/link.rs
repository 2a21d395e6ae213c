//! Resolution URL derivation

use crate::models::TrackRecord;

/// Default hypem.com base URL
pub const DEFAULT_BASE_URL: &str = "http://hypem.com";

/// Path of the link resolution endpoint, relative to the base URL
pub const SERVE_SOURCE_PATH: &str = "/serve/source/";

/// Builds `/serve/source/{id}/{key}?_={ts}` URLs for tracks
///
/// Field contents are not validated: an empty id or key still yields a
/// well-formed URL, and the failure surfaces when the link is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDeriver {
    prefix: String,
}

impl Default for LinkDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl LinkDeriver {
    pub fn new(base_url: &str) -> Self {
        Self {
            prefix: format!("{}{}", base_url.trim_end_matches('/'), SERVE_SOURCE_PATH),
        }
    }

    pub fn derive(&self, track: &TrackRecord) -> String {
        format!(
            "{}{}/{}?_={}",
            self.prefix, track.id, track.key, track.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str, key: &str, timestamp: i64) -> TrackRecord {
        TrackRecord {
            id: id.to_string(),
            timestamp,
            post_id: 0,
            post_url: String::new(),
            key: key.to_string(),
            artist: String::new(),
            title: String::new(),
        }
    }

    #[test]
    fn test_derive() {
        let deriver = LinkDeriver::default();
        assert_eq!(
            deriver.derive(&track("abc", "xyz", 1000)),
            "http://hypem.com/serve/source/abc/xyz?_=1000"
        );
    }

    #[test]
    fn test_derive_is_deterministic() {
        let deriver = LinkDeriver::new("http://127.0.0.1:8080/");
        let t = track("2x8f5", "8c1f0e", 1496012345);
        assert_eq!(deriver.derive(&t), deriver.derive(&t.clone()));
        assert_eq!(
            deriver.derive(&t),
            "http://127.0.0.1:8080/serve/source/2x8f5/8c1f0e?_=1496012345"
        );
    }

    #[test]
    fn test_empty_fields_are_not_rejected() {
        let deriver = LinkDeriver::default();
        assert_eq!(
            deriver.derive(&track("", "", -5)),
            "http://hypem.com/serve/source//?_=-5"
        );
    }
}
