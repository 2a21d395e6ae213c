//! Per-track download link resolution

use crate::client::Transport;
use crate::error::{Error, Result};
use crate::models::ResolvedLink;

/// Decodes a `/serve/source` response body
pub fn decode_link(body: &str) -> Result<ResolvedLink> {
    serde_json::from_str(body).map_err(|e| Error::decode("link response", e))
}

/// Resolves one track link with a single GET
///
/// Transport failures surface as [`Error::Fetch`], unexpected bodies as
/// [`Error::Decode`]. Nothing is retried.
pub async fn resolve_link<T>(transport: &T, url: &str) -> Result<ResolvedLink>
where
    T: Transport + ?Sized,
{
    let body = transport.get_text(url).await?;
    decode_link(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;

    struct Canned(&'static str);

    #[async_trait]
    impl Transport for Canned {
        async fn get_text(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_decode_link() {
        let link = decode_link(r#"{"itemid":"2x8f5","type":"mp3","URL":"http://dl/a.mp3"}"#).unwrap();
        assert_eq!(link.url, "http://dl/a.mp3");
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let err = decode_link("<html>Not Found</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = decode_link(r#"[{"URL":"x"}]"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_decode_requires_url() {
        let err = decode_link(r#"{"type":"mp3"}"#).unwrap_err();
        assert!(err.to_string().contains("link response"));
    }

    #[tokio::test]
    async fn test_resolve_link() {
        let link = resolve_link(&Canned(r#"{"URL":"http://dl"}"#), "http://hypem.com/serve/source/1/k?_=5")
            .await
            .unwrap();
        assert_eq!(link.url, "http://dl");
    }
}
