//! Implémentation du trait HypemServerExt pour hfserver::Server

use crate::api_rest::{create_router, get_feed};
use crate::config_ext::HypemSettings;
use crate::server_ext::{HypemServerExt, HypemState};
use anyhow::Result;
use hfserver::Server;
use std::sync::Arc;
use tracing::info;

impl HypemServerExt for Server {
    async fn init_hypem_feed(&mut self) -> Result<Arc<HypemState>> {
        let config = hfconfig::get_config();
        let settings = HypemSettings::from_config(&config)?;
        self.init_hypem_feed_with_settings(settings).await
    }

    async fn init_hypem_feed_with_settings(
        &mut self,
        settings: HypemSettings,
    ) -> Result<Arc<HypemState>> {
        info!(
            page = %settings.page_url,
            policy = %settings.policy,
            session = settings.session.is_some(),
            "Initializing hypem feed"
        );

        let state = HypemState::new(settings);

        self.add_router("/api/hypem", create_router(state.clone()))
            .await;
        self.add_fallback_with_state(get_feed, state.clone()).await;

        info!("Feed available at /api/hypem/feed and on any other path");

        Ok(Arc::new(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unreachable_upstream_is_a_structured_error() {
        let settings = HypemSettings {
            // nothing listens on port 1
            page_url: "http://127.0.0.1:1/latest/fresh".to_string(),
            ..HypemSettings::default()
        };

        let mut server = Server::new("Test", "localhost", 0);
        server.init_hypem_feed_with_settings(settings).await.unwrap();

        for path in ["/", "/api/hypem/feed", "/anything"] {
            let response = server
                .router()
                .await
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_GATEWAY, "path {}", path);
        }
    }

    #[tokio::test]
    async fn test_post_is_rejected_on_every_path() {
        let mut server = Server::new("Test", "localhost", 0);
        server
            .init_hypem_feed_with_settings(HypemSettings::default())
            .await
            .unwrap();

        for path in ["/", "/api/hypem/feed", "/anything"] {
            let response = server
                .router()
                .await
                .oneshot(Request::post(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "path {}", path);

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["error"], "method_not_allowed", "path {}", path);
        }
    }
}
