//! HTTP endpoint republishing the hypem feed
//!
//! `GET` on any path runs the pipeline and answers with the JSON array of
//! feed items. Failures answer with a non-200 status and a JSON body:
//!
//! ```json
//! {"error": "decode_error", "message": "track #3 (2x8f5): ...", "track": {"index": 3, "id": "2x8f5"}}
//! ```

use crate::assembler::FeedAssembler;
use crate::client::HypemClient;
use crate::error::{Error, ErrorKind};
use crate::server_ext::HypemState;
use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde_json::json;

/// Header carrying the number of tracks left out of a partial feed
pub const SKIPPED_TRACKS_HEADER: &str = "x-skipped-tracks";

// ============ Gestion des erreurs ============

pub struct AppError(Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Fetch | ErrorKind::Extraction | ErrorKind::Decode => StatusCode::BAD_GATEWAY,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Alignment | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "error": self.0.kind().as_str(),
            "message": self.0.to_string(),
        });
        if let Some((index, id)) = self.0.track() {
            body["track"] = json!({ "index": index, "id": id });
        }

        (status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

/// Crée le router de l'API hypem
pub fn create_router(state: HypemState) -> Router {
    Router::new()
        .route("/feed", any(get_feed))
        .with_state(state)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /api/hypem/feed, and GET on any path through the fallback
///
/// Each call builds its own client so concurrent feeds share no session
/// state.
pub async fn get_feed(State(state): State<HypemState>, method: Method) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({
                "error": "method_not_allowed",
                "message": format!("{} is not supported, use GET", method),
            })),
        )
            .into_response();
    }

    match build_feed(&state).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(kind = err.0.kind().as_str(), "Feed request failed: {}", err.0);
            err.into_response()
        }
    }
}

async fn build_feed(state: &HypemState) -> Result<Response, AppError> {
    let client = HypemClient::from_settings(&state.settings)?;
    let report = FeedAssembler::from_settings(client, &state.settings)
        .assemble()
        .await?;

    tracing::info!(
        items = report.items.len(),
        skipped = report.skipped.len(),
        "Feed assembled"
    );

    let skipped = report.skipped.len();
    let mut response = Json(report.items).into_response();
    if skipped > 0 {
        response
            .headers_mut()
            .insert(SKIPPED_TRACKS_HEADER, HeaderValue::from(skipped));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("nope").unwrap_err()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::Extraction { marker: "m".into() }, StatusCode::BAD_GATEWAY),
            (Error::decode("x", json_error()), StatusCode::BAD_GATEWAY),
            (
                Error::Alignment {
                    tracks: 2,
                    links: 1,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::Timeout {
                    resolved: 0,
                    total: 4,
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                Error::decode("x", json_error()).for_track(1, "id"),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError(err).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_error_body_names_the_track() {
        let response = AppError(Error::decode("link response", json_error()).for_track(2, "2x8f5"))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "decode_error");
        assert_eq!(body["track"]["index"], 2);
        assert_eq!(body["track"]["id"], "2x8f5");
        assert!(body["message"].as_str().unwrap().starts_with("track #2 (2x8f5)"));
    }
}
