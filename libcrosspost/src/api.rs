//! Inbound HTTP surface.
//!
//! A deliberately small router: one dispatch endpoint plus a health probe.
//! Adapter outcomes and dispatch errors each carry their own HTTP status
//! mapping; this layer only translates.

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::dispatcher::PublishService;
use crate::types::Channel;

pub struct AppState {
    pub service: Arc<PublishService>,
    /// Static bearer token required on every dispatch request. An empty
    /// token rejects all requests; the server refuses to run open.
    pub api_token: String,
}

pub fn app(service: Arc<PublishService>, api_token: String) -> Router {
    let state = Arc::new(AppState { service, api_token });

    Router::new()
        .route("/publish", post(publish))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub schedule_id: String,
    pub channel: String,
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn publish(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> Response {
    if !authorized(&headers, &state.api_token) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid or missing bearer token");
    }

    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    let channel: Channel = match request.channel.parse() {
        Ok(c) => c,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
    };

    info!(schedule = %request.schedule_id, channel = %channel, "Dispatch requested");

    match state
        .service
        .publish("api", &request.schedule_id, channel)
        .await
    {
        Ok(result) => {
            let status = StatusCode::from_u16(result.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({ "data": result }))).into_response()
        }
        Err(e) => {
            let status =
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, &e.to_string())
        }
    }
}

fn authorized(headers: &HeaderMap, api_token: &str) -> bool {
    if api_token.is_empty() {
        return false;
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == api_token)
        .unwrap_or(false)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorized_accepts_matching_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer secret".parse().unwrap(),
        );
        assert!(authorized(&headers, "secret"));
    }

    #[test]
    fn test_authorized_rejects_wrong_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong".parse().unwrap(),
        );
        assert!(!authorized(&headers, "secret"));
    }

    #[test]
    fn test_authorized_rejects_missing_header() {
        assert!(!authorized(&HeaderMap::new(), "secret"));
    }

    #[test]
    fn test_empty_configured_token_rejects_everything() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer ".parse().unwrap(),
        );
        assert!(!authorized(&headers, ""));
    }

    #[test]
    fn test_authorized_requires_bearer_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Basic secret".parse().unwrap(),
        );
        assert!(!authorized(&headers, "secret"));
    }
}
