use crate::relay::{ChatRelay, RelayError, RelayRequest, RelayResponse};
use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{Method, StatusCode},
    routing::{any, get},
    Router,
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Path the original serverless deployment exposed the function under
pub const FUNCTION_PATH: &str = "/.netlify/functions/chat";

pub fn create_router(
    relay: Arc<ChatRelay>,
    body_limit: usize,
    request_timeout: Duration,
) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // The relay answers every method itself (CORS preflight, 405s)
        .route("/", any(relay_handler))
        .route(FUNCTION_PATH, any(relay_handler))
        .with_state(relay)
        // Enforced by the body extractor so oversized posts still get an envelope
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> Result<&'static str, StatusCode> {
    Ok("OK")
}

async fn relay_handler(
    State(relay): State<Arc<ChatRelay>>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> RelayResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection)
            if method == Method::POST && rejection.status() == StatusCode::PAYLOAD_TOO_LARGE =>
        {
            return RelayError::PayloadTooLarge.into();
        }
        // Preflights and disallowed methods are answered regardless of the body
        Err(rejection) => {
            tracing::debug!("Discarding unreadable request body: {}", rejection);
            Bytes::new()
        }
    };

    // Non-UTF-8 bodies cannot hold a message; treat them like an absent body
    let body = std::str::from_utf8(&body)
        .ok()
        .filter(|body| !body.is_empty())
        .map(str::to_owned);

    relay.handle(RelayRequest::new(method, body)).await
}
