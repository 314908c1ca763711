use crate::config::{load_api_key, Config};
use crate::relay::error::{RelayError, RelayOutcome};
use crate::relay::splitter::split_response;
use crate::relay::upstream::{ChatCompletion, UpstreamChatClient};
use crate::types::RelayResult;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use secrecy::SecretString;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

const SERIALIZATION_FAILURE_BODY: &str = r#"{"success":false,"error":"Internal server error"}"#;

/// Host-independent view of an inbound invocation
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub method: Method,
    pub body: Option<String>,
}

impl RelayRequest {
    pub fn new(method: Method, body: Option<String>) -> Self {
        Self { method, body }
    }

    pub fn post(body: impl Into<String>) -> Self {
        Self::new(Method::POST, Some(body.into()))
    }
}

/// Status, headers and a fully-rendered body
#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RelayResponse {
    fn preflight() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));

        Self {
            status: StatusCode::OK,
            headers,
            body: String::new(),
        }
    }

    fn json<T: Serialize>(status: StatusCode, payload: &T) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

        match serde_json::to_string(payload) {
            Ok(body) => Self {
                status,
                headers,
                body,
            },
            Err(e) => {
                error!("Failed to serialize response body: {}", e);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    headers,
                    body: SERIALIZATION_FAILURE_BODY.to_string(),
                }
            }
        }
    }
}

impl From<RelayError> for RelayResponse {
    fn from(err: RelayError) -> Self {
        let status = err.status_code();
        match &err {
            RelayError::Upstream(source) => {
                error!("Upstream call failed: {} (status: {})", source, status)
            }
            _ if status.is_server_error() => error!("Chat relay error: {} (status: {})", err, status),
            _ => info!("Rejected request: {} (status: {})", err, status),
        }

        RelayResponse::json(status, &err.envelope())
    }
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        // Built by hand so an empty preflight body gets no implied content type
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Validates inbound chat messages and relays them to the tutoring model
pub struct ChatRelay {
    upstream: Arc<dyn ChatCompletion>,
    api_key: Option<SecretString>,
    api_key_env: String,
}

impl fmt::Debug for ChatRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatRelay")
            .field("api_key_configured", &self.api_key.is_some())
            .field("api_key_env", &self.api_key_env)
            .finish_non_exhaustive()
    }
}

impl ChatRelay {
    pub fn new(
        upstream: Arc<dyn ChatCompletion>,
        api_key: Option<SecretString>,
        api_key_env: impl Into<String>,
    ) -> Self {
        Self {
            upstream,
            api_key,
            api_key_env: api_key_env.into(),
        }
    }

    /// Build the relay from configuration, reading the API key from the environment
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let upstream = UpstreamChatClient::new(config.upstream.clone())?;
        let api_key = load_api_key(&config.upstream.api_key_env);
        if api_key.is_none() {
            error!(
                "{} not set in environment variables; chat requests will fail",
                config.upstream.api_key_env
            );
        }

        Ok(Self::new(
            Arc::new(upstream),
            api_key,
            config.upstream.api_key_env.clone(),
        ))
    }

    /// Handle one invocation. Never fails: every error becomes an envelope.
    pub async fn handle(&self, request: RelayRequest) -> RelayResponse {
        let span = info_span!(
            "chat_relay",
            invocation_id = %Uuid::new_v4(),
            method = %request.method
        );

        async move {
            info!("Chat relay invoked");

            match request.method {
                Method::OPTIONS => RelayResponse::preflight(),
                Method::POST => match self.relay(request.body.as_deref()).await {
                    Ok(result) => RelayResponse::json(StatusCode::OK, &result),
                    Err(err) => err.into(),
                },
                _ => RelayError::MethodNotAllowed.into(),
            }
        }
        .instrument(span)
        .await
    }

    async fn relay(&self, body: Option<&str>) -> RelayOutcome<RelayResult> {
        let message = extract_message(body).ok_or(RelayError::MissingMessage)?;

        let Some(api_key) = self.api_key.as_ref() else {
            error!("{} not set in environment variables", self.api_key_env);
            return Err(RelayError::MissingCredential);
        };

        let content = self.upstream.complete(api_key, &message).await?;
        let split = split_response(&content);

        Ok(RelayResult::new(split.english, split.translation))
    }
}

/// Pull a trimmed, non-empty `message` string out of a JSON body.
///
/// Absent or malformed bodies read as `{}`.
pub fn extract_message(body: Option<&str>) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.unwrap_or("{}")).ok()?;
    let message = value.get("message")?.as_str()?.trim();
    (!message.is_empty()).then(|| message.to_string())
}
