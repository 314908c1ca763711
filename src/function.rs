//! Serverless function-invocation adapter.
//!
//! Hosting platforms deliver an event (`httpMethod`, `body`) and expect a
//! structured response (`statusCode`, `headers`, `body`). This module maps
//! between that convention and [`ChatRelay`].

use crate::relay::{ChatRelay, RelayError, RelayRequest, RelayResponse};
use axum::http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    pub http_method: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl From<RelayResponse> for FunctionResponse {
    fn from(response: RelayResponse) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        Self {
            status_code: response.status.as_u16(),
            headers,
            body: response.body,
        }
    }
}

/// Run one function event through the relay
pub async fn invoke(relay: &ChatRelay, event: FunctionEvent) -> FunctionResponse {
    let Ok(method) = Method::from_bytes(event.http_method.as_bytes()) else {
        warn!("Unrecognized HTTP method in event: {:?}", event.http_method);
        return RelayResponse::from(RelayError::MethodNotAllowed).into();
    };

    relay
        .handle(RelayRequest::new(method, event.body))
        .await
        .into()
}
