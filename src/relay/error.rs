use crate::types::ErrorResponse;
use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the single upstream chat-completion call
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("API returned status {status}")]
    Status { status: u16 },

    #[error("HTTP request failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response format")]
    InvalidFormat,

    #[error("Failed to parse response")]
    Parse,

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

impl UpstreamError {
    /// Classify a transport error, folding client-side timeouts into `Timeout`
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Http { source: error }
        }
    }
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Message is required")]
    MissingMessage,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Server configuration error")]
    MissingCredential,

    #[error("Internal server error")]
    Upstream(#[from] UpstreamError),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::MissingMessage => StatusCode::BAD_REQUEST,
            RelayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing envelope. Only upstream failures carry details.
    pub fn envelope(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.to_string());
        match self {
            RelayError::Upstream(source) => response.with_details(source.to_string()),
            _ => response,
        }
    }
}

pub type RelayOutcome<T> = Result<T, RelayError>;
