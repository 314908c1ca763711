use serde::{Deserialize, Serialize};

/// Successful relay payload returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelayResult {
    /// English portion of the tutor's answer
    pub text: String,
    /// Chinese translation portion
    pub translation: String,
    pub success: bool,
}

impl RelayResult {
    pub fn new(text: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translation: translation.into(),
            success: true,
        }
    }
}

/// Standard error response format
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
