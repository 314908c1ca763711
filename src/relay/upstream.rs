use crate::config::UpstreamConfig;
use crate::relay::error::UpstreamError;
use crate::relay::prompt::SYSTEM_PROMPT;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tokio::time::timeout;
use tracing::{debug, warn};

/// One-shot chat completion against the upstream provider.
///
/// The relay holds this as `Arc<dyn ChatCompletion>` so tests can swap in a double.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send `message` behind the tutoring prompt and return the raw answer text
    async fn complete(&self, api_key: &SecretString, message: &str)
        -> Result<String, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct UpstreamChatClient {
    client: Client,
    config: UpstreamConfig,
}

impl UpstreamChatClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| UpstreamError::ClientBuild(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn build_request(&self, message: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(message)],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        }
    }

    async fn send(&self, api_key: &SecretString, message: &str) -> Result<String, UpstreamError> {
        let url = self.config.completions_url();
        let payload = self.build_request(message);

        debug!("Sending chat completion to {} with API key (redacted)", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(UpstreamError::from_transport)?;

        if status != StatusCode::OK {
            warn!("Upstream returned status {}", status);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        parse_completion(&body)
    }
}

#[async_trait]
impl ChatCompletion for UpstreamChatClient {
    async fn complete(
        &self,
        api_key: &SecretString,
        message: &str,
    ) -> Result<String, UpstreamError> {
        // The client timeout covers the transfer; this also bounds the body read
        match timeout(self.config.request_timeout(), self.send(api_key, message)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Upstream request exceeded {}ms, aborting",
                    self.config.request_timeout_ms
                );
                Err(UpstreamError::Timeout)
            }
        }
    }
}

/// Extract the first choice's content from a completion body
pub fn parse_completion(body: &[u8]) -> Result<String, UpstreamError> {
    let response: ChatCompletionResponse =
        serde_json::from_slice(body).map_err(|_| UpstreamError::Parse)?;
    response.first_content().ok_or(UpstreamError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config(base_url: &str, request_timeout_ms: u64) -> UpstreamConfig {
        UpstreamConfig {
            base_url: base_url.to_string(),
            request_timeout_ms,
            connect_timeout_ms: 1000,
            ..UpstreamConfig::default()
        }
    }

    fn test_key() -> SecretString {
        SecretString::new("sk-test-key".to_string())
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "model": "deepseek-chat",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    #[test]
    fn test_build_request() {
        let client = UpstreamChatClient::new(UpstreamConfig::default()).unwrap();
        let request = client.build_request("What does 'ubiquitous' mean?");

        assert_eq!(request.model, "deepseek-chat");
        assert_eq!(request.max_tokens, 1200);
        assert!(!request.stream);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.messages[1].content, "What does 'ubiquitous' mean?");
    }

    #[test]
    fn test_parse_completion() {
        let body = serde_json::to_vec(&completion("Hi there")).unwrap();
        assert_eq!(parse_completion(&body).unwrap(), "Hi there");

        assert!(matches!(
            parse_completion(b"<html>bad gateway</html>"),
            Err(UpstreamError::Parse)
        ));
        assert!(matches!(
            parse_completion(br#"{"choices": []}"#),
            Err(UpstreamError::InvalidFormat)
        ));
        assert!(matches!(
            parse_completion(br#"{"choices": [{"message": {"content": null}}]}"#),
            Err(UpstreamError::InvalidFormat)
        ));
    }

    #[tokio::test]
    async fn test_complete_sends_expected_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test-key"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({
                "model": "deepseek-chat",
                "max_tokens": 1200,
                "stream": false,
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": "Explain 'affect' vs 'effect'"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Answer")))
            .expect(1)
            .mount(&server)
            .await;

        let client = UpstreamChatClient::new(create_test_config(&server.uri(), 5000)).unwrap();
        let content = client
            .complete(&test_key(), "Explain 'affect' vs 'effect'")
            .await
            .unwrap();
        assert_eq!(content, "Answer");
    }

    #[tokio::test]
    async fn test_complete_non_ok_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Authentication Fails", "type": "authentication_error"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = UpstreamChatClient::new(create_test_config(&server.uri(), 5000)).unwrap();
        let error = client.complete(&test_key(), "hello").await.unwrap_err();
        assert!(matches!(error, UpstreamError::Status { status: 401 }));
        assert_eq!(error.to_string(), "API returned status 401");
    }

    #[tokio::test]
    async fn test_complete_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = UpstreamChatClient::new(create_test_config(&server.uri(), 5000)).unwrap();
        let error = client.complete(&test_key(), "hello").await.unwrap_err();
        assert!(matches!(error, UpstreamError::Parse));
    }

    #[tokio::test]
    async fn test_complete_missing_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x"})))
            .mount(&server)
            .await;

        let client = UpstreamChatClient::new(create_test_config(&server.uri(), 5000)).unwrap();
        let error = client.complete(&test_key(), "hello").await.unwrap_err();
        assert!(matches!(error, UpstreamError::InvalidFormat));
    }

    #[tokio::test]
    async fn test_complete_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("too late"))
                    .set_delay(Duration::from_millis(2000)),
            )
            .mount(&server)
            .await;

        let client = UpstreamChatClient::new(create_test_config(&server.uri(), 200)).unwrap();
        let error = client.complete(&test_key(), "hello").await.unwrap_err();
        assert!(matches!(error, UpstreamError::Timeout));
    }

    #[tokio::test]
    async fn test_complete_connection_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            UpstreamChatClient::new(create_test_config(&format!("http://{}", addr), 5000))
                .unwrap();
        let error = client.complete(&test_key(), "hello").await.unwrap_err();
        assert!(matches!(error, UpstreamError::Http { .. }));
        assert!(error.to_string().starts_with("HTTP request failed: "));
    }
}
