//! Chat completions client.

use crate::error::ExtractError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";

/// A single-prompt, single-reply language model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send `prompt` as one user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, ExtractError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client. An empty API key is rejected up front.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ExtractError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ExtractError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: model.into(),
            temperature: 0.0,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractError> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, chars = prompt.len(), "sending completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::LlmStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        first_content(parsed)
    }
}

fn first_content(response: ChatResponse) -> Result<String, ExtractError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ExtractError::EmptyReply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::StubServer;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_rejects_empty_key() {
        assert!(matches!(
            OpenAiClient::new("  ", DEFAULT_MODEL),
            Err(ExtractError::MissingApiKey)
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let client = OpenAiClient::new("sk-test", "gpt-4").unwrap();
        let body = serde_json::to_value(client.request_body("hello")).unwrap();
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OpenAiClient::new("sk-test", "gpt-4")
            .unwrap()
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn test_complete_sends_bearer_and_reads_first_choice() {
        let server = StubServer::start(|_| {
            (
                StatusCode::OK,
                json!({
                    "choices": [
                        { "index": 0, "message": { "content": "['1 Main St']" } },
                        { "index": 1, "message": { "content": "['ignored']" } }
                    ]
                }),
            )
        })
        .await;

        let client = OpenAiClient::new("sk-test", "gpt-4")
            .unwrap()
            .with_base_url(format!("{}/v1/", server.url()));
        let reply = client.complete("find the address").await.unwrap();
        assert_eq!(reply, "['1 Main St']");

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/v1/chat/completions");
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer sk-test"));
        assert_eq!(requests[0].body["messages"][0]["content"], "find the address");
        assert_eq!(requests[0].body["temperature"], 0.0);
    }

    #[tokio::test]
    async fn test_complete_maps_error_status() {
        let server = StubServer::start(|_| {
            (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": { "message": "rate limited" } }),
            )
        })
        .await;

        let client = OpenAiClient::new("sk-test", "gpt-4")
            .unwrap()
            .with_base_url(server.url());
        match client.complete("hello").await {
            Err(ExtractError::LlmStatus { status, body }) => {
                assert_eq!(status, 429);
                assert!(body.contains("rate limited"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_without_choices_is_empty_reply() {
        let server = StubServer::start(|_| (StatusCode::OK, json!({ "choices": [] }))).await;

        let client = OpenAiClient::new("sk-test", "gpt-4")
            .unwrap()
            .with_base_url(server.url());
        assert!(matches!(
            client.complete("hello").await,
            Err(ExtractError::EmptyReply)
        ));
    }

    #[test]
    fn test_first_content() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "['1 Main St']"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_content(response).unwrap(), "['1 Main St']");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_content(empty), Err(ExtractError::EmptyReply)));

        let null: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(first_content(null), Err(ExtractError::EmptyReply)));
    }
}
