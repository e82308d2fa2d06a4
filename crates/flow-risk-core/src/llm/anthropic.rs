use super::{LlmClient, LlmSettings};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: Client,
    url: String,
    api_key: String,
    model: String,
    api_version: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            bail!("Anthropic API key must be provided via INPUT_API_KEY");
        }
        let url = format!("{}/v1/messages", settings.endpoint.trim_end_matches('/'));
        let http = Client::builder()
            .user_agent(concat!("flow-risk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build Anthropic HTTP client")?;
        Ok(Self {
            http,
            url,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            api_version: settings.api_version.clone(),
            max_tokens: settings.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let payload = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&payload)
            .send()
            .await
            .context("failed to call Anthropic messages API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Anthropic API error ({}): {}", status, body);
        }

        let message: AnthropicResponse = response
            .json()
            .await
            .context("failed to parse Anthropic response")?;
        let text = message
            .content
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            tracing::warn!("Anthropic response did not include any text content");
        }
        Ok(text)
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn base_settings(url: String) -> LlmSettings {
        LlmSettings {
            endpoint: url,
            model: "claude-test".into(),
            ..LlmSettings::with_api_key("test-key")
        }
    }

    #[test]
    fn requires_api_key() {
        let err = AnthropicClient::new(&LlmSettings::with_api_key("  ")).unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn builds_messages_url_from_endpoint() {
        let client = AnthropicClient::new(&base_settings("https://example.com/".into())).unwrap();
        assert_eq!(client.url, "https://example.com/v1/messages");
        assert_eq!(client.model(), "claude-test");
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn complete_returns_joined_text() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "test-key")
                .header("anthropic-version", "2023-06-01")
                .json_body(serde_json::json!({
                    "model": "claude-test",
                    "max_tokens": 1024,
                    "messages": [{"role": "user", "content": "hello"}]
                }));
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"content":[{"type":"text","text":"{\"risks\":"},{"type":"text","text":"[]}"}]}"#);
        });

        let client = AnthropicClient::new(&base_settings(server.base_url())).unwrap();
        let reply = client.complete("hello").await.unwrap();
        assert_eq!(reply, r#"{"risks":[]}"#);
        mock.assert();
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn non_success_status_is_fatal_without_retry() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(401).body("invalid x-api-key");
        });

        let client = AnthropicClient::new(&base_settings(server.base_url())).unwrap();
        let err = client.complete("hello").await.unwrap_err();
        assert!(err.to_string().contains("Anthropic API error (401"));
        assert!(err.to_string().contains("invalid x-api-key"));
        mock.assert_hits(1);
    }
}
