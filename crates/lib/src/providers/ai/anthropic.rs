use crate::{errors::SpotError, providers::ai::AiProvider};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

// --- Messages API request and response structures ---

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

// --- Anthropic Provider implementation ---

/// A provider for the Anthropic Messages API, or a gateway that fronts it.
#[derive(Clone, Debug)]
pub struct AnthropicProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl AnthropicProvider {
    /// Creates a new `AnthropicProvider` whose calls give up after `timeout`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, SpotError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(SpotError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, SpotError> {
        let request_body = MessagesRequest {
            model: &self.model,
            max_tokens,
            system: system_prompt,
            messages: vec![Message {
                role: "user",
                content: user_prompt,
            }],
        };

        let mut request_builder = self
            .client
            .post(&self.api_url)
            .header("anthropic-version", ANTHROPIC_VERSION);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.header("x-api-key", key);
        }

        debug!(model = %self.model, max_tokens, "--> Sending request to Anthropic");
        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(SpotError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpotError::AiApi(format!("{status}: {error_text}")));
        }

        let messages_response: MessagesResponse = response
            .json()
            .await
            .map_err(SpotError::AiDeserialization)?;

        Ok(messages_response
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .unwrap_or_default())
    }
}
