/// Hosted language model client
///
/// Speaks the OpenAI-compatible chat completions protocol. Quota failures are
/// surfaced as distinct errors so callers can tell the user what happened:
/// HTTP 429 becomes `RateLimited`, HTTP 402 becomes `PaymentRequired`.
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Runs one system + user exchange and returns the assistant text
    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct ChatCompletionsClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.8,
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(model = %self.model, "Language model rate limited");
            return Err(AppError::RateLimited(
                "Too many requests, please try again in a moment".to_string(),
            ));
        }
        if status == StatusCode::PAYMENT_REQUIRED {
            tracing::warn!(model = %self.model, "Language model credits exhausted");
            return Err(AppError::PaymentRequired(
                "AI credits exhausted, please add funds to continue".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Language model request failed");
            return Err(AppError::ExternalApi(format!(
                "Language model returned status {}",
                status
            )));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Parse("Language model returned no content".to_string()))?;

        tracing::debug!(model = %self.model, chars = content.len(), "Completion received");

        Ok(content)
    }

    fn name(&self) -> &'static str {
        "chat-completions"
    }
}
