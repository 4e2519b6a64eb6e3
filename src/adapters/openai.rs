use crate::domain::ports::DescriptionSource;
use crate::utils::error::{BotError, GenerationStage, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an advanced AI that generates image descriptions. \
Your descriptions will be used by another AI to create an image based on your prompt.";
/// Bluesky counts graphemes; chars are a close enough stand-in for prompts.
pub const MAX_POST_CHARS: usize = 300;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
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
    content: Option<String>,
}

/// Asks the chat completions API for an image description.
pub struct OpenAiDescriber {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
    prompt: String,
}

impl OpenAiDescriber {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            prompt: prompt.into(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }
}

#[async_trait]
impl DescriptionSource for OpenAiDescriber {
    async fn describe(&self) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &self.prompt,
                },
            ],
        };

        tracing::debug!("Requesting description from {} ({})", self.base_url, self.model);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::generation(GenerationStage::Description, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::generation(
                GenerationStage::Description,
                format!("HTTP {}: {}", status.as_u16(), body),
            ));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| BotError::generation(GenerationStage::Description, e.to_string()))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| BotError::generation(GenerationStage::Description, "empty completion"))?;

        Ok(truncate_description(&content, MAX_POST_CHARS))
    }
}

/// Shorten `text` to at most `limit` chars, ending on a sentence if possible.
///
/// Within the first `limit` chars, everything after the last `.` is dropped.
/// Without a `.`, the text is cut at the last space and a `.` is appended.
pub fn truncate_description(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let cut: String = text.chars().take(limit).collect();
    if let Some(idx) = cut.rfind('.') {
        return cut[..=idx].to_string();
    }

    // Leave room for the appended period.
    let head: String = cut.chars().take(limit.saturating_sub(1)).collect();
    let head = match head.rfind(' ') {
        Some(idx) => &head[..idx],
        None => head.as_str(),
    };
    format!("{}.", head.trim_end())
}
