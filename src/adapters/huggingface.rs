use crate::domain::ports::ImageSource;
use crate::utils::error::{BotError, GenerationStage, Result};
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;

pub const DEFAULT_HF_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_HF_MODEL: &str = "Corcelio/mobius";

/// Text-to-image through the Hugging Face inference API.
pub struct HuggingFaceImageGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HuggingFaceImageGenerator {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: DEFAULT_HF_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }
}

#[async_trait]
impl ImageSource for HuggingFaceImageGenerator {
    async fn generate(&self, description: &str) -> Result<DynamicImage> {
        tracing::debug!("Requesting image from {}", self.endpoint());
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "inputs": description,
                "options": {"wait_for_model": true},
            }))
            .send()
            .await
            .map_err(|e| BotError::generation(GenerationStage::Image, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::generation(
                GenerationStage::Image,
                format!("HTTP {}: {}", status.as_u16(), body),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BotError::generation(GenerationStage::Image, e.to_string()))?;
        let image = image::load_from_memory(&bytes)?;
        tracing::info!("Generated {}x{} image", image.width(), image.height());
        Ok(image)
    }
}
