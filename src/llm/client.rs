use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::config::RadarConfig;
use crate::error::{RadarError, Result};
use crate::llm::generator::TextGenerator;
use crate::llm::types::*;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Request URLs are stripped so nothing about the endpoint ends up in records or logs.
fn http_error(e: reqwest::Error) -> RadarError {
    RadarError::Http(e.without_url())
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: RadarConfig,
}

impl GeminiClient {
    pub fn new(config: RadarConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RadarError::ClientInit(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url(),
            self.config.model()
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_content(&self, prompt: &str) -> Result<String> {
        let payload = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
        };

        debug!("POST {} ({} prompt chars)", self.endpoint(), prompt.len());
        let res = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.config.api_key())
            .json(&payload)
            .send()
            .await
            .map_err(http_error)?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await.map_err(http_error)?;
            return Err(RadarError::Generation(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await.map_err(http_error)?;
        response_text(body)
    }

    fn model_name(&self) -> &str {
        self.config.model()
    }
}

/// Joins the text parts of the first candidate.
pub(crate) fn response_text(body: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(RadarError::Generation(format!(
            "Prompt was blocked: {}",
            reason
        )));
    }

    let candidate = body
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| RadarError::Generation("No candidates returned".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(RadarError::Generation(format!(
            "Model returned no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(text)
}
