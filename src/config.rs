use std::fmt;

use crate::error::{RadarError, Result};

pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Process-wide settings, built once at startup and never changed afterwards.
#[derive(Clone)]
pub struct RadarConfig {
    api_key: String,
    model: String,
    base_url: String,
}

impl RadarConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RadarError::MissingApiKey(API_KEY_VAR.to_string()));
        }
        let model = model.into();
        let model = if model.trim().is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            model.trim().to_string()
        };
        Ok(Self {
            api_key: api_key.trim().to_string(),
            model,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Reads `GOOGLE_API_KEY` (required) and `GEMINI_MODEL` (optional).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| RadarError::MissingApiKey(API_KEY_VAR.to_string()))?;
        let model = std::env::var(MODEL_VAR).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(api_key, model)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl fmt::Debug for RadarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadarConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
