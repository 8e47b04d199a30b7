use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadarError {
    #[error("{0} is not set. Provide an API key before starting a run.")]
    MissingApiKey(String),

    #[error("Failed to initialise the model client: {0}")]
    ClientInit(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Expected {expected} prompts but found {found}. Check the raw model output.")]
    PromptCountMismatch {
        expected: usize,
        found: usize,
        raw_output: String,
    },

    #[error("Generation failed: {0}")]
    Generation(String),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RadarError {
    /// Raw model output attached to a prompt-count mismatch, for diagnostic display.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            RadarError::PromptCountMismatch { raw_output, .. } => Some(raw_output),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RadarError::MissingApiKey(_) | RadarError::ClientInit(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RadarError>;
