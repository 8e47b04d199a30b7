use async_trait::async_trait;

use crate::error::Result;

/// Anything that turns a prompt into model text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a single prompt and return its text.
    async fn generate_content(&self, prompt: &str) -> Result<String>;

    /// Model identifier, reported alongside results.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    async fn generate_content(&self, prompt: &str) -> Result<String> {
        (**self).generate_content(prompt).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
