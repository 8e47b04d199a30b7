use log::{debug, info, warn};

use crate::error::{RadarError, Result};
use crate::extractor::extract_numbered_items;
use crate::llm::generator::TextGenerator;
use crate::llm::prompts::{funnel_prompt, PromptLanguage};
use crate::schema::{PromptList, PROMPT_COUNT};

pub struct FunnelPromptGenerator<'a, G: TextGenerator + ?Sized> {
    generator: &'a G,
    language: PromptLanguage,
}

impl<'a, G: TextGenerator + ?Sized> FunnelPromptGenerator<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self {
            generator,
            language: PromptLanguage::default(),
        }
    }

    pub fn with_language(mut self, language: PromptLanguage) -> Self {
        self.language = language;
        self
    }

    /// Asks the model for the ten funnel questions about `product`.
    ///
    /// Fails with [`RadarError::PromptCountMismatch`] when the answer does not contain
    /// exactly ten numbered items; the error keeps the raw answer for inspection.
    pub async fn generate(&self, product: &str) -> Result<PromptList> {
        if product.trim().is_empty() {
            return Err(RadarError::InvalidRequest(
                "product/category must not be empty".to_string(),
            ));
        }

        info!(
            "Generating funnel prompts for '{}' with {}",
            product.trim(),
            self.generator.model_name()
        );
        let meta_prompt = funnel_prompt(product, self.language);
        let response = self.generator.generate_content(&meta_prompt).await?;
        let raw = response.trim();
        debug!("Funnel prompt response:\n{}", raw);

        let prompts = extract_numbered_items(raw);
        let found = prompts.len();
        PromptList::new(prompts, raw).map_err(|e| {
            warn!("Expected {} funnel prompts, extracted {}", PROMPT_COUNT, found);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedGenerator {
        reply: String,
        seen: Mutex<Vec<String>>,
    }

    impl CannedGenerator {
        fn new(reply: impl Into<String>) -> Self {
            Self {
                reply: reply.into(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate_content(&self, prompt: &str) -> Result<String> {
            self.seen.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn numbered(n: usize) -> String {
        let mut text = String::from("Sure! Here are the prompts:\n\n");
        for i in 1..=n {
            text.push_str(&format!("{}. Question about running shoes {}\n", i, i));
        }
        text
    }

    #[tokio::test]
    async fn test_generates_ten_prompts() {
        let generator = CannedGenerator::new(numbered(10));
        let prompts = FunnelPromptGenerator::new(&generator)
            .generate("running shoes")
            .await
            .unwrap();

        assert_eq!(prompts.len(), 10);
        assert_eq!(prompts.as_slice()[0], "Question about running shoes 1");

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("running shoes"));
    }

    #[tokio::test]
    async fn test_mismatch_carries_trimmed_raw_output() {
        let generator = CannedGenerator::new(format!("\n{}\n", numbered(7)));
        let err = FunnelPromptGenerator::new(&generator)
            .generate("running shoes")
            .await
            .unwrap_err();

        match err {
            RadarError::PromptCountMismatch {
                expected,
                found,
                raw_output,
            } => {
                assert_eq!(expected, 10);
                assert_eq!(found, 7);
                assert!(raw_output.starts_with("Sure!"));
                assert!(raw_output.ends_with("running shoes 7"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_german_meta_prompt_is_sent() {
        let generator = CannedGenerator::new(numbered(10));
        FunnelPromptGenerator::new(&generator)
            .with_language(PromptLanguage::De)
            .generate("Laufschuhe")
            .await
            .unwrap();

        let seen = generator.seen.lock().unwrap();
        assert!(seen[0].contains("nummerierte Liste"));
    }

    #[tokio::test]
    async fn test_blank_product_is_rejected_before_calling_model() {
        let generator = CannedGenerator::new(numbered(10));
        let err = FunnelPromptGenerator::new(&generator)
            .generate("   ")
            .await
            .unwrap_err();

        assert!(matches!(err, RadarError::InvalidRequest(_)));
        assert!(generator.seen.lock().unwrap().is_empty());
    }
}
