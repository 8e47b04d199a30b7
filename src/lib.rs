//! # Visibility Radar
//!
//! Measures how visible a brand is in the answers of a large language model, stage by
//! stage along a marketing funnel.
//!
//! ## How a run works
//!
//! 1. The model is asked for ten user-style questions about a product or category:
//!    2 top of funnel, 4 middle of funnel, 4 bottom of funnel, none naming a brand.
//! 2. The numbered list in the reply is parsed into a [`PromptList`].
//! 3. Each question is sent back to the model, one at a time, asking for an answer that
//!    names relevant brands, products or providers.
//! 4. Every answer is lower-cased and each brand (the user's brand plus up to three
//!    competitors) is credited once per answer whose text contains its name.
//!
//! Matching is plain case-insensitive substring containment, so a brand whose name is
//! part of another brand's name is credited whenever the longer name appears.
//!
//! ## Example
//!
//! ```rust,ignore
//! use visibility_radar::*;
//!
//! let config = RadarConfig::from_env()?;
//! let client = GeminiClient::new(config)?;
//! let request = FunnelRequest::new("Acme", "running shoes", ["NikeX", "Zeta"]);
//!
//! let report = VisibilityRadar::new(client).run(&request, None).await?;
//! print!("{}", report.render_chart());
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod extractor;
pub mod llm;
pub mod report;
pub mod schema;
pub mod tally;

pub use config::RadarConfig;
pub use error::{RadarError, Result};
pub use events::RadarEvent;
pub use extractor::extract_numbered_items;
pub use llm::{FunnelPromptGenerator, PromptLanguage, TextGenerator};
pub use report::{ReportRow, VisibilityReport};
pub use schema::*;
pub use tally::{mentions_brand, BrandCount, StageCounts, VisibilityTally, VisibilityTallier};

#[cfg(feature = "gemini")]
pub use llm::GeminiClient;

use log::info;
use tokio::sync::mpsc::Sender;

use crate::events::send_event;

/// Runs the whole funnel analysis against one text generator.
pub struct VisibilityRadar<G> {
    generator: G,
    language: PromptLanguage,
}

impl<G: TextGenerator> VisibilityRadar<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            language: PromptLanguage::default(),
        }
    }

    pub fn with_language(mut self, language: PromptLanguage) -> Self {
        self.language = language;
        self
    }

    /// Validates `request`, generates the funnel prompts and tallies brand mentions.
    ///
    /// Returns early, without asking any question, when the request is invalid or the
    /// model does not return exactly ten prompts. Failures of individual questions are
    /// kept in the report's answer records instead.
    pub async fn run(
        &self,
        request: &FunnelRequest,
        progress: Option<Sender<RadarEvent>>,
    ) -> Result<VisibilityReport> {
        request.validate()?;
        let brands = request.all_brands();

        info!(
            "Starting visibility run for '{}' ({} brands tracked)",
            request.brand,
            brands.len()
        );

        send_event(
            progress.as_ref(),
            RadarEvent::GeneratingPrompts {
                product: request.product.clone(),
            },
        )
        .await;

        let prompts = FunnelPromptGenerator::new(&self.generator)
            .with_language(self.language)
            .generate(&request.product)
            .await?;

        send_event(
            progress.as_ref(),
            RadarEvent::PromptsReady {
                count: prompts.len(),
            },
        )
        .await;

        let (tally, answers) = VisibilityTallier::new(&self.generator)
            .with_language(self.language)
            .tally(&prompts, &brands, progress.as_ref())
            .await;

        let failed = answers.iter().filter(|a| a.failed).count();
        send_event(
            progress.as_ref(),
            RadarEvent::Completed {
                answered: answers.len() - failed,
                failed,
            },
        )
        .await;

        Ok(VisibilityReport::new(
            request.clone(),
            self.generator.model_name(),
            prompts,
            tally,
            answers,
        ))
    }
}
