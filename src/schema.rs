use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RadarError, Result};

/// Number of prompts a funnel run works with.
pub const PROMPT_COUNT: usize = 10;

pub const MAX_COMPETITORS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    /// Users inform themselves about the topic in general.
    Top,
    /// Users compare options and look for recommendations.
    Middle,
    /// Users are ready to buy.
    Bottom,
}

impl FunnelStage {
    pub const ALL: [FunnelStage; 3] = [FunnelStage::Top, FunnelStage::Middle, FunnelStage::Bottom];

    /// How many of the generated prompts belong to this stage.
    pub fn prompt_quota(self) -> usize {
        match self {
            FunnelStage::Top => 2,
            FunnelStage::Middle => 4,
            FunnelStage::Bottom => 4,
        }
    }

    /// Stage of the prompt at `index` in a generated list.
    ///
    /// The list is ordered top, middle, bottom following the quotas; positions past
    /// the last quota are treated as bottom of funnel.
    pub fn for_position(index: usize) -> Self {
        let mut upper = 0;
        for stage in Self::ALL {
            upper += stage.prompt_quota();
            if index < upper {
                return stage;
            }
        }
        FunnelStage::Bottom
    }

    pub fn label(self) -> &'static str {
        match self {
            FunnelStage::Top => "Top of Funnel",
            FunnelStage::Middle => "Middle of Funnel",
            FunnelStage::Bottom => "Bottom of Funnel",
        }
    }
}

impl fmt::Display for FunnelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a user asks the radar to measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelRequest {
    pub brand: String,
    pub product: String,
    #[serde(default)]
    pub competitors: Vec<String>,
}

impl FunnelRequest {
    pub fn new(
        brand: impl Into<String>,
        product: impl Into<String>,
        competitors: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            brand: brand.into(),
            product: product.into(),
            competitors: competitors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.brand.trim().is_empty() || self.product.trim().is_empty() {
            return Err(RadarError::InvalidRequest(
                "brand and product/category are both required".to_string(),
            ));
        }
        let competitors = self.named_competitors().count();
        if competitors > MAX_COMPETITORS {
            return Err(RadarError::InvalidRequest(format!(
                "at most {} competitors are supported, got {}",
                MAX_COMPETITORS, competitors
            )));
        }
        Ok(())
    }

    fn named_competitors(&self) -> impl Iterator<Item = &String> {
        self.competitors.iter().filter(|c| !c.trim().is_empty())
    }

    /// The brand followed by every non-empty competitor, in input order.
    ///
    /// Whitespace-only competitors count as empty and are dropped too.
    /// Duplicates are kept; each occurrence gets its own counter.
    pub fn all_brands(&self) -> Vec<String> {
        std::iter::once(self.brand.clone())
            .chain(self.named_competitors().cloned())
            .collect()
    }
}

/// Exactly [`PROMPT_COUNT`] generated questions, ordered by funnel stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptList(Vec<String>);

impl PromptList {
    /// Accepts `prompts` only if there are exactly [`PROMPT_COUNT`] of them.
    /// `raw_output` is kept in the error so callers can show what the model said.
    pub fn new(prompts: Vec<String>, raw_output: &str) -> Result<Self> {
        if prompts.len() != PROMPT_COUNT {
            return Err(RadarError::PromptCountMismatch {
                expected: PROMPT_COUNT,
                found: prompts.len(),
                raw_output: raw_output.to_string(),
            });
        }
        Ok(Self(prompts))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Each prompt paired with the funnel stage it was generated for.
    pub fn staged(&self) -> impl Iterator<Item = (FunnelStage, &str)> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, p)| (FunnelStage::for_position(i), p.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub stage: FunnelStage,
    pub prompt: String,
    /// Lower-cased model answer, or an error description when `failed` is set.
    pub answer: String,
    #[serde(default)]
    pub failed: bool,
}

impl AnswerRecord {
    pub fn answered(stage: FunnelStage, prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            stage,
            prompt: prompt.into(),
            answer: answer.into(),
            failed: false,
        }
    }

    pub fn failure(stage: FunnelStage, prompt: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            stage,
            prompt: prompt.into(),
            answer: format!("error: {}", reason),
            failed: true,
        }
    }
}
