use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::events::{send_event, RadarEvent};
use crate::llm::generator::TextGenerator;
use crate::llm::prompts::{answer_prompt, PromptLanguage};
use crate::schema::{AnswerRecord, FunnelStage, PromptList};

/// Whether `brand` occurs in an already lower-cased answer.
///
/// Plain substring containment: "Cola" also matches an answer naming "Coca-Cola".
/// Surrounding whitespace in `brand` is ignored; a blank brand never matches.
pub fn mentions_brand(answer_lower: &str, brand: &str) -> bool {
    let needle = brand.trim().to_lowercase();
    !needle.is_empty() && answer_lower.contains(&needle)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub top: usize,
    pub middle: usize,
    pub bottom: usize,
}

impl StageCounts {
    pub fn get(&self, stage: FunnelStage) -> usize {
        match stage {
            FunnelStage::Top => self.top,
            FunnelStage::Middle => self.middle,
            FunnelStage::Bottom => self.bottom,
        }
    }

    fn increment(&mut self, stage: FunnelStage) {
        match stage {
            FunnelStage::Top => self.top += 1,
            FunnelStage::Middle => self.middle += 1,
            FunnelStage::Bottom => self.bottom += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.top + self.middle + self.bottom
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandCount {
    /// Brand name as the user typed it.
    pub brand: String,
    pub mentions: usize,
    pub by_stage: StageCounts,
}

/// Per-brand mention counts, one entry per brand in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibilityTally {
    counts: Vec<BrandCount>,
}

impl VisibilityTally {
    pub fn new(brands: &[String]) -> Self {
        Self {
            counts: brands
                .iter()
                .map(|brand| BrandCount {
                    brand: brand.clone(),
                    mentions: 0,
                    by_stage: StageCounts::default(),
                })
                .collect(),
        }
    }

    /// Credits every brand named in `answer_lower` once, whatever the number of occurrences.
    pub fn record_answer(&mut self, stage: FunnelStage, answer_lower: &str) {
        for entry in &mut self.counts {
            if mentions_brand(answer_lower, &entry.brand) {
                entry.mentions += 1;
                entry.by_stage.increment(stage);
            }
        }
    }

    /// Count for the first entry named exactly `brand`.
    pub fn get(&self, brand: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|c| c.brand == brand)
            .map(|c| c.mentions)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BrandCount> {
        self.counts.iter()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(brand, count)` rows in input order.
    pub fn to_pairs(&self) -> Vec<(String, usize)> {
        self.counts
            .iter()
            .map(|c| (c.brand.clone(), c.mentions))
            .collect()
    }
}

pub struct VisibilityTallier<'a, G: TextGenerator + ?Sized> {
    generator: &'a G,
    language: PromptLanguage,
}

impl<'a, G: TextGenerator + ?Sized> VisibilityTallier<'a, G> {
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

    /// Asks every prompt in turn and counts which brands the answers name.
    ///
    /// Prompts are sent one at a time. A failed call becomes a failed record and
    /// credits nobody; the remaining prompts are still asked.
    pub async fn tally(
        &self,
        prompts: &PromptList,
        brands: &[String],
        progress: Option<&Sender<RadarEvent>>,
    ) -> (VisibilityTally, Vec<AnswerRecord>) {
        let mut tally = VisibilityTally::new(brands);
        let mut records = Vec::with_capacity(prompts.len());
        let total = prompts.len();

        for (index, (stage, prompt)) in prompts.staged().enumerate() {
            send_event(
                progress,
                RadarEvent::Querying {
                    index,
                    total,
                    stage,
                    prompt: prompt.to_string(),
                },
            )
            .await;

            let question = answer_prompt(prompt, self.language);
            match self.generator.generate_content(&question).await {
                Ok(text) => {
                    let answer = text.trim().to_lowercase();
                    tally.record_answer(stage, &answer);
                    debug!("Prompt {}/{} answered ({} chars)", index + 1, total, answer.len());
                    records.push(AnswerRecord::answered(stage, prompt, answer));
                }
                Err(e) => {
                    warn!("Prompt {}/{} failed: {}", index + 1, total, e);
                    send_event(
                        progress,
                        RadarEvent::AnswerFailed {
                            index,
                            reason: e.to_string(),
                        },
                    )
                    .await;
                    records.push(AnswerRecord::failure(stage, prompt, &e));
                }
            }
        }

        let failed = records.iter().filter(|r| r.failed).count();
        info!(
            "Tallied {} answers ({} failed) for {} brands",
            records.len() - failed,
            failed,
            tally.len()
        );
        (tally, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RadarError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn brands(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn prompt_list() -> PromptList {
        let prompts = (1..=10).map(|i| format!("Question {}", i)).collect();
        PromptList::new(prompts, "").unwrap()
    }

    /// Replies with `answer`, failing on the call numbers listed in `fail_on`.
    struct ScriptedGenerator {
        answer: String,
        fail_on: Vec<usize>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(answer: &str, fail_on: Vec<usize>) -> Self {
            Self {
                answer: answer.to_string(),
                fail_on,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate_content(&self, _prompt: &str) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.contains(&call) {
                return Err(RadarError::Generation("provider unavailable".to_string()));
            }
            Ok(self.answer.clone())
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_mentions_brand_is_case_insensitive() {
        assert!(mentions_brand("i recommend acme shoes", "ACME"));
        assert!(!mentions_brand("i recommend acme shoes", "Zeta"));
        assert!(!mentions_brand("anything", "  "));
    }

    #[test]
    fn test_multiple_occurrences_count_once() {
        let mut tally = VisibilityTally::new(&brands(&["Acme"]));
        tally.record_answer(FunnelStage::Top, "acme, acme and more acme");
        assert_eq!(tally.get("Acme"), Some(1));
    }

    #[test]
    fn test_nested_brand_names_both_credited() {
        let mut tally = VisibilityTally::new(&brands(&["Acme", "Acme Pro"]));
        tally.record_answer(FunnelStage::Middle, "acme pro is great");
        assert_eq!(tally.get("Acme"), Some(1));
        assert_eq!(tally.get("Acme Pro"), Some(1));
    }

    #[test]
    fn test_tally_starts_at_zero_in_input_order() {
        let tally = VisibilityTally::new(&brands(&["Zeta", "Acme"]));
        assert_eq!(
            tally.to_pairs(),
            vec![("Zeta".to_string(), 0), ("Acme".to_string(), 0)]
        );
    }

    #[tokio::test]
    async fn test_failed_prompt_is_recorded_and_skipped() {
        let generator = ScriptedGenerator::new("Acme is the best choice", vec![3]);
        let (tally, records) = VisibilityTallier::new(&generator)
            .tally(&prompt_list(), &brands(&["Acme", "Zeta"]), None)
            .await;

        assert_eq!(records.len(), 10);
        assert!(records[3].failed);
        assert_eq!(records[3].prompt, "Question 4");
        assert!(records[3].answer.contains("provider unavailable"));
        assert_eq!(records.iter().filter(|r| r.failed).count(), 1);

        assert_eq!(tally.get("Acme"), Some(9));
        assert_eq!(tally.get("Zeta"), Some(0));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_answers_are_lower_cased_and_trimmed() {
        let generator = ScriptedGenerator::new("  Try ZETA Running Gear \n", vec![]);
        let (_, records) = VisibilityTallier::new(&generator)
            .tally(&prompt_list(), &brands(&["Zeta"]), None)
            .await;

        assert_eq!(records[0].answer, "try zeta running gear");
    }

    #[tokio::test]
    async fn test_stage_breakdown_follows_prompt_positions() {
        let generator = ScriptedGenerator::new("acme", vec![0, 9]);
        let (tally, _) = VisibilityTallier::new(&generator)
            .tally(&prompt_list(), &brands(&["Acme"]), None)
            .await;

        let acme = tally.iter().next().unwrap();
        assert_eq!(acme.by_stage.top, 1);
        assert_eq!(acme.by_stage.middle, 4);
        assert_eq!(acme.by_stage.bottom, 3);
        assert_eq!(acme.by_stage.total(), acme.mentions);
    }

    #[tokio::test]
    async fn test_progress_events() {
        let generator = ScriptedGenerator::new("acme", vec![1]);
        let (tx, mut rx) = tokio::sync::mpsc::channel(64);
        VisibilityTallier::new(&generator)
            .tally(&prompt_list(), &brands(&["Acme"]), Some(&tx))
            .await;
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        let queries = events
            .iter()
            .filter(|e| matches!(e, RadarEvent::Querying { .. }))
            .count();
        assert_eq!(queries, 10);
        assert!(events
            .iter()
            .any(|e| matches!(e, RadarEvent::AnswerFailed { index: 1, .. })));
    }
}
