use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::{FunnelStage, PROMPT_COUNT};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptLanguage {
    #[default]
    En,
    De,
}

impl FromStr for PromptLanguage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(PromptLanguage::En),
            "de" | "german" | "deutsch" => Ok(PromptLanguage::De),
            other => Err(format!("unsupported prompt language '{}' (use en or de)", other)),
        }
    }
}

impl fmt::Display for PromptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptLanguage::En => f.write_str("en"),
            PromptLanguage::De => f.write_str("de"),
        }
    }
}

fn stage_guidance(stage: FunnelStage, language: PromptLanguage) -> (&'static str, &'static str) {
    match (language, stage) {
        (PromptLanguage::En, FunnelStage::Top) => (
            "Top of Funnel",
            "Users are researching the topic in general. Use phrasings like \"What is…\", \"How does … work\", \"What options are there for…\".",
        ),
        (PromptLanguage::En, FunnelStage::Middle) => (
            "Middle of Funnel",
            "Users compare options and want recommendations or the right product. Use phrasings like \"best\", \"comparison\", \"cheapest\", \"for [goal/use]\", \"with the best reviews\".",
        ),
        (PromptLanguage::En, FunnelStage::Bottom) => (
            "Bottom of Funnel",
            "Users intend to buy. Use phrasings like \"where to buy\", \"lowest price\", \"deals\", \"order directly\", \"availability\".",
        ),
        (PromptLanguage::De, FunnelStage::Top) => (
            "Top of Funnel",
            "Nutzer*innen informieren sich allgemein zum Thema. Verwende Begriffe wie „Was ist…“, „Wie funktioniert…“, „Welche Möglichkeiten gibt es…“.",
        ),
        (PromptLanguage::De, FunnelStage::Middle) => (
            "Middle of Funnel",
            "Nutzer*innen vergleichen, wollen Empfehlungen oder das passende Produkt finden. Verwende Begriffe wie „beste/r/s“, „Vergleich“, „günstigste“, „für [Ziel/Nutzung]“, „mit den besten Bewertungen“.",
        ),
        (PromptLanguage::De, FunnelStage::Bottom) => (
            "Bottom of Funnel",
            "Die Kaufabsicht ist konkret. Verwende Begriffe wie „Wo kaufen“, „günstigster Preis“, „Angebote“, „direkt bestellen“, „Verfügbarkeit“.",
        ),
    }
}

/// Builds the meta-prompt that asks the model for the funnel questions about `product`.
pub fn funnel_prompt(product: &str, language: PromptLanguage) -> String {
    let mut stages = String::new();
    for stage in FunnelStage::ALL {
        let (title, guidance) = stage_guidance(stage, language);
        let count_word = match language {
            PromptLanguage::En => "prompts",
            PromptLanguage::De => "Prompts",
        };
        stages.push_str(&format!(
            "{} ({} {}):\n- {}\n\n",
            title,
            stage.prompt_quota(),
            count_word,
            guidance
        ));
    }

    match language {
        PromptLanguage::En => format!(
            r#"You are an SEO and marketing expert designing prompts for a visibility analysis of large language models (LLMs).
The goal is to find out which providers are named for typical user questions along the customer journey.

Write {count} concrete LLM prompts that test which providers an LLM mentions.
The prompts must follow the marketing funnel:

{stages}IMPORTANT:
- Do **not** use any brand names (not even invented ones). Use only the product, the category or close synonyms.
- Phrase the prompts the way real users would search.
- Return the {count} prompts as a numbered list, without any further explanation.

Use this topic for all {count} prompts: {product}"#,
            count = PROMPT_COUNT,
            stages = stages,
            product = product.trim(),
        ),
        PromptLanguage::De => format!(
            r#"Du bist ein SEO- und Marketingexperte und entwickelst Prompts für eine Sichtbarkeitsanalyse in Large Language Models (LLMs).
Ziel ist es herauszufinden, welche Anbieter bei typischen Nutzerfragen entlang der Customer Journey genannt werden.

Erstelle {count} konkrete LLM-Prompts, mit denen man testen kann, welche Anbieter in einem LLM genannt werden.
Die Prompts sollen entlang des Marketing-Funnels aufgebaut sein:

{stages}WICHTIG:
- Verwende **keine Markennamen** (auch keine erfundenen), sondern nur das Produkt, die Kategorie oder enge Synonyme.
- Die Prompts sollen so formuliert sein, wie reale Nutzer*innen suchen würden.
- Gib die {count} Prompts als nummerierte Liste aus, ohne weitere Erklärungen.

Nutze als Thema für alle {count} Prompts: {product}"#,
            count = PROMPT_COUNT,
            stages = stages,
            product = product.trim(),
        ),
    }
}

/// Wraps a generated user question so the model names concrete brands in its answer.
pub fn answer_prompt(question: &str, language: PromptLanguage) -> String {
    match language {
        PromptLanguage::En => format!(
            "Answer the following user question: '{}'. Name relevant brands, products or providers.",
            question
        ),
        PromptLanguage::De => format!(
            "Beantworte folgende Nutzerfrage: '{}'. Nenne relevante Marken, Produkte oder Anbieter.",
            question
        ),
    }
}
