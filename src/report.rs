use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;

use crate::error::Result;
use crate::schema::{AnswerRecord, FunnelRequest, FunnelStage, PromptList};
use crate::tally::VisibilityTally;

const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub brand: String,
    pub mentions: usize,
    /// Mentions as a percentage of all prompts asked.
    pub share: f64,
}

/// Everything a presentation layer needs from one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityReport {
    pub request: FunnelRequest,
    pub model: String,
    pub generated_at: DateTime<Utc>,
    pub prompts: PromptList,
    pub tally: VisibilityTally,
    pub answers: Vec<AnswerRecord>,
}

impl VisibilityReport {
    pub fn new(
        request: FunnelRequest,
        model: impl Into<String>,
        prompts: PromptList,
        tally: VisibilityTally,
        answers: Vec<AnswerRecord>,
    ) -> Self {
        Self {
            request,
            model: model.into(),
            generated_at: Utc::now(),
            prompts,
            tally,
            answers,
        }
    }

    /// `(brand, count)` pairs in the order the brands were entered.
    pub fn counts(&self) -> Vec<(String, usize)> {
        self.tally.to_pairs()
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        let asked = self.prompts.len();
        self.tally
            .iter()
            .map(|c| ReportRow {
                brand: c.brand.clone(),
                mentions: c.mentions,
                share: if asked == 0 {
                    0.0
                } else {
                    c.mentions as f64 * 100.0 / asked as f64
                },
            })
            .collect()
    }

    pub fn failed_answers(&self) -> usize {
        self.answers.iter().filter(|a| a.failed).count()
    }

    pub fn render_prompts(&self) -> String {
        let mut out = String::new();
        for (i, (stage, prompt)) in self.prompts.staged().enumerate() {
            let _ = writeln!(out, "{:>2}. [{}] {}", i + 1, stage, prompt);
        }
        out
    }

    /// Horizontal bar chart of mentions per brand.
    pub fn render_chart(&self) -> String {
        let rows = self.rows();
        let name_width = rows.iter().map(|r| r.brand.chars().count()).max().unwrap_or(0);
        let scale = self.prompts.len().max(1);

        let mut out = String::new();
        for row in rows {
            let filled = row.mentions * BAR_WIDTH / scale;
            let _ = writeln!(
                out,
                "{:<width$} | {}{} {:>2} ({:.0}%)",
                row.brand,
                "█".repeat(filled),
                " ".repeat(BAR_WIDTH - filled.min(BAR_WIDTH)),
                row.mentions,
                row.share,
                width = name_width
            );
        }
        out
    }

    pub fn render_stage_table(&self) -> String {
        let name_width = self
            .tally
            .iter()
            .map(|c| c.brand.chars().count())
            .chain(std::iter::once("Brand".len()))
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        let _ = write!(out, "{:<width$}", "Brand", width = name_width);
        for stage in FunnelStage::ALL {
            let _ = write!(out, " | {:>16}", stage.label());
        }
        let _ = writeln!(out, " | {:>5}", "Total");

        for count in self.tally.iter() {
            let _ = write!(out, "{:<width$}", count.brand, width = name_width);
            for stage in FunnelStage::ALL {
                let _ = write!(
                    out,
                    " | {:>16}",
                    format!("{}/{}", count.by_stage.get(stage), stage.prompt_quota())
                );
            }
            let _ = writeln!(out, " | {:>5}", count.mentions);
        }
        out
    }

    /// Per-prompt detail table; answers longer than `max_answer_chars` are cut.
    pub fn render_details(&self, max_answer_chars: usize) -> String {
        let mut out = String::new();
        for (i, record) in self.answers.iter().enumerate() {
            let marker = if record.failed { " (failed)" } else { "" };
            let _ = writeln!(out, "{:>2}. [{}]{} {}", i + 1, record.stage, marker, record.prompt);
            let _ = writeln!(out, "    {}", truncate_chars(&record.answer, max_answer_chars));
        }
        out
    }

    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> VisibilityReport {
        let request = FunnelRequest::new("Acme", "running shoes", ["Zeta"]);
        let prompts = PromptList::new((1..=10).map(|i| format!("Q{}", i)).collect(), "").unwrap();
        let mut tally = VisibilityTally::new(&request.all_brands());
        let mut answers = Vec::new();
        for (i, (stage, prompt)) in prompts.staged().enumerate() {
            let answer = if i < 5 { "acme" } else { "nothing relevant" };
            tally.record_answer(stage, answer);
            answers.push(AnswerRecord::answered(stage, prompt, answer));
        }
        VisibilityReport::new(request, "test-model", prompts, tally, answers)
    }

    #[test]
    fn test_counts_follow_brand_order() {
        let report = sample_report();
        assert_eq!(
            report.counts(),
            vec![("Acme".to_string(), 5), ("Zeta".to_string(), 0)]
        );
    }

    #[test]
    fn test_share_is_percentage_of_prompts() {
        let rows = sample_report().rows();
        assert!((rows[0].share - 50.0).abs() < 1e-9);
        assert_eq!(rows[1].share, 0.0);
    }

    #[test]
    fn test_chart_bars_scale_with_mentions() {
        let chart = sample_report().render_chart();
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].matches('█').count(), BAR_WIDTH / 2);
        assert_eq!(lines[1].matches('█').count(), 0);
        assert!(lines[0].ends_with("5 (50%)"));
    }

    #[test]
    fn test_stage_table() {
        let table = sample_report().render_stage_table();
        let acme = table.lines().nth(1).unwrap();
        assert!(acme.starts_with("Acme"));
        assert!(acme.contains("2/2"));
        assert!(acme.contains("3/4"));
        assert!(acme.contains("0/4"));
    }

    #[test]
    fn test_details_truncate_long_answers() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("one\ntwo  three", 20), "one two three");
        assert_eq!(truncate_chars("abcdefgh", 3), "abc…");
    }

    #[test]
    fn test_json_output() {
        let report = sample_report();
        let mut buf = Vec::new();
        report.write_json(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["tally"][0]["brand"], "Acme");
        assert_eq!(value["tally"][0]["mentions"], 5);
        assert_eq!(value["prompts"].as_array().unwrap().len(), 10);
        assert_eq!(value["answers"][0]["stage"], "top");
    }
}
