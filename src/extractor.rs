use regex::Regex;
use std::sync::OnceLock;

fn numbered_item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*\d+\.\s+(.+)$").expect("numbered item pattern is valid"))
}

/// Extracts the items of a numbered list from free model output.
///
/// Every line is matched on its own against `^\s*\d+\.\s+(.+)$`: optional indentation,
/// an integer, a dot, at least one space, then the item text. The captured text is
/// trimmed and returned in order of appearance. Lines that do not match (preambles,
/// headings, blank lines, trailing notes) are skipped without error.
///
/// The parse is deliberately format-bound: an item that wraps onto a second line keeps
/// only its first line, and lists written as `1)` or `- ` yield nothing. Callers are
/// expected to check the item count.
pub fn extract_numbered_items(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| numbered_item_pattern().captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignores_non_matching_lines() {
        let text = "Intro text\n1. What is X\n2. How does Y work\nNotes";
        assert_eq!(
            extract_numbered_items(text),
            vec!["What is X".to_string(), "How does Y work".to_string()]
        );
    }

    #[test]
    fn test_preserves_line_order_not_numbering() {
        let text = "3. third\n\nHeading\n1. first\n2. second";
        assert_eq!(extract_numbered_items(text), vec!["third", "first", "second"]);
    }

    #[test]
    fn test_counts_every_matching_line() {
        let mut text = String::from("Here are your prompts:\n\n");
        for i in 1..=10 {
            text.push_str(&format!("{}. Prompt number {}\n", i, i));
            if i % 3 == 0 {
                text.push_str("---\n");
            }
        }
        let items = extract_numbered_items(&text);
        assert_eq!(items.len(), 10);
        assert_eq!(items[9], "Prompt number 10");
    }

    #[test]
    fn test_handles_crlf_and_indentation() {
        let text = "  1. Where can I buy trail shoes?\r\n  2.  Cheapest running shoes online\r\n";
        assert_eq!(
            extract_numbered_items(text),
            vec!["Where can I buy trail shoes?", "Cheapest running shoes online"]
        );
    }

    #[test]
    fn test_requires_dot_and_space() {
        let text = "1) not a match\n2.no space\n- bullet\n10. match";
        assert_eq!(extract_numbered_items(text), vec!["match"]);
    }

    #[test]
    fn test_keeps_markdown_inside_item() {
        let text = "1. **What is** a running shoe?";
        assert_eq!(extract_numbered_items(text), vec!["**What is** a running shoe?"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_numbered_items("").is_empty());
    }
}
