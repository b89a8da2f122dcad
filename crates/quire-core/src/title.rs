//! Title heuristic for new documents.
//!
//! Fuzzy by nature. The only contract is "a non-empty, short string".

use regex::Regex;
use std::sync::OnceLock;

const FALLBACK_WORDS: usize = 4;
const MAX_TITLE_CHARS: usize = 80;
const UNTITLED: &str = "Untitled document";

fn leading_phrase() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r#"(?i)^(?:create |write |generate )?(?:a |an )?(?:book )?(?:about |on |for |titled |called |named )?["']?([^"'.!?]+)["']?[.!?]?"#,
            )
            .ok()
        })
        .as_ref()
}

/// Derives a document title from the instruction that created it.
///
/// Strips a leading "write a book about"-style phrase and keeps the text up
/// to the first quote or sentence punctuation. Falls back to the first four
/// words, and to "Untitled document" when the instruction has no words.
pub fn extract_title(instruction: &str) -> String {
    let instruction = instruction.trim();

    if let Some(captured) = leading_phrase()
        .and_then(|pattern| pattern.captures(instruction))
        .and_then(|caps| caps.get(1))
    {
        let title = captured.as_str().trim();
        if !title.is_empty() {
            return title.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string();
        }
    }

    let words: Vec<&str> = instruction.split_whitespace().take(FALLBACK_WORDS).collect();
    if words.is_empty() {
        UNTITLED.to_string()
    } else {
        words.join(" ")
    }
}
