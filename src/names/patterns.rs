//! Deterministic pattern rules over normalized text

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Self-introduction idioms; the idiom is matched case-insensitively, the
/// captured name must be capitalized
static GREETING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    const NAME: &str = r"([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*)";
    const FULL_NAME: &str = r"([A-Z][a-z]+[ \t]+[A-Z][a-z]+)";

    [
        format!(r"(?i:\bhi,?[ \t]+i['’]?m)[ \t]+{NAME}"),
        format!(r"(?i:\bhello,?[ \t]+i['’]?m)[ \t]+{NAME}"),
        format!(r"(?i:\bi['’]m)[ \t]+{NAME}"),
        format!(r"(?i:\bmy[ \t]+name[ \t]+is)[ \t]+{NAME}"),
        format!(r"(?i:\bi[ \t]+am)[ \t]+{FULL_NAME}"),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("greeting pattern is valid"))
    .collect()
});

static CAPITALIZED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]{2,}\b").expect("word pattern is valid"));

static SINGLE_WORD_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+$").expect("line pattern is valid"));

/// Capitalized function and demonstrative words never counted as repeats
const REPETITION_STOPWORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "Their", "They", "When", "Where", "What", "Which",
];

/// Minimum occurrences for a word to count as repeated
const REPETITION_THRESHOLD: usize = 2;

/// Names introduced by a greeting idiom ("Hi, I'm Jane", "My name is Jane Doe")
pub fn greeting_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for pattern in GREETING_PATTERNS.iter() {
        for captures in pattern.captures_iter(text) {
            if let Some(name) = captures.get(1) {
                names.push(name.as_str().trim().to_string());
            }
        }
    }
    names
}

/// Capitalized words of three or more letters seen at least twice
///
/// Frequency is global to `corpus`, so this runs over the accumulated text of
/// a crawl rather than page by page.
pub fn repeated_words(corpus: &str) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in CAPITALIZED_WORD.find_iter(corpus) {
        let word = word.as_str();
        if !REPETITION_STOPWORDS.contains(&word) {
            *counts.entry(word).or_default() += 1;
        }
    }

    let mut repeated: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count >= REPETITION_THRESHOLD)
        .map(|(word, _)| word.to_string())
        .collect();
    repeated.sort();
    repeated
}

/// Lines that consist of exactly one capitalized word longer than two chars
pub fn standalone_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.len() > 2 && SINGLE_WORD_LINE.is_match(line))
        .map(str::to_string)
        .collect()
}
