//! Free-text metrics for review bodies.
//!
//! All functions here are pure; the record extractor calls them once per
//! document over the normalized overall evaluation text.

use crate::models::TextMetrics;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Word token: word characters, apostrophes and hyphens between word boundaries.
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[\w'-]+\b").expect("word pattern is valid"));

static SENTENCE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence pattern is valid"));

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`normalize_whitespace`] for optional document text; absent text is empty.
pub fn normalize_optional(text: Option<&str>) -> String {
    text.map(normalize_whitespace).unwrap_or_default()
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD_RE.find_iter(text).map(|m| m.as_str())
}

/// Count word tokens.
pub fn word_count(text: &str) -> usize {
    words(text).count()
}

/// Count segments between `.`, `!` and `?` runs that contain any text.
pub fn sentence_count(text: &str) -> usize {
    SENTENCE_BREAK_RE
        .split(text)
        .filter(|segment| !segment.trim().is_empty())
        .count()
}

/// Ratio of distinct (case-insensitive) tokens to all tokens.
///
/// Returns 0.0 for text without words. Not rounded.
pub fn unique_word_ratio(text: &str) -> f64 {
    let tokens: Vec<String> = words(text).map(str::to_lowercase).collect();
    if tokens.is_empty() {
        return 0.0;
    }

    let distinct: HashSet<&str> = tokens.iter().map(String::as_str).collect();
    distinct.len() as f64 / tokens.len() as f64
}

/// Round to a fixed number of decimal places.
///
/// Rounds the exact binary value, with ties going to the even digit, so
/// `10.25` becomes `10.2` and `1.0005` (stored just below the tie) becomes
/// `1.0`.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

impl TextMetrics {
    /// Derive all metrics from already-normalized text.
    pub fn from_text(text: &str) -> Self {
        Self {
            word_count: word_count(text),
            char_count: text.chars().count(),
            sentence_count: sentence_count(text),
            unique_word_ratio: round_to(unique_word_ratio(text), 3),
        }
    }
}
