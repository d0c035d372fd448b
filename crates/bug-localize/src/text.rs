//! Deterministic bag-of-tokens normalization, shared between bug reports and
//! source files so that both sides of the search are tokenized identically.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::BugLocalizeError;

fn markdown_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[[^\]]*\]\(https?://\S+?\)").unwrap())
}

fn bare_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:https?://\S+|www\.\S+)").unwrap())
}

fn lower_upper_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap())
}

fn upper_run_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap())
}

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s]+|[^\w\s]|[\d]+").unwrap())
}

/// Load a newline-separated stopword list. Blank lines are ignored.
pub fn load_stopwords(path: &Path) -> Result<HashSet<String>, BugLocalizeError> {
    let content = fs::read_to_string(path)
        .map_err(|e| BugLocalizeError::IoUnreadable(format!("{}: {}", path.display(), e)))?;
    Ok(content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect())
}

/// Produce a deterministic, idempotent bag-of-tokens string from arbitrary
/// text. Applies, in order: URL/markdown-image stripping, identifier
/// splitting, lowercasing, stopword removal, punctuation/digit/whitespace
/// collapsing, a second stopword pass, and a minimum-token-length filter.
///
/// The result is the whitespace-joined string of surviving tokens.
pub fn normalize(text: &str, stopwords: &HashSet<String>) -> String {
    let text = markdown_image_re().replace_all(text, "");
    let text = bare_url_re().replace_all(&text, "");

    let text = lower_upper_boundary_re().replace_all(&text, "$1 $2");
    let text = upper_run_boundary_re().replace_all(&text, "$1 $2");
    let text = text.replace('_', " ");

    let text = text.to_lowercase();

    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| !stopwords.contains(*w))
        .collect();
    let text = words.join(" ");

    let text = non_word_re().replace_all(&text, " ");

    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| !stopwords.contains(*w))
        .filter(|w| w.chars().count() >= 3)
        .collect();

    words.join(" ")
}

/// Split a normalized string on single spaces into a token list.
pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized.split(' ').filter(|t| !t.is_empty()).map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopwords(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn strips_markdown_images_and_bare_urls() {
        let sw = stopwords(&[]);
        let text = "see ![screenshot](https://example.com/img.png) and www.example.com for details";
        let normalized = normalize(text, &sw);
        assert!(!normalized.contains("http"));
        assert!(!normalized.contains("www"));
    }

    #[test]
    fn splits_camel_case_and_pascal_case_identifiers() {
        let sw = stopwords(&[]);
        let normalized = normalize("getUserID handles HTTPRequest objects", &sw);
        assert!(normalized.contains("get"));
        assert!(normalized.contains("user"));
        assert!(normalized.contains("http"));
        assert!(normalized.contains("request"));
    }

    #[test]
    fn replaces_underscores_with_spaces() {
        let sw = stopwords(&[]);
        let normalized = normalize("connection_timeout_handler", &sw);
        assert_eq!(normalized, "connection timeout handler");
    }

    #[test]
    fn removes_stopwords_and_short_tokens() {
        let sw = stopwords(&["the", "and", "for"]);
        let normalized = normalize("the connection and the timeout for db", &sw);
        assert!(!normalized.split(' ').any(|t| t == "the" || t == "and" || t == "for"));
        assert!(!normalized.split(' ').any(|t| t.len() < 3));
    }

    #[test]
    fn collapses_punctuation_and_digits_to_single_space() {
        let sw = stopwords(&[]);
        let normalized = normalize("error code 404, retry #3!!", &sw);
        assert!(!normalized.chars().any(|c| c.is_ascii_digit()));
        assert!(!normalized.contains(',') && !normalized.contains('!'));
    }

    #[test]
    fn idempotent_on_already_normalized_text() {
        let sw = stopwords(&["the", "and"]);
        let once = normalize("database connection timeout error handler", &sw);
        let twice = normalize(&once, &sw);
        assert_eq!(once, twice);
    }

    #[test]
    fn deterministic_for_same_input_and_stopwords() {
        let sw = stopwords(&["a"]);
        let a = normalize("network socket retry logic", &sw);
        let b = normalize("network socket retry logic", &sw);
        assert_eq!(a, b);
    }

    #[test]
    fn tokenize_splits_on_single_spaces() {
        assert_eq!(tokenize("database timeout error"), vec!["database", "timeout", "error"]);
        assert_eq!(tokenize(""), Vec::<String>::new());
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "[a-zA-Z0-9_ ]{0,60}") {
            let sw = HashSet::new();
            let once = normalize(&s, &sw);
            let twice = normalize(&once, &sw);
            prop_assert_eq!(once, twice);
        }
    }
}
