// src/sanitize.rs

use once_cell::sync::Lazy;
use regex::Regex;

static ISSUE_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:fixes|closes|resolves|related|addresses?)\s*#[0-9]+\b")
        .expect("valid regex")
});
static PAREN_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(#[0-9]+\)").expect("valid regex"));
static BARE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"#[0-9]+\b").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

const TRAILING_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Reduces a raw commit message to a clean one-line subject.
///
/// Issue phrases (`fixes #12`) go first, then parenthesized refs, then any
/// remaining bare `#123`, so a phrase never leaves its verb behind.
pub fn sanitize(message: &str) -> String {
    let subject = message.trim().lines().next().unwrap_or("").trim();
    if subject.is_empty() {
        return String::new();
    }

    let subject = ISSUE_PHRASE.replace_all(subject, "");
    let subject = PAREN_REF.replace_all(&subject, "");
    let subject = BARE_REF.replace_all(&subject, "");
    let subject = WHITESPACE.replace_all(&subject, " ");

    subject
        .trim()
        .trim_end_matches(TRAILING_PUNCT)
        .trim_end()
        .to_string()
}
