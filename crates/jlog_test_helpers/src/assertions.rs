//! Predicates for emitted log lines

use predicates::prelude::*;
use regex::Regex;
use std::sync::OnceLock;

static ISO_TIMESTAMP: OnceLock<Regex> = OnceLock::new();
static CIRCULAR: OnceLock<Regex> = OnceLock::new();

fn iso_regex() -> &'static Regex {
    ISO_TIMESTAMP.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})$")
            .expect("valid timestamp regex")
    })
}

fn circular_regex() -> &'static Regex {
    CIRCULAR.get_or_init(|| Regex::new(r"\[Circular\s\*\d+\]").expect("valid circular regex"))
}

/// Matches an ISO-8601 timestamp such as `2024-01-01T00:00:00.000Z`
///
/// # Example
/// ```rust
/// use jlog_test_helpers::assertions::iso_timestamp;
/// use predicates::prelude::*;
///
/// assert!(iso_timestamp().eval("2024-01-01T00:00:00.000Z"));
/// ```
pub fn iso_timestamp() -> impl Predicate<str> {
    predicate::function(|s: &str| iso_regex().is_match(s))
}

/// Matches the textual fallback rendered for self-referential values
pub fn circular_fallback() -> impl Predicate<str> {
    predicate::function(|s: &str| circular_regex().is_match(s))
}

/// Matches a single line holding one JSON object
pub fn json_object_line() -> impl Predicate<str> {
    predicate::function(|s: &str| {
        !s.contains('\n')
            && serde_json::from_str::<serde_json::Value>(s)
                .map(|v| v.is_object())
                .unwrap_or(false)
    })
}

/// Keys of a JSON object in wire order
pub fn keys_in_order(value: &serde_json::Value) -> Vec<String> {
    value
        .as_object()
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default()
}
