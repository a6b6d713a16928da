//! Structured-data recovery from generator replies
//!
//! Models are asked for bare JSON but routinely wrap it in markdown fences or
//! surround it with prose. This module is the single place where that text is
//! turned into a JSON mapping:
//! 1. Trim the reply; if it already parses as a JSON object, that is the answer
//! 2. Otherwise keep the interior of the first fenced block, if any
//! 3. Parse that as a JSON object
//!
//! Field-level coercion helpers live here too so untyped values never travel
//! past the scoring boundary.
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

/// Untyped field mapping returned by the generator.
pub type ModelMapping = Map<String, Value>;

// Fences on their own lines. JSON strings cannot hold raw newlines, so a
// backtick run inside a value never closes this block.
static LINE_FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*```(?i:json)?[ \t]*\r?\n([\s\S]*?)\r?\n[ \t]*```[ \t]*\r?$")
        .expect("line fenced block pattern is valid")
});

// Single-line fences such as ```json {"a": 1}```.
static INLINE_FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?i:json)?\s*([\s\S]*?)\s*```").expect("inline fenced block pattern is valid")
});

static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?(?:\d[\d,]*(?:\.\d+)?|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("numeric literal pattern is valid")
});

/// Why a generator reply could not be turned into a mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The reply was empty or whitespace only.
    Empty,
    /// The reply (or its fenced interior) is not a JSON object.
    MalformedJson {
        /// The text that failed to parse.
        raw: String,
        /// Parser diagnostic.
        reason: String,
    },
}

impl ExtractionError {
    /// The offending text, when there is one.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ExtractionError::Empty => None,
            ExtractionError::MalformedJson { raw, .. } => Some(raw),
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Empty => write!(f, "model returned an empty response"),
            ExtractionError::MalformedJson { reason, .. } => {
                write!(f, "model returned malformed JSON: {}", reason)
            }
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Extracts a JSON mapping from raw model text.
///
/// Bare JSON and fenced JSON are accepted interchangeably. When several fenced
/// blocks are present only the first one is considered. A reply that is
/// already a JSON object is returned as-is, backticks inside values included.
///
/// # Errors
///
/// * `ExtractionError::Empty` - the input is blank.
/// * `ExtractionError::MalformedJson` - the candidate text is not a JSON object.
pub fn extract(raw: &str) -> Result<ModelMapping, ExtractionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::Empty);
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(map);
    }

    let candidate = match fenced_interior(trimmed) {
        Some(block) => {
            tracing::debug!("Using fenced block from model reply");
            block
        }
        None => trimmed,
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ExtractionError::MalformedJson {
            raw: candidate.to_string(),
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
        Err(e) => {
            tracing::warn!("Failed to parse model reply as JSON: {}", e);
            Err(ExtractionError::MalformedJson {
                raw: candidate.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Extracts a mapping when the reply holds one, otherwise keeps the reply text.
///
/// Used for narrative answers, where prose is a legitimate reply and must
/// reach the client unchanged.
pub fn extract_or_text(raw: String) -> Value {
    match extract(&raw) {
        Ok(map) => Value::Object(map),
        Err(e) => {
            tracing::debug!("Returning model reply as text: {}", e);
            Value::String(raw)
        }
    }
}

fn fenced_interior(text: &str) -> Option<&str> {
    [&LINE_FENCED_BLOCK, &INLINE_FENCED_BLOCK]
        .into_iter()
        .find_map(|pattern| pattern.captures(text).and_then(|c| c.get(1)))
        .map(|block| block.as_str().trim())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Reads a numeric field, defaulting to `0.0`.
///
/// Missing keys, nulls, booleans and text without a number all yield `0.0`.
/// Strings such as `"₹50,000"` or `"Rs. 1,200.50"` are read by their first
/// numeric literal with thousands separators dropped.
pub fn number_or_zero(map: &ModelMapping, key: &str) -> f64 {
    match map.get(key) {
        Some(value) => value_as_number(value).unwrap_or(0.0),
        None => 0.0,
    }
}

fn value_as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_text(s),
        _ => None,
    }
}

fn parse_numeric_text(text: &str) -> Option<f64> {
    let literal = NUMERIC_LITERAL.find(text)?;
    literal.as_str().replace(',', "").parse::<f64>().ok()
}

/// Reads a textual field, defaulting to `default`.
///
/// Numbers and booleans are rendered as text; missing keys, nulls and nested
/// values fall back to the default.
pub fn string_or_default(map: &ModelMapping, key: &str, default: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_bare_json() {
        let map = extract(r#"{"income": 50000, "expenses": 30000}"#).unwrap();
        assert_eq!(map.get("income"), Some(&json!(50000)));
        assert_eq!(map.get("expenses"), Some(&json!(30000)));
    }

    #[test]
    fn test_extract_fenced_json_with_prose() {
        let raw = "Sure! Here is the data:\n```json\n{\"emi\": 5000}\n```\nLet me know.";
        let map = extract(raw).unwrap();
        assert_eq!(map.get("emi"), Some(&json!(5000)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_extract_untagged_fence() {
        let map = extract("```\n{\"a\": true}\n```").unwrap();
        assert_eq!(map.get("a"), Some(&json!(true)));
    }

    #[test]
    fn test_extract_first_fence_wins() {
        let raw = "```json\n{\"first\": 1}\n```\ntext\n```json\n{\"second\": 2}\n```";
        let map = extract(raw).unwrap();
        assert!(map.contains_key("first"));
        assert!(!map.contains_key("second"));
    }

    #[test]
    fn test_extract_empty_input() {
        assert_eq!(extract(""), Err(ExtractionError::Empty));
        assert_eq!(extract("   \n\t "), Err(ExtractionError::Empty));
    }

    #[test]
    fn test_extract_garbage_is_malformed() {
        let err = extract("I could not read the receipt, sorry.").unwrap_err();
        match err {
            ExtractionError::MalformedJson { raw, .. } => {
                assert_eq!(raw, "I could not read the receipt, sorry.");
            }
            other => panic!("Expected MalformedJson, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_malformed_fence_reports_interior() {
        let err = extract("```json\n{\"income\": }\n```").unwrap_err();
        assert_eq!(err.raw(), Some("{\"income\": }"));
    }

    #[test]
    fn test_extract_rejects_non_object() {
        let err = extract("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedJson { .. }));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_number_or_zero_defaults() {
        let map = extract(r#"{"income": null, "expenses": "abc", "emi": true}"#).unwrap();
        assert_eq!(number_or_zero(&map, "income"), 0.0);
        assert_eq!(number_or_zero(&map, "expenses"), 0.0);
        assert_eq!(number_or_zero(&map, "emi"), 0.0);
        assert_eq!(number_or_zero(&map, "missing"), 0.0);
    }

    #[test]
    fn test_number_or_zero_reads_formatted_text() {
        let map = extract(
            r#"{"a": "₹50,000", "b": "Rs. 1,200.50", "c": "12.5", "d": 7.25, "e": "-300"}"#,
        )
        .unwrap();
        assert_eq!(number_or_zero(&map, "a"), 50000.0);
        assert_eq!(number_or_zero(&map, "b"), 1200.5);
        assert_eq!(number_or_zero(&map, "c"), 12.5);
        assert_eq!(number_or_zero(&map, "d"), 7.25);
        assert_eq!(number_or_zero(&map, "e"), -300.0);
    }

    #[test]
    fn test_number_or_zero_reads_exponents() {
        let map = extract(r#"{"a": "1e5", "b": "2.5E-1", "c": "-3e+2 rupees", "d": 1e3}"#).unwrap();
        assert_eq!(number_or_zero(&map, "a"), 100000.0);
        assert_eq!(number_or_zero(&map, "b"), 0.25);
        assert_eq!(number_or_zero(&map, "c"), -300.0);
        assert_eq!(number_or_zero(&map, "d"), 1000.0);
    }

    #[test]
    fn test_extract_bare_json_with_backticks_in_value() {
        let raw = r#"{"note":"wrap code in ```json``` blocks","income":5}"#;
        let map = extract(raw).unwrap();
        assert_eq!(map.get("note"), Some(&json!("wrap code in ```json``` blocks")));
        assert_eq!(map.get("income"), Some(&json!(5)));
    }

    #[test]
    fn test_extract_fenced_json_with_backticks_in_value() {
        let object = r#"{"note":"wrap code in ```json``` blocks","income":5}"#;
        let fenced = format!("Here you go:\n```json\n{}\n```\nDone.", object);
        assert_eq!(extract(&fenced).unwrap(), extract(object).unwrap());
    }

    #[test]
    fn test_extract_inline_fence() {
        let map = extract("Result: ```json {\"a\": 1}``` end").unwrap();
        assert_eq!(map.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_extract_or_text() {
        assert_eq!(
            extract_or_text("```json\n{\"risk\": \"High\"}\n```".to_string()),
            json!({ "risk": "High" })
        );
        assert_eq!(
            extract_or_text("Looks like a phishing attempt.".to_string()),
            json!("Looks like a phishing attempt.")
        );
    }

    #[test]
    fn test_string_or_default() {
        let map = extract(r#"{"text": "hello", "n": 3, "flag": false, "nothing": null}"#).unwrap();
        assert_eq!(string_or_default(&map, "text", ""), "hello");
        assert_eq!(string_or_default(&map, "n", ""), "3");
        assert_eq!(string_or_default(&map, "flag", ""), "false");
        assert_eq!(string_or_default(&map, "nothing", "n/a"), "n/a");
        assert_eq!(string_or_default(&map, "absent", "n/a"), "n/a");
    }
}
