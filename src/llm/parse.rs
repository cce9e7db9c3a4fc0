//! Lenient JSON extraction from LLM replies.
//!
//! Model output is untrusted: a structured payload may arrive bare, inside a
//! ```json fence, or surrounded by prose. Every call site that expects
//! structured output goes through these helpers and supplies its own default;
//! a parse failure never propagates past the immediate caller.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extract the first JSON payload from a reply.
///
/// Handles fenced blocks (```json ... ``` or ``` ... ```) and bare objects or
/// arrays embedded in prose. Returns `None` for content with no parseable
/// JSON; never panics.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    // Fenced block first: the fence is an explicit signal of where the
    // payload is, even when prose around it also contains braces.
    if let Some(inner) = extract_fenced(trimmed) {
        if let Ok(value) = serde_json::from_str(inner.trim()) {
            return Some(value);
        }
    }

    // Bare payload: widest object span, then widest array span.
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                    return Some(value);
                }
            }
        }
    }

    None
}

/// Return the contents of the first fenced code block, if any.
fn extract_fenced(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip an optional language tag on the fence line
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// Deserialize a reply into `T`, falling back to `T::default()` on any
/// extraction or deserialization failure.
pub fn parse_or_default<T: DeserializeOwned + Default>(text: &str) -> T {
    extract_json(text)
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}

/// Extract a list of non-empty strings from a reply.
///
/// Accepts either a bare array or an object with a `steps` field. Returns an
/// empty vec when the reply holds no usable list.
pub fn extract_string_list(text: &str) -> Vec<String> {
    let value = match extract_json(text) {
        Some(v) => v,
        None => return Vec::new(),
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("steps") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn extracts_bare_object() {
        let value = extract_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn extracts_fenced_object() {
        let text = "Here is the result:\n```json\n{\"a\": 2}\n```\nDone.";
        let value = extract_json(text).unwrap();
        assert_eq!(value["a"], 2);
    }

    #[test]
    fn extracts_fence_without_language_tag() {
        let text = "```\n[1, 2, 3]\n```";
        let value = extract_json(text).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    #[test]
    fn extracts_object_embedded_in_prose() {
        let text = "Sure! The answer is {\"ok\": true} as requested.";
        let value = extract_json(text).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn malformed_content_yields_none() {
        assert!(extract_json("no json here").is_none());
        assert!(extract_json("{broken").is_none());
        assert!(extract_json("").is_none());
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Extraction {
        #[serde(default)]
        skills: Vec<String>,
    }

    #[test]
    fn parse_or_default_falls_back() {
        let parsed: Extraction = parse_or_default("not json at all");
        assert_eq!(parsed, Extraction::default());

        let parsed: Extraction = parse_or_default(r#"{"skills": ["rust"]}"#);
        assert_eq!(parsed.skills, vec!["rust"]);
    }

    #[test]
    fn string_list_from_array_and_steps_object() {
        let from_array = extract_string_list(r#"["one", "two"]"#);
        assert_eq!(from_array, vec!["one", "two"]);

        let from_object = extract_string_list(r#"{"steps": ["a", " b "]}"#);
        assert_eq!(from_object, vec!["a", "b"]);
    }

    #[test]
    fn string_list_skips_non_strings_and_blanks() {
        let list = extract_string_list(r#"["keep", 7, "", null, "also"]"#);
        assert_eq!(list, vec!["keep", "also"]);
    }

    #[test]
    fn string_list_empty_for_non_list_reply() {
        assert!(extract_string_list(r#"{"plan": "none"}"#).is_empty());
        assert!(extract_string_list("plain text").is_empty());
    }
}
