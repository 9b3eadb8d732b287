//! Request body decoding.

use accord_core::{SchemaError, ValidationResult};
use serde_json::Value;

use crate::query::parse_bracketed;

/// Returns the MIME essence of a content type: lowercase, parameters dropped.
#[must_use]
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Returns true for `application/json` and `+json` types.
#[must_use]
pub fn is_json(content_type: &str) -> bool {
    let essence = mime_essence(content_type);
    essence == "application/json" || essence.ends_with("+json")
}

/// Decodes a raw body according to its content type.
///
/// - empty body: `null`
/// - JSON (or no content type): parsed JSON, a parse failure is an error
/// - `application/x-www-form-urlencoded`: bracket-mode form parsing
/// - anything else: the body as a string
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> ValidationResult {
    if body.is_empty() {
        return Ok(Value::Null);
    }

    match content_type {
        None => parse_json(body),
        Some(ct) if is_json(ct) => parse_json(body),
        Some(ct) if mime_essence(ct) == "application/x-www-form-urlencoded" => Ok(Value::Object(
            parse_bracketed(&String::from_utf8_lossy(body)),
        )),
        Some(_) => Ok(Value::String(String::from_utf8_lossy(body).into_owned())),
    }
}

fn parse_json(body: &[u8]) -> ValidationResult {
    serde_json::from_slice(body)
        .map_err(|e| SchemaError::single(format!("Invalid JSON body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_body_is_null() {
        assert_eq!(parse_body(Some("application/json"), b"").unwrap(), Value::Null);
        assert_eq!(parse_body(None, b"").unwrap(), Value::Null);
    }

    #[test]
    fn test_json_body() {
        let out = parse_body(Some("application/json; charset=utf-8"), br#"{"a":1}"#).unwrap();
        assert_eq!(out, json!({"a": 1}));

        let out = parse_body(Some("application/merge-patch+json"), b"[1]").unwrap();
        assert_eq!(out, json!([1]));

        assert_eq!(parse_body(None, b"true").unwrap(), json!(true));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = parse_body(Some("application/json"), b"{oops").unwrap_err();
        assert!(err.issues[0].message.starts_with("Invalid JSON body"));
    }

    #[test]
    fn test_form_body() {
        let out = parse_body(
            Some("application/x-www-form-urlencoded"),
            b"name=Pikachu&moves[]=thunder&moves[]=quick",
        )
        .unwrap();
        assert_eq!(out, json!({"name": "Pikachu", "moves": ["thunder", "quick"]}));
    }

    #[test]
    fn test_text_body() {
        assert_eq!(parse_body(Some("text/plain"), b"hello").unwrap(), json!("hello"));
        assert_eq!(
            parse_body(Some("application/octet-stream"), b"raw").unwrap(),
            json!("raw")
        );
    }
}
