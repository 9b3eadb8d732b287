//! Query string and form body encoding.
//!
//! The inverse of the server's query parsing:
//!
//! - **Bracket mode**: nested objects become `a[b]=1`, arrays become
//!   `a[0]=x&a[1]=y`, `null` becomes an empty value (`a=`). Empty arrays and
//!   objects produce nothing.
//! - **JSON mode**: each top-level value is sent as its JSON text. A string
//!   is sent as-is unless it would read back as some other JSON value
//!   (`"42"`, `"true"`, `"{..."`), in which case it is sent quoted.
//!
//! Keys are emitted in the iteration order of the `serde_json` map.
//!
//! ```
//! use accord_client::encode::{encode_bracketed, encode_json_query};
//! use serde_json::json;
//!
//! let query = json!({"page": {"size": 10}, "tags": ["a", "b"]});
//! assert_eq!(encode_bracketed(&query), "page[size]=10&tags[0]=a&tags[1]=b");
//!
//! let query = json!({"page": 2, "name": "pikachu", "id": "42"});
//! assert_eq!(
//!     encode_json_query(&query).unwrap(),
//!     "id=%2242%22&name=pikachu&page=2"
//! );
//! ```

use serde_json::Value;

fn push_pair(out: &mut Vec<String>, key: &str, value: &str) {
    out.push(format!("{key}={}", urlencoding::encode(value)));
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn walk(out: &mut Vec<String>, prefix: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk(out, &format!("{prefix}[{i}]"), item);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                walk(out, &format!("{prefix}[{}]", urlencoding::encode(key)), item);
            }
        }
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                push_pair(out, prefix, &text);
            }
        }
    }
}

/// Encodes an object in bracket notation.
///
/// A non-object root encodes to the empty string.
#[must_use]
pub fn encode_bracketed(value: &Value) -> String {
    let Value::Object(map) = value else {
        return String::new();
    };

    let mut out = Vec::new();
    for (key, item) in map {
        walk(&mut out, &urlencoding::encode(key), item);
    }
    out.join("&")
}

/// Returns true if `s` would parse as JSON and so needs quoting.
fn looks_like_json(s: &str) -> bool {
    serde_json::from_str::<Value>(s).is_ok()
}

/// Encodes each top-level value of an object as JSON text.
///
/// A non-object root encodes to the empty string.
pub fn encode_json_query(value: &Value) -> Result<String, serde_json::Error> {
    let Value::Object(map) = value else {
        return Ok(String::new());
    };

    let mut out = Vec::new();
    for (key, item) in map {
        let text = match item {
            Value::String(s) if !looks_like_json(s) => s.clone(),
            other => serde_json::to_string(other)?,
        };
        push_pair(&mut out, &urlencoding::encode(key), &text);
    }
    Ok(out.join("&"))
}
