//! Header normalization.

use http::HeaderMap;
use serde_json::{Map, Value};

/// Converts a header map to a JSON object keyed by lowercase name.
///
/// Repeated headers are joined with `", "`. Values that are not valid
/// UTF-8 are decoded lossily.
#[must_use]
pub fn header_object(headers: &HeaderMap) -> Map<String, Value> {
    let mut out = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        out.insert(name.as_str().to_string(), Value::String(joined));
    }
    out
}
