//! Query string and form body parsing.
//!
//! Two modes are supported:
//!
//! - **Bracket mode** (default): URL-encoded pairs where keys may use
//!   bracket notation. `a[b]=1` nests, `a[]=1&a[]=2` and `a[0]=x` build
//!   arrays, and a repeated plain key (`a=1&a=2`) becomes an array. Nesting
//!   stops after [`MAX_DEPTH`] bracket groups; anything after that is kept
//!   literally as one more key segment.
//! - **JSON mode**: pairs are parsed as above, then every top-level string
//!   value is parsed as JSON. Values that are not valid JSON stay strings.
//!
//! ```
//! use accord_extract::query::parse_query;
//! use serde_json::json;
//!
//! let value = parse_query("type=fire&page[size]=10&tags[]=a&tags[]=b", false);
//! assert_eq!(
//!     value,
//!     json!({"type": "fire", "page": {"size": "10"}, "tags": ["a", "b"]})
//! );
//! ```

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Maximum number of bracket groups parsed from one key.
pub const MAX_DEPTH: usize = 5;

/// Numeric keys above this stay object keys instead of array indices.
const ARRAY_LIMIT: usize = 20;

#[derive(Debug)]
enum Node {
    Leaf(String),
    Branch(IndexMap<String, Node>),
}

impl Node {
    fn push(&mut self, value: String) {
        match self {
            Self::Leaf(old) => {
                let old = std::mem::take(old);
                let mut map = IndexMap::new();
                map.insert("0".to_string(), Self::Leaf(old));
                map.insert("1".to_string(), Self::Leaf(value));
                *self = Self::Branch(map);
            }
            Self::Branch(map) => {
                let index = next_index(map);
                map.insert(index, Self::Leaf(value));
            }
        }
    }

    fn promote(&mut self) {
        if let Self::Leaf(old) = self {
            let old = std::mem::take(old);
            let mut map = IndexMap::new();
            map.insert("0".to_string(), Self::Leaf(old));
            *self = Self::Branch(map);
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Leaf(s) => Value::String(s),
            Self::Branch(map) => branch_to_value(map),
        }
    }
}

/// One past the largest numeric key, so appends never overwrite explicit
/// indices.
fn next_index(map: &IndexMap<String, Node>) -> String {
    map.keys()
        .filter_map(|k| k.parse::<usize>().ok())
        .max()
        .map_or(0, |i| i + 1)
        .to_string()
}

fn branch_to_value(map: IndexMap<String, Node>) -> Value {
    let indices: Option<Vec<usize>> = map
        .keys()
        .map(|k| k.parse::<usize>().ok().filter(|i| *i <= ARRAY_LIMIT))
        .collect();

    match indices {
        Some(indices) if !indices.is_empty() => {
            let mut items: Vec<(usize, Node)> = indices.into_iter().zip(map.into_values()).collect();
            items.sort_by_key(|(i, _)| *i);
            Value::Array(items.into_iter().map(|(_, n)| n.into_value()).collect())
        }
        _ => Value::Object(map.into_iter().map(|(k, n)| (k, n.into_value())).collect()),
    }
}

fn assign(map: &mut IndexMap<String, Node>, key: &str, rest: &[String], value: String) {
    match rest.split_first() {
        None => match map.get_mut(key) {
            Some(existing) => existing.push(value),
            None => {
                map.insert(key.to_string(), Node::Leaf(value));
            }
        },
        Some((next, rest)) => {
            let child = map
                .entry(key.to_string())
                .or_insert_with(|| Node::Branch(IndexMap::new()));
            if next.is_empty() && rest.is_empty() {
                child.push(value);
                return;
            }
            child.promote();
            if let Node::Branch(branch) = child {
                if next.is_empty() {
                    let index = next_index(branch);
                    assign(branch, &index, rest, value);
                } else {
                    assign(branch, next, rest, value);
                }
            }
        }
    }
}

/// Splits `a[b][c]` into `("a", ["b", "c"])`.
fn split_key(key: &str) -> (&str, Vec<String>) {
    let Some(open) = key.find('[') else {
        return (key, Vec::new());
    };
    if open == 0 {
        return (key, Vec::new());
    }

    let root = &key[..open];
    let mut rest = &key[open..];
    let mut segments = Vec::new();
    while segments.len() < MAX_DEPTH {
        let Some(inner) = rest.strip_prefix('[') else {
            break;
        };
        let Some(close) = inner.find(']') else {
            break;
        };
        segments.push(inner[..close].to_string());
        rest = &inner[close + 1..];
    }

    if segments.is_empty() {
        return (key, Vec::new());
    }
    if !rest.is_empty() {
        segments.push(rest.to_string());
    }
    (root, segments)
}

/// Parses a URL-encoded string in bracket mode.
#[must_use]
pub fn parse_bracketed(raw: &str) -> Map<String, Value> {
    let mut root: IndexMap<String, Node> = IndexMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        let (head, segments) = split_key(&key);
        assign(&mut root, head, &segments, value.into_owned());
    }
    root.into_iter().map(|(k, n)| (k, n.into_value())).collect()
}

/// Parses a query string in the selected mode, returning an object.
#[must_use]
pub fn parse_query(raw: &str, json_query: bool) -> Value {
    let mut map = parse_bracketed(raw);
    if json_query {
        for value in map.values_mut() {
            if let Value::String(s) = value {
                if let Ok(parsed) = serde_json::from_str::<Value>(s) {
                    *value = parsed;
                }
            }
        }
    }
    Value::Object(map)
}
