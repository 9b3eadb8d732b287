//! Built-in schema library.
//!
//! [`Shape`] is a small declarative validator for JSON values. It covers
//! what route contracts usually need: scalars with optional string coercion
//! (path params and query values arrive as strings), arrays, objects with
//! required and optional fields, literals, and output transforms.
//!
//! ```
//! use accord_core::Shape;
//! use serde_json::json;
//!
//! let pokemon = Shape::object([
//!     ("id", Shape::integer()),
//!     ("name", Shape::string().min_length(1)),
//!     ("nickname", Shape::string().optional()),
//! ]);
//!
//! assert!(pokemon.parse(&json!({"id": 6, "name": "Charizard"})).is_ok());
//! assert!(pokemon.parse(&json!({"id": "6", "name": "Charizard"})).is_err());
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::schema::{
    Issue, LegacyValidator, PathItem, SafeParse, Schema, SchemaError, StandardOutcome,
    StandardValidator,
};

type TransformFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// How an object shape treats keys it does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Drop them from the output.
    #[default]
    Strip,
    /// Copy them to the output unchanged.
    Passthrough,
}

#[derive(Debug, Clone)]
enum Kind {
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
        pattern: Option<Regex>,
        one_of: Option<Vec<String>>,
    },
    Integer {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Boolean,
    Array {
        items: Box<Shape>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    Object {
        fields: IndexMap<String, Shape>,
        unknown: UnknownKeys,
    },
    Literal(Value),
    Null,
    Any,
}

/// A declarative JSON validator.
#[derive(Clone)]
pub struct Shape {
    kind: Kind,
    optional: bool,
    coerce: bool,
    default: Option<Value>,
    transform: Option<TransformFn>,
}

impl Shape {
    fn of(kind: Kind) -> Self {
        Self {
            kind,
            optional: false,
            coerce: false,
            default: None,
            transform: None,
        }
    }

    /// A string.
    #[must_use]
    pub fn string() -> Self {
        Self::of(Kind::String {
            min_length: None,
            max_length: None,
            pattern: None,
            one_of: None,
        })
    }

    /// An integer.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(Kind::Integer {
            minimum: None,
            maximum: None,
        })
    }

    /// Any finite number.
    #[must_use]
    pub fn number() -> Self {
        Self::of(Kind::Number {
            minimum: None,
            maximum: None,
        })
    }

    /// A boolean.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(Kind::Boolean)
    }

    /// An array whose every item matches `items`.
    #[must_use]
    pub fn array(items: Shape) -> Self {
        Self::of(Kind::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        })
    }

    /// An object with the given fields, in order.
    ///
    /// Fields are required unless marked [`optional`](Self::optional).
    /// Undeclared keys are stripped unless [`passthrough`](Self::passthrough)
    /// is set.
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Shape)>) -> Self {
        Self::of(Kind::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            unknown: UnknownKeys::Strip,
        })
    }

    /// Exactly this value.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::of(Kind::Literal(value.into()))
    }

    /// Only `null`.
    #[must_use]
    pub fn null() -> Self {
        Self::of(Kind::Null)
    }

    /// Anything, including `null`.
    #[must_use]
    pub fn any() -> Self {
        Self::of(Kind::Any)
    }

    /// Accepts a missing or `null` value.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Substitutes `value` when the input is missing or `null`.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Converts string input to the scalar type before checking it.
    ///
    /// Numbers and booleans are also accepted as input for string shapes.
    #[must_use]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// Maps the validated value. An `Err` becomes an issue.
    #[must_use]
    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(f));
        self
    }

    /// Minimum string length in characters.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        if let Kind::String { min_length, .. } = &mut self.kind {
            *min_length = Some(len);
        }
        self
    }

    /// Maximum string length in characters.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        if let Kind::String { max_length, .. } = &mut self.kind {
            *max_length = Some(len);
        }
        self
    }

    /// Requires strings to match the regex.
    #[must_use]
    pub fn pattern(mut self, regex: Regex) -> Self {
        if let Kind::String { pattern, .. } = &mut self.kind {
            *pattern = Some(regex);
        }
        self
    }

    /// Restricts strings to the listed values.
    pub fn one_of<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        if let Kind::String { one_of, .. } = &mut self.kind {
            *one_of = Some(values.into_iter().map(Into::into).collect());
        }
        self
    }

    /// Inclusive lower bound for integers and numbers.
    #[must_use]
    pub fn minimum(mut self, min: f64) -> Self {
        if let Kind::Integer { minimum, .. } | Kind::Number { minimum, .. } = &mut self.kind {
            *minimum = Some(min);
        }
        self
    }

    /// Inclusive upper bound for integers and numbers.
    #[must_use]
    pub fn maximum(mut self, max: f64) -> Self {
        if let Kind::Integer { maximum, .. } | Kind::Number { maximum, .. } = &mut self.kind {
            *maximum = Some(max);
        }
        self
    }

    /// Minimum array length.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let Kind::Array { min_items, .. } = &mut self.kind {
            *min_items = Some(min);
        }
        self
    }

    /// Maximum array length.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let Kind::Array { max_items, .. } = &mut self.kind {
            *max_items = Some(max);
        }
        self
    }

    /// Keeps undeclared object keys in the output.
    #[must_use]
    pub fn passthrough(mut self) -> Self {
        if let Kind::Object { unknown, .. } = &mut self.kind {
            *unknown = UnknownKeys::Passthrough;
        }
        self
    }

    /// Returns whether missing or `null` input is accepted.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some()
    }

    /// Declared field names, for object shapes.
    #[must_use]
    pub fn field_names(&self) -> Option<Vec<String>> {
        match &self.kind {
            Kind::Object { fields, .. } => Some(fields.keys().cloned().collect()),
            _ => None,
        }
    }

    /// Validates a value, returning the (possibly coerced) output.
    pub fn parse(&self, value: &Value) -> Result<Value, SchemaError> {
        let mut issues = Vec::new();
        let mut path = Vec::new();
        match self.check(value, &mut path, &mut issues) {
            Some(out) if issues.is_empty() => Ok(out),
            _ => Err(SchemaError::new(issues)),
        }
    }

    fn check(&self, value: &Value, path: &mut Vec<PathItem>, issues: &mut Vec<Issue>) -> Option<Value> {
        if value.is_null() && !matches!(self.kind, Kind::Null | Kind::Any) {
            if let Some(default) = &self.default {
                return Some(default.clone());
            }
            if self.optional {
                return Some(Value::Null);
            }
            issues.push(Issue::at("Required", path.clone()));
            return None;
        }

        let out = self.check_kind(value, path, issues)?;

        match &self.transform {
            Some(f) => match f(out) {
                Ok(v) => Some(v),
                Err(message) => {
                    issues.push(Issue::at(message, path.clone()));
                    None
                }
            },
            None => Some(out),
        }
    }

    fn check_kind(&self, value: &Value, path: &mut Vec<PathItem>, issues: &mut Vec<Issue>) -> Option<Value> {
        let mismatch = |expected: &str, issues: &mut Vec<Issue>, path: &[PathItem]| -> Option<Value> {
            issues.push(Issue::at(
                format!("Expected {expected}, received {}", value_type_name(value)),
                path.to_vec(),
            ));
            None
        };

        match &self.kind {
            Kind::String {
                min_length,
                max_length,
                pattern,
                one_of,
            } => {
                let s = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) if self.coerce => n.to_string(),
                    Value::Bool(b) if self.coerce => b.to_string(),
                    _ => return mismatch("string", issues, path),
                };
                let len = s.chars().count();
                let before = issues.len();
                if let Some(min) = min_length {
                    if len < *min {
                        issues.push(Issue::at(
                            format!("String must contain at least {min} character(s)"),
                            path.clone(),
                        ));
                    }
                }
                if let Some(max) = max_length {
                    if len > *max {
                        issues.push(Issue::at(
                            format!("String must contain at most {max} character(s)"),
                            path.clone(),
                        ));
                    }
                }
                if let Some(re) = pattern {
                    if !re.is_match(&s) {
                        issues.push(Issue::at(format!("Invalid string: must match {re}"), path.clone()));
                    }
                }
                if let Some(allowed) = one_of {
                    if !allowed.iter().any(|a| *a == s) {
                        issues.push(Issue::at(
                            format!("Invalid enum value. Expected {}, received '{s}'", quote_list(allowed)),
                            path.clone(),
                        ));
                    }
                }
                (issues.len() == before).then_some(Value::String(s))
            }

            Kind::Integer { minimum, maximum } => {
                let Some(n) = self.numeric(value) else {
                    return mismatch("integer", issues, path);
                };
                let Some(i) = as_integer(&n) else {
                    issues.push(Issue::at("Expected integer, received float", path.clone()));
                    return None;
                };
                let ok = check_bounds(i as f64, *minimum, *maximum, path, issues);
                ok.then(|| Value::from(i))
            }

            Kind::Number { minimum, maximum } => {
                let Some(n) = self.numeric(value) else {
                    return mismatch("number", issues, path);
                };
                let f = n.as_f64().unwrap_or(f64::NAN);
                check_bounds(f, *minimum, *maximum, path, issues).then_some(Value::Number(n))
            }

            Kind::Boolean => match value {
                Value::Bool(b) => Some(Value::Bool(*b)),
                Value::String(s) if self.coerce && (s == "true" || s == "false") => {
                    Some(Value::Bool(s == "true"))
                }
                _ => mismatch("boolean", issues, path),
            },

            Kind::Array {
                items,
                min_items,
                max_items,
            } => {
                let Some(arr) = value.as_array() else {
                    return mismatch("array", issues, path);
                };
                let before = issues.len();
                if let Some(min) = min_items {
                    if arr.len() < *min {
                        issues.push(Issue::at(
                            format!("Array must contain at least {min} element(s)"),
                            path.clone(),
                        ));
                    }
                }
                if let Some(max) = max_items {
                    if arr.len() > *max {
                        issues.push(Issue::at(
                            format!("Array must contain at most {max} element(s)"),
                            path.clone(),
                        ));
                    }
                }
                let mut out = Vec::with_capacity(arr.len());
                for (idx, item) in arr.iter().enumerate() {
                    path.push(PathItem::Index(idx));
                    if let Some(v) = items.check(item, path, issues) {
                        out.push(v);
                    }
                    path.pop();
                }
                (issues.len() == before).then_some(Value::Array(out))
            }

            Kind::Object { fields, unknown } => {
                let Some(obj) = value.as_object() else {
                    return mismatch("object", issues, path);
                };
                let before = issues.len();
                let mut out = Map::new();
                for (key, shape) in fields {
                    path.push(PathItem::Key(key.clone()));
                    match obj.get(key) {
                        None if shape.default.is_some() => {
                            if let Some(default) = &shape.default {
                                out.insert(key.clone(), default.clone());
                            }
                        }
                        None if shape.optional => {}
                        None => issues.push(Issue::at("Required", path.clone())),
                        Some(v) => {
                            if let Some(checked) = shape.check(v, path, issues) {
                                out.insert(key.clone(), checked);
                            }
                        }
                    }
                    path.pop();
                }
                if *unknown == UnknownKeys::Passthrough {
                    for (key, v) in obj {
                        if !fields.contains_key(key) {
                            out.insert(key.clone(), v.clone());
                        }
                    }
                }
                (issues.len() == before).then_some(Value::Object(out))
            }

            Kind::Literal(expected) => {
                if value == expected {
                    Some(value.clone())
                } else {
                    issues.push(Issue::at(
                        format!("Invalid literal value, expected {expected}"),
                        path.clone(),
                    ));
                    None
                }
            }

            Kind::Null => {
                if value.is_null() {
                    Some(Value::Null)
                } else {
                    mismatch("null", issues, path)
                }
            }

            Kind::Any => Some(value.clone()),
        }
    }

    fn numeric(&self, value: &Value) -> Option<Number> {
        match value {
            Value::Number(n) => Some(n.clone()),
            Value::String(s) if self.coerce => parse_number(s.trim()),
            _ => None,
        }
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn as_integer(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then(|| f as i64)
}

fn check_bounds(
    n: f64,
    minimum: Option<f64>,
    maximum: Option<f64>,
    path: &[PathItem],
    issues: &mut Vec<Issue>,
) -> bool {
    let before = issues.len();
    if let Some(min) = minimum {
        if n < min {
            issues.push(Issue::at(
                format!("Number must be greater than or equal to {min}"),
                path.to_vec(),
            ));
        }
    }
    if let Some(max) = maximum {
        if n > max {
            issues.push(Issue::at(
                format!("Number must be less than or equal to {max}"),
                path.to_vec(),
            ));
        }
    }
    issues.len() == before
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Returns a human-readable name for a JSON value type.
fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("kind", &self.kind)
            .field("optional", &self.optional)
            .field("coerce", &self.coerce)
            .field("default", &self.default)
            .field("transform", &self.transform.as_ref().map(|_| ".."))
            .finish()
    }
}

impl StandardValidator for Shape {
    fn validate(&self, input: &Value) -> StandardOutcome {
        match self.parse(input) {
            Ok(value) => StandardOutcome::Value(value),
            Err(error) => StandardOutcome::Issues(error.issues),
        }
    }

    fn object_keys(&self) -> Option<Vec<String>> {
        self.field_names()
    }
}

impl LegacyValidator for Shape {
    fn safe_parse(&self, input: &Value) -> SafeParse {
        match self.parse(input) {
            Ok(value) => SafeParse::Success(value),
            Err(error) => SafeParse::Failure(error),
        }
    }

    fn object_keys(&self) -> Option<Vec<String>> {
        self.field_names()
    }
}

impl From<Shape> for Schema {
    fn from(shape: Shape) -> Self {
        Self::Standard(Arc::new(shape))
    }
}
