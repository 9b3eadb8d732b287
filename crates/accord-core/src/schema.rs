//! Schema adapter.
//!
//! Route descriptors may carry schemas written against different validation
//! conventions. [`Schema`] tags which convention a value follows, and
//! [`validate_if_schema`] is the single entry point that runs any of them and
//! always answers with a [`ValidationResult`].
//!
//! # Conventions
//!
//! - [`Schema::Marker`]: a plain type marker. Nothing is checked at runtime;
//!   the input passes through unchanged.
//! - [`Schema::Legacy`]: a validator exposing `safe_parse`, returning either
//!   the parsed value or a [`SchemaError`].
//! - [`Schema::Standard`]: a validator exposing `validate`, returning either
//!   the output value or a list of [`Issue`]s.
//!
//! The built-in [`Shape`](crate::Shape) library implements both traits.
//!
//! # Example
//!
//! ```
//! use accord_core::{validate_if_schema, Schema, Shape, ValidateOptions};
//! use serde_json::json;
//!
//! let schema: Schema = Shape::object([("id", Shape::number().coerce())]).into();
//! let out = validate_if_schema(Some(&schema), &json!({"id": "42"}), ValidateOptions::default());
//! assert_eq!(out.unwrap(), json!({"id": 42}));
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of validating one value against an optional schema.
pub type ValidationResult<T = Value> = Result<T, SchemaError>;

/// One segment of the location of an issue inside the validated value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathItem {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

impl From<&str> for PathItem {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathItem {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathItem {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Human-readable description.
    pub message: String,
    /// Location of the problem, outermost first.
    #[serde(default)]
    pub path: Vec<PathItem>,
}

impl Issue {
    /// Creates an issue at the root of the value.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }

    /// Creates an issue at the given path.
    #[must_use]
    pub fn at(message: impl Into<String>, path: Vec<PathItem>) -> Self {
        Self {
            message: message.into(),
            path,
        }
    }

    /// Prepends a path segment.
    #[must_use]
    pub fn prefixed(mut self, item: impl Into<PathItem>) -> Self {
        self.path.insert(0, item.into());
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return f.write_str(&self.message);
        }
        let path: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        write!(f, "{}: {}", path.join("."), self.message)
    }
}

/// Structured validation failure.
///
/// Serializes as `{"name": ..., "issues": [{"message": ..., "path": [...]}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaError {
    /// Name of the error kind, as reported by the validator.
    pub name: String,
    /// Every issue found.
    pub issues: Vec<Issue>,
}

impl SchemaError {
    /// Default error name used when a validator does not provide one.
    pub const DEFAULT_NAME: &'static str = "ValidationError";

    /// Creates an error with the default name.
    #[must_use]
    pub fn new(issues: Vec<Issue>) -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            issues,
        }
    }

    /// Creates an error holding a single root-level issue.
    #[must_use]
    pub fn single(message: impl Into<String>) -> Self {
        Self::new(vec![Issue::new(message)])
    }

    /// Prepends a path segment to every issue.
    #[must_use]
    pub fn prefixed(mut self, item: impl Into<PathItem>) -> Self {
        let item = item.into();
        for issue in &mut self.issues {
            issue.path.insert(0, item.clone());
        }
        self
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (i, issue) in self.issues.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Outcome of [`LegacyValidator::safe_parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum SafeParse {
    /// Parsed successfully.
    Success(Value),
    /// Parsing failed.
    Failure(SchemaError),
}

/// Outcome of [`StandardValidator::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum StandardOutcome {
    /// Output value.
    Value(Value),
    /// Issues found.
    Issues(Vec<Issue>),
}

/// Validator following the legacy `safe_parse` convention.
pub trait LegacyValidator: Send + Sync {
    /// Parses the input without panicking.
    fn safe_parse(&self, input: &Value) -> SafeParse;

    /// Field names, when this validator describes an object of fields.
    fn object_keys(&self) -> Option<Vec<String>> {
        None
    }
}

/// Validator following the standardized `validate` convention.
pub trait StandardValidator: Send + Sync {
    /// Name of the library providing this validator.
    fn vendor(&self) -> &str {
        "accord"
    }

    /// Validates the input.
    fn validate(&self, input: &Value) -> StandardOutcome;

    /// Field names, when this validator describes an object of fields.
    fn object_keys(&self) -> Option<Vec<String>> {
        None
    }
}

/// Compile-time-only type marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMarker {
    name: String,
}

impl TypeMarker {
    /// Marker for the Rust type `T`.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self {
            name: std::any::type_name::<T>().to_string(),
        }
    }

    /// Marker with an arbitrary name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the marker's type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A schema attached to one part of a route.
#[derive(Clone)]
pub enum Schema {
    /// Type marker; never checked at runtime.
    Marker(TypeMarker),
    /// Legacy `safe_parse` validator.
    Legacy(Arc<dyn LegacyValidator>),
    /// Standard `validate` validator.
    Standard(Arc<dyn StandardValidator>),
}

impl Schema {
    /// Wraps a type marker for `T`.
    #[must_use]
    pub fn marker<T: ?Sized>() -> Self {
        Self::Marker(TypeMarker::of::<T>())
    }

    /// Wraps a legacy validator.
    pub fn legacy(validator: impl LegacyValidator + 'static) -> Self {
        Self::Legacy(Arc::new(validator))
    }

    /// Wraps a standard validator.
    pub fn standard(validator: impl StandardValidator + 'static) -> Self {
        Self::Standard(Arc::new(validator))
    }

    /// Field names, when this schema describes an object of fields.
    #[must_use]
    pub fn object_keys(&self) -> Option<Vec<String>> {
        match self {
            Self::Marker(_) => None,
            Self::Legacy(v) => v.object_keys(),
            Self::Standard(v) => v.object_keys(),
        }
    }

    fn run(&self, input: &Value) -> ValidationResult {
        match self {
            Self::Marker(_) => Ok(input.clone()),
            Self::Legacy(v) => match v.safe_parse(input) {
                SafeParse::Success(value) => Ok(value),
                SafeParse::Failure(error) => Err(error),
            },
            Self::Standard(v) => match v.validate(input) {
                StandardOutcome::Value(value) => Ok(value),
                StandardOutcome::Issues(issues) => Err(SchemaError::new(issues)),
            },
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marker(m) => f.debug_tuple("Marker").field(&m.name).finish(),
            Self::Legacy(_) => f.write_str("Legacy(..)"),
            Self::Standard(v) => f.debug_tuple("Standard").field(&v.vendor()).finish(),
        }
    }
}

/// Options for [`validate_if_schema`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Keep input object keys that the validator dropped from its output.
    pub pass_through_extra_keys: bool,
}

impl ValidateOptions {
    /// Options with `pass_through_extra_keys` enabled.
    #[must_use]
    pub const fn pass_through() -> Self {
        Self {
            pass_through_extra_keys: true,
        }
    }
}

/// Validates `input` against `schema`, if there is one.
///
/// With no schema, or with a type marker, the input is returned unchanged.
pub fn validate_if_schema(
    schema: Option<&Schema>,
    input: &Value,
    options: ValidateOptions,
) -> ValidationResult {
    let Some(schema) = schema else {
        return Ok(input.clone());
    };

    let output = schema.run(input)?;
    if options.pass_through_extra_keys {
        Ok(merge_extra_keys(input, output))
    } else {
        Ok(output)
    }
}

fn merge_extra_keys(input: &Value, output: Value) -> Value {
    match (input, output) {
        (Value::Object(input), Value::Object(mut output)) => {
            for (key, value) in input {
                if !output.contains_key(key) {
                    output.insert(key.clone(), value.clone());
                }
            }
            Value::Object(output)
        }
        (_, output) => output,
    }
}

/// Validates request headers.
///
/// `raw` maps lowercase header names to their values. Each declared header
/// with a schema is validated on its own (a missing header is validated as
/// `null`); `None` entries are skipped and undeclared headers are kept as-is.
/// All issues are collected, each prefixed with its header name.
pub fn validate_headers(
    declared: &IndexMap<String, Option<Schema>>,
    raw: &Map<String, Value>,
) -> ValidationResult {
    let mut output = raw.clone();
    let mut issues = Vec::new();

    for (name, schema) in declared {
        let Some(schema) = schema else {
            continue;
        };
        let input = raw.get(name).cloned().unwrap_or(Value::Null);
        match validate_if_schema(Some(schema), &input, ValidateOptions::default()) {
            Ok(Value::Null) if !raw.contains_key(name) => {}
            Ok(value) => {
                output.insert(name.clone(), value);
            }
            Err(error) => {
                issues.extend(error.prefixed(name.as_str()).issues);
            }
        }
    }

    if issues.is_empty() {
        Ok(Value::Object(output))
    } else {
        Err(SchemaError::new(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;
    use serde_json::json;

    struct AlwaysFails;

    impl LegacyValidator for AlwaysFails {
        fn safe_parse(&self, _input: &Value) -> SafeParse {
            SafeParse::Failure(SchemaError {
                name: "ZodError".to_string(),
                issues: vec![Issue::new("nope")],
            })
        }
    }

    struct Uppercase;

    impl StandardValidator for Uppercase {
        fn validate(&self, input: &Value) -> StandardOutcome {
            match input.as_str() {
                Some(s) => StandardOutcome::Value(Value::String(s.to_uppercase())),
                None => StandardOutcome::Issues(vec![Issue::new("Expected string")]),
            }
        }
    }

    #[test]
    fn test_absent_schema_passes_through() {
        let input = json!({"a": 1});
        let out = validate_if_schema(None, &input, ValidateOptions::default()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_marker_passes_through() {
        let schema = Schema::marker::<String>();
        let input = json!(123);
        let out = validate_if_schema(Some(&schema), &input, ValidateOptions::default()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_legacy_failure_keeps_name() {
        let schema = Schema::legacy(AlwaysFails);
        let err = validate_if_schema(Some(&schema), &json!(1), ValidateOptions::default())
            .unwrap_err();
        assert_eq!(err.name, "ZodError");
        assert_eq!(err.issues[0].message, "nope");
    }

    #[test]
    fn test_standard_success_and_failure() {
        let schema = Schema::standard(Uppercase);
        let ok = validate_if_schema(Some(&schema), &json!("abc"), ValidateOptions::default());
        assert_eq!(ok.unwrap(), json!("ABC"));

        let err = validate_if_schema(Some(&schema), &json!(1), ValidateOptions::default())
            .unwrap_err();
        assert_eq!(err.name, SchemaError::DEFAULT_NAME);
    }

    #[test]
    fn test_pass_through_extra_keys() {
        let schema: Schema = Shape::object([("id", Shape::number().coerce())]).into();
        let input = json!({"id": "7", "extra": "kept"});

        let stripped = validate_if_schema(Some(&schema), &input, ValidateOptions::default());
        assert_eq!(stripped.unwrap(), json!({"id": 7}));

        let kept = validate_if_schema(Some(&schema), &input, ValidateOptions::pass_through());
        assert_eq!(kept.unwrap(), json!({"id": 7, "extra": "kept"}));
    }

    #[test]
    fn test_schema_error_serialization() {
        let err = SchemaError::new(vec![Issue::at("bad", vec!["a".into(), 0.into()])]);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"name": "ValidationError", "issues": [{"message": "bad", "path": ["a", 0]}]})
        );
    }

    #[test]
    fn test_validate_headers() {
        let mut declared = IndexMap::new();
        declared.insert("x-api-key".to_string(), Some(Shape::string().into()));
        declared.insert("x-unset".to_string(), None);
        declared.insert("x-trace".to_string(), Some(Shape::string().optional().into()));

        let mut raw = Map::new();
        raw.insert("x-api-key".into(), json!("secret"));
        raw.insert("accept".into(), json!("*/*"));

        let out = validate_headers(&declared, &raw).unwrap();
        assert_eq!(out, json!({"x-api-key": "secret", "accept": "*/*"}));
    }

    #[test]
    fn test_validate_headers_reports_missing() {
        let mut declared = IndexMap::new();
        declared.insert("x-api-key".to_string(), Some(Shape::string().into()));

        let err = validate_headers(&declared, &Map::new()).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].path, vec![PathItem::from("x-api-key")]);
    }
}
