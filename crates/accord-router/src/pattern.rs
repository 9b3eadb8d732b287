//! Path templates with `:name` parameter segments.

use std::fmt;

use thiserror::Error;

use crate::Params;

/// Errors produced while parsing a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The template does not start with `/`.
    #[error("path template '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    /// A `:` segment has no name after it.
    #[error("path template '{0}' has a parameter segment without a name")]
    EmptyParamName(String),

    /// The same parameter name appears twice.
    #[error("path template '{template}' declares parameter '{name}' more than once")]
    DuplicateParam {
        /// The offending template.
        template: String,
        /// The repeated parameter name.
        name: String,
    },
}

/// One segment of a parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches the segment text exactly (case-sensitive).
    Literal(String),
    /// Matches any single segment and captures it under this name.
    Param(String),
}

/// A parsed path template such as `/pokemon/:id`.
///
/// The leading slash is stripped and the remainder is split on `/`, so
/// `/` parses to a single empty literal and `/a/` keeps its trailing empty
/// segment. Matching compares segment counts exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    template: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a template.
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        let Some(rest) = template.strip_prefix('/') else {
            return Err(PatternError::MissingLeadingSlash(template.to_string()));
        };

        let mut segments = Vec::new();
        let mut seen: Vec<&str> = Vec::new();
        for raw in rest.split('/') {
            if let Some(name) = raw.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PatternError::EmptyParamName(template.to_string()));
                }
                if seen.contains(&name) {
                    return Err(PatternError::DuplicateParam {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                seen.push(name);
                segments.push(Segment::Param(name.to_string()));
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// Returns the original template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns parameter names in the order they appear.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches a raw request path, returning captured parameters.
    ///
    /// Captured values are percent-decoded; a value that does not decode
    /// to valid UTF-8 is kept as received.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/')?;
        let mut actual = rest.split('/');
        let mut params = Params::new();

        for expected in &self.segments {
            let segment = actual.next()?;
            match expected {
                Segment::Literal(text) => {
                    if text != segment {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = urlencoding::decode(segment)
                        .map_or_else(|_| segment.to_string(), |v| v.into_owned());
                    params.push(name.clone(), value);
                }
            }
        }

        if actual.next().is_some() {
            return None;
        }
        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_and_params() {
        let pattern = PathPattern::parse("/users/:userId/posts/:postId").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("users".into()),
                Segment::Param("userId".into()),
                Segment::Literal("posts".into()),
                Segment::Param("postId".into()),
            ]
        );
        assert_eq!(pattern.param_names().collect::<Vec<_>>(), ["userId", "postId"]);
    }

    #[test]
    fn test_parse_rejects_missing_slash() {
        assert!(matches!(
            PathPattern::parse("users"),
            Err(PatternError::MissingLeadingSlash(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_and_duplicate_params() {
        assert!(matches!(
            PathPattern::parse("/users/:"),
            Err(PatternError::EmptyParamName(_))
        ));
        assert!(matches!(
            PathPattern::parse("/a/:id/b/:id"),
            Err(PatternError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn test_match_captures_params() {
        let pattern = PathPattern::parse("/pokemon/:id").unwrap();
        let params = pattern.matches("/pokemon/25").unwrap();
        assert_eq!(params.get("id"), Some("25"));
    }

    #[test]
    fn test_match_decodes_params() {
        let pattern = PathPattern::parse("/files/:name").unwrap();
        let params = pattern.matches("/files/hello%20world").unwrap();
        assert_eq!(params.get("name"), Some("hello world"));
    }

    #[test]
    fn test_match_requires_equal_segment_count() {
        let pattern = PathPattern::parse("/pokemon/:id").unwrap();
        assert!(pattern.matches("/pokemon").is_none());
        assert!(pattern.matches("/pokemon/1/extra").is_none());
        assert!(pattern.matches("/pokemon/1/").is_none());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let pattern = PathPattern::parse("/Pokemon").unwrap();
        assert!(pattern.matches("/pokemon").is_none());
        assert!(pattern.matches("/Pokemon").is_some());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/").unwrap();
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/a").is_none());
    }
}
