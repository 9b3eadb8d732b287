//! Captured path segments.

use smallvec::SmallVec;

/// Routes rarely declare more than this many `:name` segments.
const INLINE_CAPTURES: usize = 4;

/// Decoded `:name` captures of one match, in path order.
///
/// ```rust
/// use accord_router::Params;
///
/// let mut params = Params::new();
/// params.push("trainer", "ash");
/// params.push("id", "25");
///
/// assert_eq!(params.get("id"), Some("25"));
/// assert_eq!(params.iter().next(), Some(("trainer", "ash")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    captures: SmallVec<[(String, String); INLINE_CAPTURES]>,
}

impl Params {
    /// Creates an empty capture set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a capture.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.captures.push((name.into(), value.into()));
    }

    /// Looks up a capture by segment name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.captures
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v.as_str()))
    }

    /// True when nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }

    /// Number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    /// Iterates `(name, value)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.captures.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        let mut params = Params::new();
        assert!(params.is_empty());

        params.push("region", "kanto");
        params.push("id", "25");

        assert_eq!(params.get("region"), Some("kanto"));
        assert_eq!(params.get("id"), Some("25"));
        assert_eq!(params.get("name"), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_iter_keeps_path_order() {
        let mut params = Params::new();
        for (name, value) in [("z", "1"), ("a", "2"), ("m", "3"), ("b", "4"), ("c", "5")] {
            params.push(name, value);
        }

        let names: Vec<_> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["z", "a", "m", "b", "c"]);
    }
}
