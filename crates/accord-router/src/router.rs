//! Method + path matching over a list of registered patterns.

use http::Method;

use crate::{Params, PathPattern, PatternError};

/// A successful match: the registered value plus captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value registered with the matching pattern.
    pub route: &'a T,
    /// Parameters captured from the path.
    pub params: Params,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    method: Method,
    pattern: PathPattern,
    value: T,
}

/// Matches `(method, path)` pairs to registered values.
///
/// Entries are tried in insertion order and the first one whose method is
/// equal and whose pattern matches wins. Registering overlapping patterns
/// (e.g. `/a/:id` before `/a/new`) is allowed; the earlier one shadows the
/// later one.
///
/// # Example
///
/// ```rust
/// use accord_router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(Method::GET, "/pokemon/:id", "getPokemon").unwrap();
///
/// let m = router.match_route(&Method::GET, "/pokemon/25").unwrap();
/// assert_eq!(*m.route, "getPokemon");
/// assert_eq!(m.params.get("id"), Some("25"));
/// ```
#[derive(Debug, Clone)]
pub struct Router<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a value under a method and path template.
    pub fn insert(&mut self, method: Method, template: &str, value: T) -> Result<(), PatternError> {
        let pattern = PathPattern::parse(template)?;
        self.insert_pattern(method, pattern, value);
        Ok(())
    }

    /// Registers a value under an already parsed pattern.
    pub fn insert_pattern(&mut self, method: Method, pattern: PathPattern, value: T) {
        self.entries.push(Entry {
            method,
            pattern,
            value,
        });
    }

    /// Finds the first entry matching the method and raw path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        self.entries
            .iter()
            .filter(|entry| entry.method == *method)
            .find_map(|entry| {
                entry.pattern.matches(path).map(|params| RouteMatch {
                    route: &entry.value,
                    params,
                })
            })
    }

    /// Returns the number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(method, pattern, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &PathPattern, &T)> {
        self.entries
            .iter()
            .map(|e| (&e.method, &e.pattern, &e.value))
    }
}
