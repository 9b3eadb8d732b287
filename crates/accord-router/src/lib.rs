//! # Accord Router
//!
//! Path matching for Accord contracts.
//!
//! Routes are declared with `:name` parameter segments (`/pokemon/:id`).
//! A request matches a route when the method is equal and every path
//! segment lines up one-for-one with the template: literals compare
//! exactly, parameters capture any single segment. Trailing slashes are
//! significant and the first registered route wins on overlap.
//!
//! ```rust
//! use accord_router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(Method::GET, "/users/:userId/posts/:postId", 1).unwrap();
//!
//! let m = router.match_route(&Method::GET, "/users/7/posts/9").unwrap();
//! assert_eq!(*m.route, 1);
//! assert_eq!(m.params.get("userId"), Some("7"));
//! assert_eq!(m.params.get("postId"), Some("9"));
//! ```

#![doc(html_root_url = "https://docs.rs/accord-router/0.1.0")]

mod params;
mod pattern;
mod router;

pub use params::Params;
pub use pattern::{PathPattern, PatternError, Segment};
pub use router::{RouteMatch, Router};
