//! Property tests for path matching.
//!
//! A path built from a template's literal segments with arbitrary values
//! substituted for its parameters must match that template (with the
//! template's method) and capture exactly the substituted values.

use accord_router::{PathPattern, Router, Segment};
use http::Method;
use proptest::prelude::*;

fn literal() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn param_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.~-]{1,12}"
}

/// Builds a template alternating literals and parameters, plus a concrete
/// path for it.
fn template_and_path() -> impl Strategy<Value = (String, String, Vec<(String, String)>)> {
    prop::collection::vec((literal(), prop::option::of(param_value())), 1..5).prop_map(|parts| {
        let mut template = String::new();
        let mut path = String::new();
        let mut captures = Vec::new();
        for (i, (lit, value)) in parts.into_iter().enumerate() {
            template.push('/');
            template.push_str(&lit);
            path.push('/');
            path.push_str(&lit);
            if let Some(value) = value {
                let name = format!("p{i}");
                template.push_str("/:");
                template.push_str(&name);
                path.push('/');
                path.push_str(&value);
                captures.push((name, value));
            }
        }
        (template, path, captures)
    })
}

proptest! {
    #[test]
    fn substituted_path_matches_its_template((template, path, captures) in template_and_path()) {
        let pattern = PathPattern::parse(&template).unwrap();
        let params = pattern.matches(&path).expect("path built from template must match");

        prop_assert_eq!(params.len(), captures.len());
        for (name, value) in &captures {
            prop_assert_eq!(params.get(name), Some(value.as_str()));
        }
    }

    #[test]
    fn other_method_never_matches((template, path, _) in template_and_path()) {
        let mut router = Router::new();
        router.insert(Method::GET, &template, ()).unwrap();

        prop_assert!(router.match_route(&Method::GET, &path).is_some());
        prop_assert!(router.match_route(&Method::POST, &path).is_none());
        prop_assert!(router.match_route(&Method::DELETE, &path).is_none());
    }

    #[test]
    fn extra_segment_never_matches((template, path, _) in template_and_path(), tail in literal()) {
        let pattern = PathPattern::parse(&template).unwrap();
        let longer = format!("{path}/{tail}");
        prop_assert!(pattern.matches(&longer).is_none());
    }

    #[test]
    fn parsed_segments_round_trip_to_template((template, _, _) in template_and_path()) {
        let pattern = PathPattern::parse(&template).unwrap();
        let rebuilt: String = pattern
            .segments()
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => format!("/{l}"),
                Segment::Param(p) => format!("/:{p}"),
            })
            .collect();
        prop_assert_eq!(rebuilt, template);
    }
}
