//! Response validation against a route's declared responses.

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::contract::ResolvedRoute;
use crate::route::ResponseSpec;
use crate::schema::{validate_if_schema, SchemaError, ValidateOptions};

/// A response that does not satisfy its route's contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseValidationError {
    /// A strict route returned a status it does not declare.
    #[error("route '{route}' returned undeclared status {status}")]
    UndeclaredStatus {
        /// Dotted route key.
        route: String,
        /// Returned status.
        status: StatusCode,
    },

    /// The body failed the declared schema.
    #[error("route '{route}' returned an invalid {status} body: {error}")]
    Invalid {
        /// Dotted route key.
        route: String,
        /// Returned status.
        status: StatusCode,
        /// Schema failure.
        error: SchemaError,
    },
}

impl ResponseValidationError {
    /// Returns the status the handler produced.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UndeclaredStatus { status, .. } | Self::Invalid { status, .. } => *status,
        }
    }
}

/// Checks only the status against a strict route's declarations.
pub fn check_status(route: &ResolvedRoute, status: StatusCode) -> Result<(), ResponseValidationError> {
    if route.strict_status_codes() && route.response_for(status).is_none() {
        return Err(ResponseValidationError::UndeclaredStatus {
            route: route.key().to_string(),
            status,
        });
    }
    Ok(())
}

/// Validates a response body, returning the body to send.
///
/// - a schema response validates the body (`None` is checked as `null`) and
///   returns the transformed value,
/// - an `Other` response validates against its schema when it has one,
/// - a `NoBody` response drops the body,
/// - an undeclared status passes through unless the route is strict.
pub fn validate_response(
    route: &ResolvedRoute,
    status: StatusCode,
    body: Option<&Value>,
) -> Result<Option<Value>, ResponseValidationError> {
    let invalid = |error: SchemaError| ResponseValidationError::Invalid {
        route: route.key().to_string(),
        status,
        error,
    };

    match route.response_for(status) {
        Some(ResponseSpec::Schema(schema)) => {
            let input = body.cloned().unwrap_or(Value::Null);
            let output = validate_if_schema(Some(schema), &input, ValidateOptions::default())
                .map_err(invalid)?;
            Ok(keep_absent(body, output))
        }
        Some(ResponseSpec::Other { schema, .. }) => {
            let input = body.cloned().unwrap_or(Value::Null);
            let output = validate_if_schema(schema.as_ref(), &input, ValidateOptions::default())
                .map_err(invalid)?;
            Ok(keep_absent(body, output))
        }
        Some(ResponseSpec::NoBody) => Ok(None),
        None => {
            check_status(route, status)?;
            Ok(body.cloned())
        }
    }
}

fn keep_absent(body: Option<&Value>, output: Value) -> Option<Value> {
    if body.is_none() && output.is_null() {
        None
    } else {
        Some(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RouteDescriptor, RouteTree, Shape};
    use serde_json::json;

    fn contract(strict: bool) -> crate::Contract {
        RouteTree::new()
            .strict_status_codes(strict)
            .route(
                "get",
                RouteDescriptor::get("/pokemon/:id")
                    .response(
                        StatusCode::OK,
                        Shape::object([("id", Shape::integer()), ("name", Shape::string())]),
                    )
                    .response(StatusCode::NO_CONTENT, ResponseSpec::NoBody)
                    .response(
                        StatusCode::ACCEPTED,
                        ResponseSpec::other_with_schema("text/plain", Shape::string()),
                    ),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_body_is_transformed() {
        let contract = contract(false);
        let route = contract.route("get").unwrap();
        let body = json!({"id": 1, "name": "Bulbasaur", "extra": true});
        let out = validate_response(route, StatusCode::OK, Some(&body)).unwrap();
        assert_eq!(out, Some(json!({"id": 1, "name": "Bulbasaur"})));
    }

    #[test]
    fn test_invalid_body() {
        let contract = contract(false);
        let route = contract.route("get").unwrap();
        let body = json!({"id": "one"});
        let err = validate_response(route, StatusCode::OK, Some(&body)).unwrap_err();
        match err {
            ResponseValidationError::Invalid { status, error, .. } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(error.issues.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_body_checked_as_null() {
        let contract = contract(false);
        let route = contract.route("get").unwrap();
        assert!(validate_response(route, StatusCode::OK, None).is_err());
    }

    #[test]
    fn test_no_body_drops_body() {
        let contract = contract(false);
        let route = contract.route("get").unwrap();
        let out = validate_response(route, StatusCode::NO_CONTENT, Some(&json!("x"))).unwrap();
        assert_eq!(out, None);
    }

    #[test]
    fn test_other_response_schema() {
        let contract = contract(false);
        let route = contract.route("get").unwrap();
        assert!(validate_response(route, StatusCode::ACCEPTED, Some(&json!("ok"))).is_ok());
        assert!(validate_response(route, StatusCode::ACCEPTED, Some(&json!(1))).is_err());
    }

    #[test]
    fn test_undeclared_status() {
        let lax = contract(false);
        let route = lax.route("get").unwrap();
        let out = validate_response(route, StatusCode::IM_A_TEAPOT, Some(&json!(1))).unwrap();
        assert_eq!(out, Some(json!(1)));

        let strict = contract(true);
        let route = strict.route("get").unwrap();
        let err = validate_response(route, StatusCode::IM_A_TEAPOT, None).unwrap_err();
        assert!(matches!(err, ResponseValidationError::UndeclaredStatus { .. }));
        assert_eq!(err.status(), StatusCode::IM_A_TEAPOT);
    }
}
