//! The dispatcher.
//!
//! [`Dispatcher::dispatch`] drives one request through
//! matching, validation, the handler, response checks and serialization.
//!
//! ```text
//! MATCHING ──no match──▶ 404, empty body
//!    │
//! VALIDATING ──failure──▶ 400 (Default / Combined), custom response, or Err
//!    │
//! HANDLING ──unhandled──▶ Err(Handler)
//!    │
//! RESPONSE CHECKS ──undeclared status on a strict route / invalid body──▶ Err(ResponseValidation)
//!    │
//! SERIALIZING ──▶ Response<Bytes>
//! ```
//!
//! The handler is the only await point. Nothing is shared between requests
//! except the read-only [`Implementation`] and [`DispatchOptions`].

use std::time::Instant;

use accord_core::{
    check_status, validate_response, Contract, RequestContext, RequestId, ResolvedRoute,
    ResponseSpec,
};
use accord_extract::{
    validate_request, ExtractOptions, ExtractionContext, RequestValidationError,
};
use accord_telemetry::{
    record_request, record_request_validation_failure, record_response_validation_failure,
};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{HeaderValue, Request, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn, Instrument};

use crate::error::DispatchError;
use crate::handler::{ApiResponse, HandlerOutcome, Implementation};
use crate::options::{DispatchOptions, ErrorMode};

/// Header read for a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const APPLICATION_JSON: &str = "application/json";

/// Routes requests to an [`Implementation`].
///
/// Cheap to share: wrap it in an `Arc` and call [`dispatch`](Self::dispatch)
/// from as many tasks as needed.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    implementation: Implementation,
    options: DispatchOptions,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(implementation: Implementation, options: DispatchOptions) -> Self {
        Self {
            implementation,
            options,
        }
    }

    /// The routed contract.
    #[must_use]
    pub fn contract(&self) -> &Contract {
        self.implementation.contract()
    }

    /// The dispatch options.
    #[must_use]
    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Handles one request.
    ///
    /// # Errors
    ///
    /// Returns `Err` for thrown request validation failures, response
    /// contract violations and unhandled handler errors. Every other
    /// outcome, including 404 and 400, is an `Ok` response.
    pub async fn dispatch(&self, request: Request<Bytes>) -> Result<Response<Bytes>, DispatchError> {
        let started = Instant::now();
        let (parts, body) = request.into_parts();

        let Some((route, params)) = self.contract().match_route(&parts.method, parts.uri.path())
        else {
            debug!(method = %parts.method, path = %parts.uri.path(), "no route matched");
            record_request("", StatusCode::NOT_FOUND.as_u16(), started.elapsed());
            return Ok(empty(StatusCode::NOT_FOUND)?);
        };

        let request_id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(RequestId::parse)
            .unwrap_or_default();

        let span = tracing::info_span!(
            "dispatch",
            route = %route.key(),
            method = %parts.method,
            request_id = %request_id,
        );

        let Parts {
            method,
            uri,
            headers,
            ..
        } = parts;
        let ctx = ExtractionContext::new(method, uri, headers, body, params);

        let result = self
            .dispatch_matched(route, ctx, request_id)
            .instrument(span)
            .await;

        let status = match &result {
            Ok(response) => response.status(),
            Err(err) => err.status_code(),
        };
        record_request(route.key().as_str(), status.as_u16(), started.elapsed());
        result
    }

    async fn dispatch_matched(
        &self,
        route: &ResolvedRoute,
        ctx: ExtractionContext,
        request_id: RequestId,
    ) -> Result<Response<Bytes>, DispatchError> {
        debug!(path = %route.path(), "route matched");

        let extract = ExtractOptions {
            json_query: self.options.json_query,
        };
        let validated = match validate_request(route, &ctx, extract) {
            Ok(validated) => validated,
            Err(err) => return self.reject(route, err),
        };

        let handler = self
            .implementation
            .handler(route)
            .ok_or_else(|| DispatchError::MissingHandler(route.key().to_string()))?;

        let (method, uri, headers) = (ctx.method().clone(), ctx.uri().clone(), ctx.headers().clone());
        let request_ctx = RequestContext::new(request_id, route.key().clone(), method, uri, headers);

        let outcome = match HandlerOutcome::from_result(handler(validated, request_ctx).await) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "handler failed");
                return Err(DispatchError::Handler {
                    route: route.key().to_string(),
                    error: err,
                });
            }
        };
        if outcome.is_thrown() {
            debug!("handler responded early");
        }

        let ApiResponse { status, body } = outcome.into_response();
        let body = self.check_response(route, status, body)?;
        serialize(route, status, body)
    }

    fn reject(
        &self,
        route: &ResolvedRoute,
        err: RequestValidationError,
    ) -> Result<Response<Bytes>, DispatchError> {
        for (part, _) in err.failures() {
            record_request_validation_failure(route.key().as_str(), part.as_str());
        }
        debug!(error = %err, "request validation failed");

        if self.options.throw_request_validation {
            return Err(DispatchError::RequestValidation {
                route: route.key().to_string(),
                error: err,
            });
        }

        match &self.options.error_mode {
            ErrorMode::Default => json_response(StatusCode::BAD_REQUEST, &err.first_only()),
            ErrorMode::Combined => json_response(StatusCode::BAD_REQUEST, &err),
            ErrorMode::Custom(f) => Ok(f(&err)),
        }
    }

    /// Enforces strict status codes, then validates the body when
    /// `response_validation` is on.
    fn check_response(
        &self,
        route: &ResolvedRoute,
        status: StatusCode,
        body: Option<Value>,
    ) -> Result<Option<Value>, DispatchError> {
        let checked = check_status(route, status).and_then(|()| {
            if self.options.response_validation {
                validate_response(route, status, body.as_ref())
            } else {
                Ok(body)
            }
        });

        checked.map_err(|err| {
            warn!(status = status.as_u16(), error = %err, "response broke the route contract");
            record_response_validation_failure(route.key().as_str());
            DispatchError::ResponseValidation(err)
        })
    }
}

/// Encodes the handler's body according to the declared response kind.
fn serialize(
    route: &ResolvedRoute,
    status: StatusCode,
    body: Option<Value>,
) -> Result<Response<Bytes>, DispatchError> {
    match route.response_for(status) {
        Some(ResponseSpec::NoBody) => empty(status),
        Some(ResponseSpec::Other { content_type, .. }) => {
            let bytes = match body {
                None => Bytes::new(),
                Some(Value::String(text)) => Bytes::from(text),
                Some(value) => Bytes::from(serde_json::to_vec(&value)?),
            };
            Ok(Response::builder()
                .status(status)
                .header(CONTENT_TYPE, content_type.as_str())
                .body(bytes)?)
        }
        _ => match body {
            Some(value) => json_response(status, &value),
            None => empty(status),
        },
    }
}

fn json_response<T: serde::Serialize>(
    status: StatusCode,
    body: &T,
) -> Result<Response<Bytes>, DispatchError> {
    let bytes = serde_json::to_vec(body)?;
    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
        .body(Bytes::from(bytes))?)
}

fn empty(status: StatusCode) -> Result<Response<Bytes>, DispatchError> {
    Ok(Response::builder().status(status).body(Bytes::new())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerError, HandlerResult};
    use accord_core::{ResponseSpec, RouteDescriptor, RouteTree, Shape};
    use accord_extract::ValidatedRequest;
    use http::Method;
    use serde_json::json;

    fn pokemon() -> Shape {
        Shape::object([("id", Shape::integer()), ("name", Shape::string())])
    }

    fn contract() -> Contract {
        RouteTree::new()
            .route(
                "get",
                RouteDescriptor::get("/pokemon/:id")
                    .path_params(Shape::object([("id", Shape::integer().coerce())]))
                    .response(StatusCode::OK, pokemon()),
            )
            .route(
                "create",
                RouteDescriptor::post("/pokemon")
                    .query(Shape::object([("dry_run", Shape::boolean().coerce().optional())]))
                    .body(Shape::object([("name", Shape::string().min_length(1))]))
                    .response(StatusCode::CREATED, pokemon())
                    .strict_status_codes(true),
            )
            .route(
                "sprite",
                RouteDescriptor::get("/pokemon/:id/sprite")
                    .response(StatusCode::OK, ResponseSpec::other("image/svg+xml")),
            )
            .build()
            .unwrap()
    }

    async fn get(req: ValidatedRequest, _ctx: RequestContext) -> HandlerResult {
        match req.param("id").and_then(Value::as_i64) {
            Some(1) => Ok(ApiResponse::ok(json!({"id": 1, "name": "Bulbasaur"}))),
            Some(2) => Ok(ApiResponse::ok(json!({"id": "two", "name": "Ivysaur"}))),
            Some(3) => Err(anyhow::anyhow!("storage offline").into()),
            _ => Err(HandlerError::Respond(ApiResponse::empty(StatusCode::NOT_FOUND))),
        }
    }

    async fn create(req: ValidatedRequest, _ctx: RequestContext) -> HandlerResult {
        if req.body["name"] == "teapot" {
            return Ok(ApiResponse::empty(StatusCode::IM_A_TEAPOT));
        }
        Ok(ApiResponse::new(
            StatusCode::CREATED,
            json!({"id": 7, "name": req.body["name"]}),
        ))
    }

    async fn sprite(_req: ValidatedRequest, _ctx: RequestContext) -> HandlerResult {
        Ok(ApiResponse::ok(json!("<svg/>")))
    }

    fn dispatcher(options: DispatchOptions) -> Dispatcher {
        let implementation = Implementation::builder(contract())
            .handle("get", get)
            .handle("create", create)
            .handle("sprite", sprite)
            .build()
            .unwrap();
        Dispatcher::new(implementation, options)
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(Bytes::from(body.to_string()))
            .unwrap()
    }

    fn json_body(response: &Response<Bytes>) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn test_coerced_params_reach_handler() {
        let d = dispatcher(DispatchOptions::default());
        let response = d.dispatch(request(Method::GET, "/pokemon/1", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(json_body(&response), json!({"id": 1, "name": "Bulbasaur"}));
    }

    #[tokio::test]
    async fn test_no_match_is_empty_404() {
        let d = dispatcher(DispatchOptions::default());
        let response = d.dispatch(request(Method::GET, "/trainers", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.body().is_empty());

        let response = d.dispatch(request(Method::DELETE, "/pokemon/1", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_default_mode_reports_first_failure() {
        let d = dispatcher(DispatchOptions::default());
        let response = d
            .dispatch(request(Method::POST, "/pokemon?dry_run=maybe", r#"{"name":""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(&response);
        assert!(body["queryParameterErrors"].is_object());
        assert_eq!(body["bodyErrors"], Value::Null);
        assert_eq!(body["pathParameterErrors"], Value::Null);
        assert_eq!(body["headerErrors"], Value::Null);
    }

    #[tokio::test]
    async fn test_combined_mode_reports_every_failure() {
        let d = dispatcher(DispatchOptions::default().error_mode(ErrorMode::Combined));
        let response = d
            .dispatch(request(Method::POST, "/pokemon?dry_run=maybe", r#"{"name":""}"#))
            .await
            .unwrap();
        let body = json_body(&response);
        assert!(body["queryParameterErrors"].is_object());
        assert!(body["bodyErrors"].is_object());
    }

    #[tokio::test]
    async fn test_custom_mode() {
        let d = dispatcher(DispatchOptions::default().error_mode(ErrorMode::custom(|err| {
            let parts: Vec<_> = err.failures().map(|(part, _)| part.as_str()).collect();
            Response::builder()
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .body(Bytes::from(parts.join(",")))
                .unwrap()
        })));
        let response = d
            .dispatch(request(Method::POST, "/pokemon", "{bad json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body().as_ref(), b"body");
    }

    #[tokio::test]
    async fn test_thrown_request_validation() {
        let d = dispatcher(DispatchOptions::default().throw_request_validation(true));
        let err = d
            .dispatch(request(Method::GET, "/pokemon/abc", ""))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let DispatchError::RequestValidation { route, error } = err else {
            panic!("expected request validation error");
        };
        assert_eq!(route, "get");
        assert!(error.path_params.is_some());
    }

    #[tokio::test]
    async fn test_thrown_response_is_serialized() {
        let d = dispatcher(DispatchOptions::default());
        let response = d.dispatch(request(Method::GET, "/pokemon/99", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_unhandled_error_propagates() {
        let d = dispatcher(DispatchOptions::default());
        let err = d.dispatch(request(Method::GET, "/pokemon/3", "")).await.unwrap_err();
        assert!(matches!(err, DispatchError::Handler { .. }));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_response_validation() {
        let lenient = dispatcher(DispatchOptions::default());
        let response = lenient
            .dispatch(request(Method::GET, "/pokemon/2", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let strict = dispatcher(DispatchOptions::default().response_validation(true));
        let err = strict
            .dispatch(request(Method::GET, "/pokemon/2", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::ResponseValidation(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_strict_status_enforced_without_response_validation() {
        let d = dispatcher(DispatchOptions::default());
        let err = d
            .dispatch(request(Method::POST, "/pokemon", r#"{"name":"teapot"}"#))
            .await
            .unwrap_err();
        let DispatchError::ResponseValidation(inner) = &err else {
            panic!("expected response validation error");
        };
        assert_eq!(inner.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = d
            .dispatch(request(Method::POST, "/pokemon", r#"{"name":"Mew"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_other_response_sent_verbatim() {
        let d = dispatcher(DispatchOptions::default());
        let response = d
            .dispatch(request(Method::GET, "/pokemon/1/sprite", ""))
            .await
            .unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "image/svg+xml");
        assert_eq!(response.body().as_ref(), b"<svg/>");
    }

    #[tokio::test]
    async fn test_request_id_header_is_used() {
        let contract = RouteTree::new()
            .route("whoami", RouteDescriptor::get("/whoami"))
            .build()
            .unwrap();
        let implementation = Implementation::builder(contract)
            .handle("whoami", |_req, ctx: RequestContext| async move {
                Ok(ApiResponse::ok(json!({
                    "request_id": ctx.request_id().to_string(),
                    "route": ctx.route_key().as_str(),
                })))
            })
            .build()
            .unwrap();
        let d = Dispatcher::new(implementation, DispatchOptions::default());

        let id = "018f2b8e-7c1a-7d3e-9f4b-2a6c8d0e1f23";
        let request = Request::builder()
            .uri("/whoami")
            .header(REQUEST_ID_HEADER, id)
            .body(Bytes::new())
            .unwrap();
        let response = d.dispatch(request).await.unwrap();
        assert_eq!(json_body(&response), json!({"request_id": id, "route": "whoami"}));
    }
}
