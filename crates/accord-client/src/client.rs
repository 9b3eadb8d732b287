//! Contract-bound client.

use std::future::Future;
use std::sync::Arc;

use accord_core::{validate_response, Contract};
use bytes::Bytes;
use http::{Request, Response};
use tracing::debug;

use crate::error::ClientError;
use crate::request::{build_request, ClientArgs, ClientOptions};
use crate::response::ClientResponse;

/// Sends a built request and returns the raw response.
///
/// Implementations decide how bytes reach the server: a real HTTP stack, or
/// an in-process dispatcher in tests.
pub trait Transport: Send + Sync {
    /// Sends one request.
    fn send(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>, ClientError>> + Send;
}

/// Calls the routes of a contract by key.
///
/// Requests are built from the route's declaration; responses are decoded
/// and, when enabled, validated against the declared response for the
/// status.
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    contract: Arc<Contract>,
    transport: T,
    options: ClientOptions,
}

impl<T: Transport> ApiClient<T> {
    /// Creates a client.
    pub fn new(contract: impl Into<Arc<Contract>>, transport: T, options: ClientOptions) -> Self {
        Self {
            contract: contract.into(),
            transport,
            options,
        }
    }

    /// Returns the contract.
    #[must_use]
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Calls the route registered under `route_key`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UnknownRoute`] for a key not in the contract
    /// - request building errors (missing path params, bad headers)
    /// - transport and decode errors
    /// - [`ClientError::UnknownStatus`] when `throw_on_unknown_status` is set
    ///   and the route declares nothing for the status
    /// - [`ClientError::ResponseValidation`] when `validate_response` is set
    ///   and the body fails the declared schema
    pub async fn call(&self, route_key: &str, args: ClientArgs) -> Result<ClientResponse, ClientError> {
        let route = self
            .contract
            .route(route_key)
            .ok_or_else(|| ClientError::UnknownRoute(route_key.to_string()))?;

        let request = build_request(route, args, &self.options)?;
        debug!(route = route_key, method = %request.method, url = %request.url, "Sending request");

        let raw = self.transport.send(request.into_http()?).await?;
        let mut response = ClientResponse::decode(raw)?;
        debug!(route = route_key, status = response.status.as_u16(), "Received response");

        if self.options.throw_on_unknown_status && route.response_for(response.status).is_none() {
            return Err(ClientError::UnknownStatus {
                route: route_key.to_string(),
                status: response.status,
            });
        }

        if self.options.validate_response {
            response.body = validate_response(route, response.status, response.body.as_ref())?;
        }

        Ok(response)
    }
}
