//! In-memory test client.

use std::sync::Arc;

use accord_client::{ApiClient, ClientError, ClientOptions, Transport};
use accord_server::{DispatchOptions, Dispatcher, Implementation, Server, ServerConfig};
use bytes::Bytes;
use http::{Method, Request, Response};

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Base URL used when the test client backs an [`ApiClient`].
pub const TEST_BASE_URL: &str = "http://accord.test";

/// Sends requests straight into a [`Server`] without binding a port.
///
/// Requests take the same path as over the network after the body is read:
/// dispatch, then error mapping through the server's error handler.
///
/// # Example
///
/// ```ignore
/// use accord_test::TestClient;
///
/// let client = TestClient::from_implementation(implementation, DispatchOptions::default());
/// let response = client.get("/pokemon/25").send().await;
/// response.assert_status(200u16);
/// ```
#[derive(Debug, Clone)]
pub struct TestClient {
    server: Arc<Server>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Wraps a configured server.
    pub fn new(server: Server) -> Self {
        Self {
            server: Arc::new(server),
            default_headers: Vec::new(),
        }
    }

    /// Wraps a dispatcher in a server with default settings.
    pub fn from_dispatcher(dispatcher: impl Into<Arc<Dispatcher>>) -> Self {
        Self::new(Server::new(dispatcher, ServerConfig::default()))
    }

    /// Builds a dispatcher for `implementation` and wraps it.
    pub fn from_implementation(implementation: Implementation, options: DispatchOptions) -> Self {
        Self::from_dispatcher(Dispatcher::new(implementation, options))
    }

    /// Adds a header sent with every request built by this client.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Returns the wrapped server.
    #[must_use]
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Creates a contract-aware client that sends through this one.
    pub fn api_client(&self, options: ClientOptions) -> ApiClient<TestClient> {
        let contract = Arc::new(self.server.dispatcher().contract().clone());
        ApiClient::new(contract, self.clone(), options)
    }

    /// Same as [`api_client`](Self::api_client) with [`TEST_BASE_URL`] and
    /// default options.
    pub fn default_api_client(&self) -> ApiClient<TestClient> {
        self.api_client(ClientOptions::new(TEST_BASE_URL))
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a PATCH request builder.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a request builder with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let mut builder = TestRequestBuilder::new(method, uri);
        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }
        TestClientRequest {
            client: self,
            builder,
        }
    }

    /// Sends a prepared request.
    pub async fn send_request(&self, request: Request<Bytes>) -> TestResponse {
        TestResponse::from_http(self.server.respond(request).await)
    }
}

impl Transport for TestClient {
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, ClientError> {
        Ok(self.server.respond(request).await)
    }
}

/// A request builder bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Appends a query pair.
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.builder = self.builder.query(name, value);
        self
    }

    /// Appends an already-encoded query string.
    pub fn raw_query(mut self, raw: impl Into<String>) -> Self {
        self.builder = self.builder.raw_query(raw);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets a bracket-encoded form body.
    pub fn form(mut self, value: &serde_json::Value) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built; use
    /// [`try_send`](Self::try_send) to handle that case.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("failed to build test request: {e}"),
        }
    }

    /// Sends the request, returning build errors.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        Ok(self.client.send_request(request).await)
    }
}
