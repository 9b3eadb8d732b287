//! HTTP transport adapter.
//!
//! [`Server`] accepts TCP connections, serves HTTP/1.1 with hyper, collects
//! each body and hands the request to a shared [`Dispatcher`]. Errors the
//! dispatcher returns become responses through an optional
//! [`ErrorHandler`] or the default JSON envelope.
//!
//! # Example
//!
//! ```rust,ignore
//! use accord_server::{DispatchOptions, Dispatcher, Server, ServerConfig};
//!
//! let dispatcher = Dispatcher::new(implementation, DispatchOptions::default());
//! let server = Server::new(dispatcher, ServerConfig::builder().http_addr("0.0.0.0:8080").build());
//! server.run().await?;
//! ```

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use accord_core::ErrorEnvelope;
use accord_telemetry::InFlightGuard;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::dispatch::{Dispatcher, REQUEST_ID_HEADER};
use crate::error::{DispatchError, ServerError};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Maps a dispatch error to a response.
pub type ErrorHandler = Arc<dyn Fn(&DispatchError) -> Response<Bytes> + Send + Sync>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<Full<Bytes>>;

/// Serves a [`Dispatcher`] over HTTP/1.1.
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    error_handler: Option<ErrorHandler>,
}

impl Server {
    /// Creates a server for `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: impl Into<Arc<Dispatcher>>, config: ServerConfig) -> Self {
        Self {
            config,
            dispatcher: dispatcher.into(),
            error_handler: None,
        }
    }

    /// Replaces the default error mapping.
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&DispatchError) -> Response<Bytes> + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// Server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The shared dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Runs until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and runs until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::BindError(format!("Invalid address '{}': {}", self.config.http_addr(), e))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(format!("Failed to bind to {}: {}", addr, e)))?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// fires, then waits up to the shutdown timeout for open connections.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::IoError(e.to_string()))?;
        tracing::info!("Server listening on {}", local_addr);

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                    tracing::error!("Connection error from {}: {}", remote_addr, e);
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }

                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            "Waiting up to {:?} for {} connections to close",
            shutdown_timeout,
            tracker.active_connections()
        );

        tokio::select! {
            _ = tracker.wait_for_shutdown() => {
                tracing::info!("All connections closed");
            }
            _ = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    "Shutdown timeout reached, {} connections still active",
                    tracker.active_connections()
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { server.handle_request(req).await }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => return result,
            () = shutdown.recv() => {
                tracing::debug!("Draining connection from {} for shutdown", remote_addr);
                conn.as_mut().graceful_shutdown();
            }
        }

        // In-flight requests complete; the connection closes after the last response.
        conn.await
    }

    async fn handle_request(&self, req: Request<Incoming>) -> Result<HttpResponse, Infallible> {
        let _in_flight = InFlightGuard::new();
        let timeout = self.config.request_timeout();
        let (parts, body) = req.into_parts();

        let body = match tokio::time::timeout(timeout, body.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::error!("Failed to collect request body: {}", e);
                let envelope = ErrorEnvelope::new(
                    "BODY_READ_ERROR",
                    format!("Failed to read request body: {}", e),
                );
                return Ok(envelope_response(StatusCode::BAD_REQUEST, &envelope).map(Full::new));
            }
            Err(_) => {
                tracing::warn!("Request body collection timed out");
                let envelope =
                    ErrorEnvelope::new("REQUEST_TIMEOUT", "Request body collection timed out");
                return Ok(envelope_response(StatusCode::REQUEST_TIMEOUT, &envelope).map(Full::new));
            }
        };

        let request = Request::from_parts(parts, body);
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let response = match tokio::time::timeout(timeout, self.respond(request)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!("Dispatch timed out for {} {}", method, path);
                let envelope = ErrorEnvelope::new("HANDLER_TIMEOUT", "Handler execution timed out");
                envelope_response(StatusCode::GATEWAY_TIMEOUT, &envelope)
            }
        };
        Ok(response.map(Full::new))
    }

    /// Dispatches a collected request and maps any error to a response.
    pub async fn respond(&self, request: Request<Bytes>) -> Response<Bytes> {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match self.dispatcher.dispatch(request).await {
            Ok(response) => response,
            Err(err) => self.error_response(&err, request_id.as_deref()),
        }
    }

    fn error_response(&self, err: &DispatchError, request_id: Option<&str>) -> Response<Bytes> {
        if let Some(handler) = &self.error_handler {
            return handler(err);
        }

        let mut envelope = err.to_envelope();
        if let Some(id) = request_id {
            envelope = envelope.with_request_id(id);
        }
        envelope_response(err.status_code(), &envelope)
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

fn envelope_response(status: StatusCode, envelope: &ErrorEnvelope) -> Response<Bytes> {
    let body = serde_json::to_vec(envelope).unwrap_or_default();

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Bytes::from(body))
        .unwrap_or_else(|_| {
            let mut response = Response::new(Bytes::new());
            *response.status_mut() = status;
            response
        })
}
