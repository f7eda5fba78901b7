//! The request pipeline entry point.

use crate::config::GatewayConfig;
use crate::context::{RequestContext, Stage};
use crate::engine::DocumentEngine;
use crate::error::{GatewayError, GatewayResult};
use crate::handler::RequestHandler;
use crate::router::Route;
use futures_util::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info_span, Instrument};

/// A request as handed over by the transport.
///
/// The transport has already decoded the body into JSON and pulled out the
/// `Authorization` header.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    /// HTTP method, e.g. `POST`.
    pub method: String,
    /// Request path as received, still percent-encoded, without the query string.
    pub path: String,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// Decoded JSON body; `null` when the request had none.
    pub body: Value,
}

impl GatewayRequest {
    /// Creates a `POST` request.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: "POST".into(),
            path: path.into(),
            authorization: None,
            body,
        }
    }

    /// Sets the `Authorization` header.
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }
}

/// A response for the transport to serialize.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Value,
}

impl GatewayResponse {
    /// A `200` response.
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

/// Converts an error into its uniform response.
///
/// Server errors are logged with their detail, which never reaches the body.
pub fn translate(err: &GatewayError) -> GatewayResponse {
    let status = err.status();
    if err.is_server_error() {
        error!(error = %err, "request failed");
    } else {
        debug!(status = %status, error = %err, "request rejected");
    }

    GatewayResponse {
        status: status.code(),
        body: err.to_body().to_json(),
    }
}

/// The authenticated request pipeline.
///
/// Holds no per-request state and can serve any number of requests
/// concurrently behind an `Arc`. Every call to [`handle`](Self::handle)
/// produces a response, including when the engine fails or panics.
pub struct Gateway<E> {
    handler: RequestHandler<E>,
}

impl<E: DocumentEngine> Gateway<E> {
    /// Creates a gateway over `engine`.
    pub fn new(engine: E, config: &GatewayConfig) -> Self {
        Self::with_engine(Arc::new(engine), config)
    }

    /// Creates a gateway over a shared engine.
    pub fn with_engine(engine: Arc<E>, config: &GatewayConfig) -> Self {
        Self {
            handler: RequestHandler::new(engine, config),
        }
    }

    /// Returns the sync engine.
    pub fn engine(&self) -> &Arc<E> {
        self.handler.engine()
    }

    /// Runs one request through the pipeline.
    pub async fn handle(&self, request: GatewayRequest) -> GatewayResponse {
        let span = info_span!("request", method = %request.method, path = %request.path);

        async move {
            let mut ctx = RequestContext::new();
            ctx.advance(Stage::BodyDecoded);

            let outcome = AssertUnwindSafe(self.dispatch(&mut ctx, &request))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(GatewayError::Internal("handler panicked".into())));

            match outcome {
                Ok(body) => {
                    ctx.advance(Stage::Responded);
                    debug!(
                        document_id = ctx.authorization().map(|auth| auth.document_id.as_str()),
                        "request complete"
                    );
                    GatewayResponse::ok(body)
                }
                Err(err) => {
                    ctx.fail(err.status());
                    translate(&err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        ctx: &mut RequestContext,
        request: &GatewayRequest,
    ) -> GatewayResult<Value> {
        match Route::resolve(&request.method, &request.path)? {
            Route::Provision => self.handler.provision(ctx, &request.body).await,
            Route::Sync { document_id } => {
                self.handler
                    .sync(
                        ctx,
                        &document_id,
                        request.authorization.as_deref(),
                        &request.body,
                    )
                    .await
            }
        }
    }
}
