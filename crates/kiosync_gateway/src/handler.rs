//! Endpoint handlers.

use crate::auth::{authorize_bearer, AdminGuard};
use crate::config::GatewayConfig;
use crate::context::{RequestContext, Stage};
use crate::engine::DocumentEngine;
use crate::error::{GatewayError, GatewayResult};
use kiosync_protocol::{
    provision_request_schema, sync_request_schema, FailFastEngine, ProvisionRequest,
    ProvisionResponse, SchemaValidator, SyncRequest, ValidationEngine,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs the provision and sync endpoints.
///
/// Handlers return the success body or an error; they never build error
/// responses themselves.
pub struct RequestHandler<E> {
    engine: Arc<E>,
    admin: AdminGuard,
    provision: SchemaValidator<ProvisionRequest>,
    sync: SchemaValidator<SyncRequest>,
}

impl<E: DocumentEngine> RequestHandler<E> {
    /// Creates a handler over `engine`.
    ///
    /// Installs the [`FailFastEngine`] when the configuration asks for it.
    pub fn new(engine: Arc<E>, config: &GatewayConfig) -> Self {
        let handler = Self {
            engine,
            admin: AdminGuard::new(&config.admin_password),
            provision: SchemaValidator::new(provision_request_schema()),
            sync: SchemaValidator::new(sync_request_schema()),
        };
        if config.fail_fast_validation {
            handler.with_validation_engine(Arc::new(FailFastEngine))
        } else {
            handler
        }
    }

    /// Installs a different validation engine for both endpoints.
    pub fn with_validation_engine(mut self, validation: Arc<dyn ValidationEngine>) -> Self {
        self.provision = self.provision.with_engine(Arc::clone(&validation));
        self.sync = self.sync.with_engine(validation);
        self
    }

    /// Returns the sync engine.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// `POST /add`: validates the body, checks the admin secret and returns
    /// the document's token, creating the document on first access.
    pub async fn provision(
        &self,
        ctx: &mut RequestContext,
        body: &Value,
    ) -> GatewayResult<Value> {
        self.provision.stage(ctx.slots_mut(), body)?;
        ctx.advance(Stage::Validated);

        let request = self.provision.get_value(ctx.slots())?;
        self.admin.check(&request.password)?;
        let document_id = request.document_id.clone();
        ctx.advance(Stage::Authorized);

        ctx.advance(Stage::Dispatched);
        let meta = self.engine.fetch_or_create_document(&document_id).await?;
        info!(document_id = %document_id, "token provisioned");

        serde_json::to_value(ProvisionResponse { token: meta.token })
            .map_err(|e| GatewayError::Internal(format!("failed to encode response: {e}")))
    }

    /// `POST /sync/{docId}`: authorizes the bearer token, validates the body
    /// and returns the engine's response verbatim.
    pub async fn sync(
        &self,
        ctx: &mut RequestContext,
        document_id: &str,
        authorization: Option<&str>,
        body: &Value,
    ) -> GatewayResult<Value> {
        let authorized = authorize_bearer(self.engine.as_ref(), authorization, document_id).await?;
        ctx.authorize(authorized);

        let request = self.sync.validate(body)?;
        ctx.advance(Stage::Validated);
        debug!(
            document_id,
            node_id = %request.node_id,
            fragments = request.fragments.len(),
            "dispatching sync"
        );

        ctx.advance(Stage::Dispatched);
        Ok(self.engine.handle_sync(document_id, request).await?)
    }
}
