//! Sync engine facade.
//!
//! The gateway never merges state itself. Everything durable (documents,
//! their tokens, fragments) belongs to an implementation of
//! [`DocumentEngine`], which is also responsible for serializing concurrent
//! writes to one document.

use kiosync_protocol::SyncRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by a sync engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine cannot serve requests right now.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// Any other engine-internal failure.
    #[error("{0}")]
    Internal(String),
}

/// Per-document metadata held by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Sync token, minted on first access and stable afterwards.
    pub token: String,
}

/// A document as listed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document identifier.
    pub id: String,
    /// Document metadata.
    pub meta: DocumentMetadata,
}

/// The sync engine the gateway dispatches to.
pub trait DocumentEngine: Send + Sync + 'static {
    /// Returns the document's metadata, creating the document (with a fresh,
    /// globally unique token) on first access.
    fn fetch_or_create_document(
        &self,
        document_id: &str,
    ) -> impl Future<Output = EngineResult<DocumentMetadata>> + Send;

    /// Lists every known document.
    fn list_documents(&self) -> impl Future<Output = EngineResult<Vec<DocumentSummary>>> + Send;

    /// Reconciles a replica's request against server state and returns the
    /// response to send back.
    fn handle_sync(
        &self,
        document_id: &str,
        request: SyncRequest,
    ) -> impl Future<Output = EngineResult<Value>> + Send;
}
