//! # Kiosync Gateway
//!
//! The authenticated front door of the Kiosync document-sync service.
//!
//! This crate provides:
//! - Token provisioning (`POST /add`), gated by a process-wide admin secret
//! - Sync exchange (`POST /sync/{docId}`), gated by a per-document bearer token
//! - Schema validation of both payloads
//! - Translation of every failure into a uniform `{ status, message }` body
//!
//! # Architecture
//!
//! Each request runs strictly in sequence through one pipeline:
//!
//! ```text
//! Received → BodyDecoded → Validated / Authorized → Dispatched → Responded
//!                       \________________ Failed(status) _______________/
//! ```
//!
//! The gateway holds no mutable state. Documents, tokens and fragments live
//! in a [`DocumentEngine`]; [`MemoryEngine`] is an in-memory reference
//! implementation. HTTP transport, CORS and JSON decoding happen outside this
//! crate; the transport hands over a [`GatewayRequest`] and serializes the
//! [`GatewayResponse`].
//!
//! There is no timeout at this layer. A transport that drops the
//! [`Gateway::handle`] future when its connection closes cancels the request.
//!
//! # Example
//!
//! ```
//! use kiosync_gateway::{Gateway, GatewayConfig, GatewayRequest, MemoryEngine};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let gateway = Gateway::new(MemoryEngine::new(), &GatewayConfig::new("admin-secret"));
//!
//! let response = gateway
//!     .handle(GatewayRequest::post(
//!         "/add",
//!         json!({ "documentId": "doc1", "password": "admin-secret" }),
//!     ))
//!     .await;
//! assert_eq!(response.status, 200);
//! let token = response.body["token"].as_str().unwrap().to_string();
//!
//! let response = gateway
//!     .handle(
//!         GatewayRequest::post("/sync/doc1", json!({ "nodeId": "n1", "fragments": [], "merkle": {} }))
//!             .with_authorization(format!("Bearer {token}")),
//!     )
//!     .await;
//! assert_eq!(response.status, 200);
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod context;
mod engine;
mod error;
mod gateway;
mod handler;
mod memory;
mod router;

pub use auth::{
    authorize_bearer, parse_bearer, AdminGuard, AuthorizationContext, INVALID_AUTHORIZATION,
    INVALID_PASSWORD, INVALID_TOKEN, MISSING_AUTHORIZATION,
};
pub use config::{GatewayConfig, DEFAULT_MAX_BODY_BYTES};
pub use context::{RequestContext, Stage};
pub use engine::{DocumentEngine, DocumentMetadata, DocumentSummary, EngineError, EngineResult};
pub use error::{ErrorBody, ErrorStatus, GatewayError, GatewayResult};
pub use gateway::{translate, Gateway, GatewayRequest, GatewayResponse};
pub use handler::RequestHandler;
pub use memory::MemoryEngine;
pub use router::Route;
