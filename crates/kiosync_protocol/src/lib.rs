//! # Kiosync Protocol
//!
//! Wire types and payload validation for the Kiosync sync gateway.
//!
//! This crate provides:
//! - `SyncFragment` / `SyncRequest` exchanged by replicas
//! - `ProvisionRequest` / `ProvisionResponse` for token provisioning
//! - Declarative, engine-neutral `Schema` descriptions of those payloads
//! - The validation adapter (`SchemaValidator`) and its engines
//! - `Slots`, the request-scoped typed storage staged validation writes into
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Validation
//!
//! ```
//! use kiosync_protocol::{provision_request_schema, ProvisionRequest, SchemaValidator};
//! use serde_json::json;
//!
//! let validator = SchemaValidator::<ProvisionRequest>::new(provision_request_schema());
//! let request = validator
//!     .validate(&json!({ "documentId": "doc1", "password": "secret" }))
//!     .unwrap();
//! assert_eq!(request.document_id, "doc1");
//!
//! let err = validator.validate(&json!({ "documentId": 7 })).unwrap_err();
//! assert_eq!(err.issues().len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod error;
mod messages;
mod schema;
mod slots;
mod validate;

pub use error::{MissingValue, PathSegment, ValidationError, ValidationIssue};
pub use messages::{ProvisionRequest, ProvisionResponse, SyncFragment, SyncRequest};
pub use schema::{provision_request_schema, sync_request_schema, JsonKind, Schema};
pub use slots::Slots;
pub use validate::{FailFastEngine, SchemaValidator, StructuralEngine, ValidationEngine};
