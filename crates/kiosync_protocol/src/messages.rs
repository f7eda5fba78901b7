//! Protocol messages for sync and provisioning.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single field-level change with a causal timestamp.
///
/// Fragments are produced by a remote replica and consumed by the sync
/// engine. The gateway never interprets `timestamp` or `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFragment {
    /// Document the change belongs to.
    pub document_id: String,
    /// Opaque, totally ordered timestamp token.
    pub timestamp: String,
    /// Table name.
    pub table: String,
    /// Row identifier.
    pub row: String,
    /// Column name.
    pub column: String,
    /// New value. An absent value decodes as `null`.
    #[serde(default)]
    pub value: Value,
}

impl SyncFragment {
    /// Returns the identity used to recognise the same change twice.
    pub fn key(&self) -> (&str, &str, &str, &str) {
        (&self.timestamp, &self.table, &self.row, &self.column)
    }
}

/// Envelope sent by a replica on every sync exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Identifier of the calling replica.
    pub node_id: String,
    /// Changes known to the replica, in the order it sent them.
    pub fragments: Vec<SyncFragment>,
    /// Opaque state summary, forwarded to the engine untouched.
    #[serde(default)]
    pub merkle: Value,
}

impl SyncRequest {
    /// Creates a sync request.
    pub fn new(node_id: impl Into<String>, fragments: Vec<SyncFragment>, merkle: Value) -> Self {
        Self {
            node_id: node_id.into(),
            fragments,
            merkle,
        }
    }
}

/// Body of `POST /add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    /// Document to provision a token for.
    pub document_id: String,
    /// Admin secret.
    pub password: String,
}

/// Response of `POST /add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionResponse {
    /// The document's sync token.
    pub token: String,
}
