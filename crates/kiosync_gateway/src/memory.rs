//! In-memory reference engine.

use crate::engine::{DocumentEngine, DocumentMetadata, DocumentSummary, EngineError, EngineResult};
use kiosync_protocol::{SyncFragment, SyncRequest};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// In-memory document engine.
///
/// Keeps every document's metadata and the fragments replicas have sent.
/// It does not merge: a sync stores unseen fragments and answers with the
/// stored fragments the caller did not send, echoing the caller's merkle.
///
/// Fragments are identified by `(timestamp, table, row, column)`.
pub struct MemoryEngine {
    node_id: String,
    documents: RwLock<HashMap<String, StoredDocument>>,
}

struct StoredDocument {
    meta: DocumentMetadata,
    fragments: Vec<SyncFragment>,
}

impl StoredDocument {
    fn new() -> Self {
        Self {
            meta: DocumentMetadata {
                token: Uuid::new_v4().simple().to_string(),
            },
            fragments: Vec::new(),
        }
    }
}

impl MemoryEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self {
            node_id: Uuid::new_v4().simple().to_string(),
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the engine's own node identifier.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Returns the number of documents.
    pub fn document_count(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns the number of fragments stored for a document.
    pub fn fragment_count(&self, document_id: &str) -> usize {
        self.documents
            .read()
            .get(document_id)
            .map(|doc| doc.fragments.len())
            .unwrap_or(0)
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentEngine for MemoryEngine {
    async fn fetch_or_create_document(&self, document_id: &str) -> EngineResult<DocumentMetadata> {
        if let Some(doc) = self.documents.read().get(document_id) {
            return Ok(doc.meta.clone());
        }

        let mut documents = self.documents.write();
        let doc = documents.entry(document_id.to_string()).or_insert_with(|| {
            debug!(document_id, "creating document");
            StoredDocument::new()
        });
        Ok(doc.meta.clone())
    }

    async fn list_documents(&self) -> EngineResult<Vec<DocumentSummary>> {
        let mut summaries: Vec<_> = self
            .documents
            .read()
            .iter()
            .map(|(id, doc)| DocumentSummary {
                id: id.clone(),
                meta: doc.meta.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    async fn handle_sync(&self, document_id: &str, request: SyncRequest) -> EngineResult<Value> {
        let mut documents = self.documents.write();
        let doc = documents
            .get_mut(document_id)
            .ok_or_else(|| EngineError::Internal(format!("unknown document {document_id}")))?;

        let sent: HashSet<_> = request
            .fragments
            .iter()
            .map(|f| owned_key(f))
            .collect();

        let missing: Vec<SyncFragment> = doc
            .fragments
            .iter()
            .filter(|f| !sent.contains(&owned_key(f)))
            .cloned()
            .collect();

        let known: HashSet<_> = doc.fragments.iter().map(|f| owned_key(f)).collect();
        let mut added = 0usize;
        for fragment in request.fragments {
            if !known.contains(&owned_key(&fragment)) {
                doc.fragments.push(fragment);
                added += 1;
            }
        }

        debug!(
            document_id,
            node_id = %request.node_id,
            added,
            returned = missing.len(),
            "sync exchange"
        );

        Ok(json!({
            "nodeId": self.node_id,
            "fragments": missing,
            "merkle": request.merkle,
        }))
    }
}

fn owned_key(fragment: &SyncFragment) -> (String, String, String, String) {
    let (timestamp, table, row, column) = fragment.key();
    (
        timestamp.to_string(),
        table.to_string(),
        row.to_string(),
        column.to_string(),
    )
}
