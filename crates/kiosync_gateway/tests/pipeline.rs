//! End-to-end tests of the request pipeline.

use kiosync_gateway::{
    DocumentEngine, DocumentMetadata, DocumentSummary, EngineError, EngineResult, Gateway,
    GatewayConfig, GatewayRequest, GatewayResponse, MemoryEngine,
};
use kiosync_protocol::SyncRequest;
use serde_json::{json, Value};
use std::sync::Arc;

const ADMIN: &str = "admin-secret";

fn create_gateway() -> Gateway<MemoryEngine> {
    Gateway::new(MemoryEngine::new(), &GatewayConfig::new(ADMIN))
}

fn sync_body() -> Value {
    json!({
        "nodeId": "node-a",
        "fragments": [{
            "documentId": "doc1",
            "timestamp": "2024-03-01T10:00:00.000Z-0000-node-a",
            "table": "todos",
            "row": "r1",
            "column": "title",
            "value": "buy milk"
        }],
        "merkle": { "hash": 1234, "children": {} }
    })
}

async fn provision<E: DocumentEngine>(gateway: &Gateway<E>, document_id: &str) -> String {
    let response = gateway
        .handle(GatewayRequest::post(
            "/add",
            json!({ "documentId": document_id, "password": ADMIN }),
        ))
        .await;
    assert_eq!(response.status, 200, "{:?}", response.body);
    response.body["token"].as_str().unwrap().to_string()
}

async fn sync_with(gateway: &Gateway<MemoryEngine>, doc: &str, header: Option<&str>) -> GatewayResponse {
    let mut request = GatewayRequest::post(format!("/sync/{doc}"), sync_body());
    request.authorization = header.map(str::to_string);
    gateway.handle(request).await
}

fn assert_error(response: &GatewayResponse, status: u16, kind: &str, message: &str) {
    assert_eq!(response.status, status, "{:?}", response.body);
    assert_eq!(response.body["status"], kind);
    assert_eq!(response.body["message"], message);
}

#[tokio::test]
async fn provision_then_sync() {
    let gateway = create_gateway();
    let token = provision(&gateway, "doc1").await;

    let header = format!("Bearer {token}");
    let response = sync_with(&gateway, "doc1", Some(header.as_str())).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["fragments"], json!([]));
    assert_eq!(response.body["merkle"], json!({ "hash": 1234, "children": {} }));

    let response = sync_with(&gateway, "doc1", Some("Bearer wrong")).await;
    assert_error(&response, 401, "Unauthorized", "Invalid token");
}

#[tokio::test]
async fn second_replica_receives_first_replica_fragments() {
    let gateway = create_gateway();
    let token = provision(&gateway, "doc1").await;
    let header = format!("Bearer {token}");

    sync_with(&gateway, "doc1", Some(header.as_str())).await;

    let response = gateway
        .handle(
            GatewayRequest::post(
                "/sync/doc1",
                json!({ "nodeId": "node-b", "fragments": [], "merkle": null }),
            )
            .with_authorization(header.as_str()),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body["fragments"][0]["value"], "buy milk");
}

#[tokio::test]
async fn provisioning_is_idempotent() {
    let gateway = create_gateway();
    let first = provision(&gateway, "doc1").await;
    let second = provision(&gateway, "doc1").await;
    let other = provision(&gateway, "doc2").await;

    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(gateway.engine().document_count(), 2);
}

#[tokio::test]
async fn provisioning_rejects_wrong_password() {
    let gateway = create_gateway();
    let response = gateway
        .handle(GatewayRequest::post(
            "/add",
            json!({ "documentId": "doc1", "password": "guess" }),
        ))
        .await;

    assert_error(&response, 401, "Unauthorized", "Invalid password");
    assert_eq!(gateway.engine().document_count(), 0);
}

#[tokio::test]
async fn malformed_provision_body_names_every_field() {
    let gateway = create_gateway();
    let response = gateway
        .handle(GatewayRequest::post("/add", json!({ "documentId": 42 })))
        .await;

    assert_error(
        &response,
        400,
        "BadRequest",
        "Schema validation failed:   documentId: Expected string, received number,  password: Required",
    );
}

#[tokio::test]
async fn missing_provision_body() {
    let gateway = create_gateway();
    let response = gateway.handle(GatewayRequest::post("/add", Value::Null)).await;

    assert_error(
        &response,
        400,
        "BadRequest",
        "Schema validation failed:   : Expected object, received null",
    );
}

#[tokio::test]
async fn malformed_sync_body_names_every_field() {
    let gateway = create_gateway();
    let token = provision(&gateway, "doc1").await;

    let response = gateway
        .handle(
            GatewayRequest::post(
                "/sync/doc1",
                json!({
                    "fragments": [
                        { "documentId": "doc1", "timestamp": "t", "table": "t", "row": "r", "column": "c" },
                        { "documentId": "doc1", "timestamp": 5, "table": "t", "row": "r" }
                    ]
                }),
            )
            .with_authorization(format!("Bearer {token}")),
        )
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.body["status"], "BadRequest");
    let message = response.body["message"].as_str().unwrap();
    assert!(message.starts_with("Schema validation failed: "));
    assert!(message.contains("nodeId: Required"));
    assert!(message.contains("fragments.1.timestamp: Expected string, received number"));
    assert!(message.contains("fragments.1.column: Required"));
    assert!(!message.contains("fragments.0"));
    assert_eq!(gateway.engine().fragment_count("doc1"), 0);
}

#[tokio::test]
async fn missing_authorization_header() {
    let gateway = create_gateway();
    provision(&gateway, "doc1").await;

    let response = sync_with(&gateway, "doc1", None).await;
    assert_error(&response, 401, "Unauthorized", "Missing authorization header");
}

#[tokio::test]
async fn malformed_authorization_headers() {
    let gateway = create_gateway();
    let token = provision(&gateway, "doc1").await;

    let headers = [
        token.clone(),
        format!("Bearer {token} extra"),
        format!("Bearer  {token}"),
        format!("Token {token}"),
        "Bearer".to_string(),
    ];
    for header in &headers {
        let response = sync_with(&gateway, "doc1", Some(header.as_str())).await;
        assert_error(&response, 401, "Unauthorized", "Invalid authorization header");
    }
}

#[tokio::test]
async fn unknown_document_is_not_found_before_token_check() {
    let gateway = create_gateway();
    let token = provision(&gateway, "doc1").await;

    let response = sync_with(&gateway, "doc2", Some("Bearer wrong")).await;
    assert_error(&response, 404, "NotFound", "Not Found");

    let header = format!("Bearer {token}");
    let response = sync_with(&gateway, "doc2", Some(header.as_str())).await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn percent_encoded_document_id_reaches_handlers_decoded() {
    let gateway = create_gateway();
    let token = provision(&gateway, "my doc").await;

    let header = format!("Bearer {token}");
    let response = sync_with(&gateway, "my%20doc", Some(header.as_str())).await;
    assert_eq!(response.status, 200, "{:?}", response.body);
    assert_eq!(gateway.engine().fragment_count("my doc"), 1);
}

#[tokio::test]
async fn empty_document_id_is_not_provisioned() {
    let gateway = create_gateway();
    let response = gateway
        .handle(GatewayRequest::post(
            "/add",
            json!({ "documentId": "", "password": ADMIN }),
        ))
        .await;

    assert_error(
        &response,
        400,
        "BadRequest",
        "Schema validation failed:   documentId: String must contain at least 1 character(s)",
    );
    assert_eq!(gateway.engine().document_count(), 0);
}

#[tokio::test]
async fn token_mismatch_never_yields_not_found() {
    let gateway = create_gateway();
    provision(&gateway, "doc1").await;
    let other = provision(&gateway, "doc2").await;

    let header = format!("Bearer {other}");
    let response = sync_with(&gateway, "doc1", Some(header.as_str())).await;
    assert_error(&response, 401, "Unauthorized", "Invalid token");
}

#[tokio::test]
async fn concurrent_provisioning_yields_one_token() {
    let gateway = Arc::new(create_gateway());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { provision(&*gateway, "shared").await })
        })
        .collect();

    let mut tokens = Vec::new();
    for task in tasks {
        tokens.push(task.await.unwrap());
    }
    tokens.dedup();
    assert_eq!(tokens.len(), 1);
}

/// Engine that knows one document and fails every sync.
struct BrokenEngine {
    panic_on_sync: bool,
}

impl DocumentEngine for BrokenEngine {
    async fn fetch_or_create_document(&self, _document_id: &str) -> EngineResult<DocumentMetadata> {
        Err(EngineError::Unavailable("storage offline at /var/lib/kiosync".into()))
    }

    async fn list_documents(&self) -> EngineResult<Vec<DocumentSummary>> {
        Ok(vec![DocumentSummary {
            id: "doc1".into(),
            meta: DocumentMetadata {
                token: "known".into(),
            },
        }])
    }

    async fn handle_sync(&self, _document_id: &str, _request: SyncRequest) -> EngineResult<Value> {
        if self.panic_on_sync {
            panic!("merge invariant violated");
        }
        Err(EngineError::Internal("merkle diff failed: row r1".into()))
    }
}

#[tokio::test]
async fn engine_failures_are_opaque() {
    let gateway = Gateway::new(BrokenEngine { panic_on_sync: false }, &GatewayConfig::new(ADMIN));

    let response = gateway
        .handle(GatewayRequest::post("/sync/doc1", sync_body()).with_authorization("Bearer known"))
        .await;
    assert_error(&response, 500, "InternalError", "Internal Server Error");

    let response = gateway
        .handle(GatewayRequest::post(
            "/add",
            json!({ "documentId": "doc1", "password": ADMIN }),
        ))
        .await;
    assert_error(&response, 500, "InternalError", "Internal Server Error");
}

#[tokio::test]
async fn engine_panic_still_gets_a_response() {
    let gateway = Gateway::new(BrokenEngine { panic_on_sync: true }, &GatewayConfig::new(ADMIN));

    let response = gateway
        .handle(GatewayRequest::post("/sync/doc1", sync_body()).with_authorization("Bearer known"))
        .await;
    assert_error(&response, 500, "InternalError", "Internal Server Error");
}
