//! Authorization checks.
//!
//! Two independent gates:
//! - [`AdminGuard`] protects token provisioning with one process-wide secret.
//! - [`authorize_bearer`] checks a per-document bearer token on sync calls.
//!
//! Secrets are compared through their SHA-256 digests in constant time. The
//! outcome is the same as plain string equality.

use crate::engine::DocumentEngine;
use crate::error::{GatewayError, GatewayResult};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Message for a wrong admin password.
pub const INVALID_PASSWORD: &str = "Invalid password";
/// Message for a request without an `Authorization` header.
pub const MISSING_AUTHORIZATION: &str = "Missing authorization header";
/// Message for a header that is not `Bearer <token>`.
pub const INVALID_AUTHORIZATION: &str = "Invalid authorization header";
/// Message for a token that does not match the document.
pub const INVALID_TOKEN: &str = "Invalid token";

/// Checks the admin secret on provisioning requests.
#[derive(Clone)]
pub struct AdminGuard {
    digest: [u8; 32],
}

impl AdminGuard {
    /// Creates a guard for the given secret.
    pub fn new(secret: &str) -> Self {
        Self {
            digest: digest(secret),
        }
    }

    /// Succeeds if `password` equals the admin secret.
    pub fn check(&self, password: &str) -> GatewayResult<()> {
        if digests_equal(&self.digest, &digest(password)) {
            Ok(())
        } else {
            Err(GatewayError::unauthorized(INVALID_PASSWORD))
        }
    }
}

impl std::fmt::Debug for AdminGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGuard").finish_non_exhaustive()
    }
}

/// Request-scoped result of a successful bearer check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
    /// The presented bearer token.
    pub token: String,
    /// The document the token was checked against.
    pub document_id: String,
}

/// Extracts the token from an `Authorization` header.
///
/// The header must split on single spaces into exactly `Bearer` and one
/// token of visible ASCII characters. An empty header counts as missing.
pub fn parse_bearer(header: Option<&str>) -> GatewayResult<&str> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => return Err(GatewayError::unauthorized(MISSING_AUTHORIZATION)),
    };

    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if token.bytes().all(|b| b.is_ascii_graphic()) => Ok(*token),
        _ => Err(GatewayError::unauthorized(INVALID_AUTHORIZATION)),
    }
}

/// Authorizes a sync call against `document_id`.
///
/// Header problems are reported first, then an unknown document
/// (`NotFound`), and only then a token mismatch.
pub async fn authorize_bearer<E: DocumentEngine>(
    engine: &E,
    header: Option<&str>,
    document_id: &str,
) -> GatewayResult<AuthorizationContext> {
    let token = parse_bearer(header)?;

    let documents = engine.list_documents().await?;
    let Some(document) = documents.into_iter().find(|d| d.id == document_id) else {
        debug!(document_id, "sync for unknown document");
        return Err(GatewayError::NotFound);
    };

    if !digests_equal(&digest(&document.meta.token), &digest(token)) {
        debug!(document_id, "token mismatch");
        return Err(GatewayError::unauthorized(INVALID_TOKEN));
    }

    Ok(AuthorizationContext {
        token: token.to_string(),
        document_id: document.id,
    })
}

fn digest(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

fn digests_equal(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngine;

    fn message(err: GatewayError) -> String {
        match err {
            GatewayError::Unauthorized(message) => message,
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn admin_guard() {
        let guard = AdminGuard::new("admin-secret");
        assert!(guard.check("admin-secret").is_ok());
        assert_eq!(message(guard.check("admin-secret ").unwrap_err()), INVALID_PASSWORD);
        assert_eq!(message(guard.check("").unwrap_err()), INVALID_PASSWORD);
    }

    #[test]
    fn admin_guard_debug_hides_digest() {
        assert_eq!(format!("{:?}", AdminGuard::new("x")), "AdminGuard { .. }");
    }

    #[test]
    fn parse_valid_header() {
        assert_eq!(parse_bearer(Some("Bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn parse_missing_header() {
        assert_eq!(message(parse_bearer(None).unwrap_err()), MISSING_AUTHORIZATION);
        assert_eq!(message(parse_bearer(Some("")).unwrap_err()), MISSING_AUTHORIZATION);
    }

    #[test]
    fn parse_malformed_headers() {
        for header in ["Bearer", "Bearer a b", "Bearer  abc", "Basic abc", "bearer abc", "abc"] {
            assert_eq!(
                message(parse_bearer(Some(header)).unwrap_err()),
                INVALID_AUTHORIZATION,
                "header {header:?}"
            );
        }
    }

    #[test]
    fn parse_non_ascii_token() {
        for header in ["Bearer t\u{f6}k", "Bearer t\u{fffd}k", "Bearer a\tb"] {
            assert_eq!(
                message(parse_bearer(Some(header)).unwrap_err()),
                INVALID_AUTHORIZATION,
                "header {header:?}"
            );
        }
    }

    #[test]
    fn parse_empty_token_is_well_formed() {
        assert_eq!(parse_bearer(Some("Bearer ")).unwrap(), "");
    }

    #[tokio::test]
    async fn unknown_document_before_token() {
        let engine = MemoryEngine::new();
        let result = authorize_bearer(&engine, Some("Bearer anything"), "doc1").await;
        assert!(matches!(result, Err(GatewayError::NotFound)));
    }

    #[tokio::test]
    async fn header_checked_before_document() {
        let engine = MemoryEngine::new();
        let result = authorize_bearer(&engine, None, "doc1").await;
        assert_eq!(message(result.unwrap_err()), MISSING_AUTHORIZATION);
    }

    #[tokio::test]
    async fn token_match_and_mismatch() {
        let engine = MemoryEngine::new();
        let meta = engine.fetch_or_create_document("doc1").await.unwrap();

        let header = format!("Bearer {}", meta.token);
        let context = authorize_bearer(&engine, Some(header.as_str()), "doc1").await.unwrap();
        assert_eq!(context.document_id, "doc1");
        assert_eq!(context.token, meta.token);

        let result = authorize_bearer(&engine, Some("Bearer wrong"), "doc1").await;
        assert_eq!(message(result.unwrap_err()), INVALID_TOKEN);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bearer_roundtrip(token in "[A-Za-z0-9_-]{0,40}") {
                let header = format!("Bearer {token}");
                prop_assert_eq!(parse_bearer(Some(header.as_str())).unwrap(), token.as_str());
            }

            #[test]
            fn other_schemes_rejected(scheme in "[A-Za-z]{1,10}", token in "[A-Za-z0-9]{1,20}") {
                prop_assume!(scheme != "Bearer");
                let header = format!("{scheme} {token}");
                prop_assert!(parse_bearer(Some(header.as_str())).is_err());
            }

            #[test]
            fn extra_parts_rejected(parts in proptest::collection::vec("[A-Za-z0-9]{0,8}", 3..6)) {
                let header = format!("Bearer {}", parts.join(" "));
                prop_assert!(parse_bearer(Some(header.as_str())).is_err());
            }
        }
    }
}
