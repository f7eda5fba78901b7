//! Route selection.

use crate::error::{GatewayError, GatewayResult};
use percent_encoding::percent_decode_str;

/// The gateway's endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `POST /add`
    Provision,
    /// `POST /sync/{docId}`
    Sync {
        /// The `docId` path parameter.
        document_id: String,
    },
}

impl Route {
    /// Selects the route for a method and path.
    ///
    /// `path` is the raw request path; the `docId` segment is percent-decoded
    /// after splitting, so `%2F` stays part of the id. A single trailing
    /// slash is ignored. Unknown paths, and ids that do not decode to UTF-8,
    /// are `NotFound`; known paths with a method other than `POST` are
    /// `MethodNotAllowed`.
    pub fn resolve(method: &str, path: &str) -> GatewayResult<Route> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let segments: Vec<&str> = trimmed.split('/').collect();

        let route = match segments.as_slice() {
            ["add"] => Route::Provision,
            ["sync", document_id] if !document_id.is_empty() => Route::Sync {
                document_id: decode_segment(document_id)?,
            },
            _ => return Err(GatewayError::NotFound),
        };

        if method != "POST" {
            return Err(GatewayError::MethodNotAllowed);
        }
        Ok(route)
    }
}

fn decode_segment(segment: &str) -> GatewayResult<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| GatewayError::NotFound)
}
