//! Gateway configuration.

use std::fmt;
use std::net::SocketAddr;

/// Default request body limit: 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Configuration for the gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Process-wide admin secret required by `POST /add`.
    pub admin_password: String,
    /// Whether the HTTP binding answers CORS preflights.
    pub allow_cors: bool,
    /// Largest request body the HTTP binding buffers.
    pub max_body_bytes: usize,
    /// Report only the first validation issue instead of all of them.
    pub fail_fast_validation: bool,
}

impl GatewayConfig {
    /// Creates a new configuration bound to `127.0.0.1:8080`.
    pub fn new(admin_password: impl Into<String>) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            admin_password: admin_password.into(),
            allow_cors: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            fail_fast_validation: false,
        }
    }

    /// Sets the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Enables or disables CORS handling.
    pub fn with_cors(mut self, allow: bool) -> Self {
        self.allow_cors = allow;
        self
    }

    /// Sets the request body limit in bytes.
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Stops validation at the first issue.
    pub fn with_fail_fast_validation(mut self, fail_fast: bool) -> Self {
        self.fail_fast_validation = fail_fast;
        self
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("admin_password", &"<redacted>")
            .field("allow_cors", &self.allow_cors)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("fail_fast_validation", &self.fail_fast_validation)
            .finish()
    }
}
