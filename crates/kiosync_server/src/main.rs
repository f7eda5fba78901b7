//! Kiosync server
//!
//! Serves the Kiosync gateway over HTTP with an in-memory sync engine.
//!
//! # Endpoints
//!
//! - `POST /add` - Provision a document's sync token (admin secret required)
//! - `POST /sync/{docId}` - Exchange fragments (`Authorization: Bearer <token>`)

mod routes;

use clap::Parser;
use kiosync_gateway::{Gateway, GatewayConfig, MemoryEngine, DEFAULT_MAX_BODY_BYTES};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Kiosync document-sync gateway.
#[derive(Parser)]
#[command(name = "kiosync-server")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind to
    #[arg(short, long, env = "KIOSYNC_BIND", default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Admin secret required to provision document tokens
    #[arg(long, env = "KIOSYNC_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: String,

    /// Do not answer CORS preflight requests
    #[arg(long)]
    no_cors: bool,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "KIOSYNC_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,

    /// Report only the first validation issue of a malformed body
    #[arg(long)]
    fail_fast: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if cli.admin_password.is_empty() {
        return Err("admin password must not be empty".into());
    }

    let config = GatewayConfig::new(cli.admin_password)
        .with_bind_addr(cli.bind)
        .with_cors(!cli.no_cors)
        .with_max_body_bytes(cli.max_body_bytes)
        .with_fail_fast_validation(cli.fail_fast);
    info!(?config, "starting gateway");

    let engine = MemoryEngine::new();
    info!(node_id = engine.node_id(), "in-memory engine ready");

    let gateway = Arc::new(Gateway::new(engine, &config));
    let (addr, server) = warp::serve(routes::routes(gateway, &config))
        .try_bind_with_graceful_shutdown(config.bind_addr, async {
            let _ = tokio::signal::ctrl_c().await;
        })?;

    info!(%addr, "listening");
    server.await;
    info!("shut down");

    Ok(())
}
