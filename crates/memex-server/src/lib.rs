//! MCP transport for the Memex tool service (SPEC_FULL §6.3). Wraps a
//! [`memex_tools::ToolService`] in [`mcp::McpToolServer`] and serves it over
//! stdio or streamable HTTP, picked by `MemexConfig::tool_service_endpoint`.
pub mod error;
pub mod mcp;
mod middleware;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use memex_tools::ToolService;
use middleware::{log_requests, request_id};
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use rmcp::ServiceExt;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use mcp::McpToolServer;

/// Serves `tools` over stdio until the peer closes the connection. Used when
/// `tool_service_endpoint` is `"stdio"` — one tool service per process, no
/// concurrent sessions.
pub async fn start_stdio(tools: ToolService) -> anyhow::Result<()> {
    let server = McpToolServer::new(tools);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!(error = %e, "failed to start stdio transport");
    })?;

    tracing::info!("memex tool service listening on stdio");
    service.waiting().await?;
    Ok(())
}

/// Serves `tools` over streamable HTTP at `/mcp`, binding `addr`. A fresh
/// [`McpToolServer`] is cloned per session (all its fields are `Arc`s, so
/// this is cheap) the way the HTTP session factory pattern this is grounded
/// on does.
pub async fn start_http(tools: ToolService, addr: SocketAddr) -> anyhow::Result<()> {
    let service = StreamableHttpService::new(
        {
            let tools = tools.clone();
            move || Ok(McpToolServer::new(tools.clone()))
        },
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = axum::Router::new()
        .nest_service("/mcp", service)
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(axum::middleware::from_fn(request_id))
        .layer(axum::middleware::from_fn(log_requests))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "memex tool service listening on http at /mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("memex tool service http transport shut down");
    Ok(())
}

/// Parses `tool_service_endpoint` (`"stdio"` or `host:port`) and serves
/// `tools` on the matching transport.
pub async fn start(tools: ToolService, endpoint: &str) -> anyhow::Result<()> {
    if endpoint.eq_ignore_ascii_case("stdio") {
        start_stdio(tools).await
    } else {
        let addr: SocketAddr = endpoint
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid tool_service_endpoint '{endpoint}': {e}"))?;
        start_http(tools, addr).await
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received sigterm, shutting down"),
    }
}
