//! DockGate Proxy
//!
//! A per-tenant authorizing reverse proxy in front of a container engine's
//! HTTP control API. One process per tenant; the tenant identity is fixed
//! at startup from `TENANT_NAME` (or legacy `OWNER_LABEL_VALUE`) and never
//! changes without a restart.
//!
//! TLS termination and mutual-TLS client-certificate validation are out of
//! scope: this binary binds a plain TCP listener and assumes a sidecar or
//! TLS-terminating wrapper sits in front of it in production.

use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use dockgate_proxy::{routes, AppState, Cli, Config};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    info!("Starting DockGate Proxy");

    let config = Config::from_env(&cli)?;
    info!(tenant = %config.policy.tenant_label_value, socket = %config.engine_socket.display(), "Configuration loaded");

    let state = AppState::new(config);
    let listen = state.config.listen.clone();
    let port = state.config.port;

    let app = routes::create_router(state);

    let addr: SocketAddr = format!("{listen}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Proxy listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("shutdown signal received, stopping server");
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("dockgate=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dockgate=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
