use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pathveil::{AppState, Config, build_router};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting pathveil gateway v{}", env!("CARGO_PKG_VERSION"));

    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run the application, returning an exit code on error.
async fn run() -> Result<(), exitcode::ExitCode> {
    // Load configuration. This is the startup self-check the gateway
    // depends on: a missing or mismatched secret would otherwise produce a
    // maximally-obfuscated but unusable API surface.
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        host = %config.host,
        port = %config.port,
        require_token = config.require_access_token,
        "Configuration loaded"
    );

    // Build the mapping table; fails fast on truncated-hash collisions.
    let state = AppState::new(config.clone()).map_err(|e| {
        error!("Failed to build gateway state: {e}");
        exitcode::CONFIG
    })?;
    for (canonical, obfuscated) in state.registry.iter() {
        info!("  {canonical} -> {obfuscated}");
    }

    let app = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Gateway listening on http://{addr}");
    info!("  GET  /                         - Welcome");
    info!("  GET  /health                   - Health check");
    info!("  GET  /api/v1/system/endpoints  - Obfuscated mapping + tokens");
    info!("  GET  /api/v1/system/token/{{h}}  - Fresh token for one alias");
    info!("  *    /api/x/{{hash}}             - Obfuscated business endpoints");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {e}");
            exitcode::SOFTWARE
        })?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed - a critical
/// initialization failure that should halt the application.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            panic!("Critical: cannot install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                panic!("Critical: cannot install SIGTERM signal handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
