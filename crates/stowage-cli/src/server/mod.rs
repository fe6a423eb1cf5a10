//! HTTP server startup with graceful shutdown.

mod error;
mod shutdown;

use std::net::SocketAddr;
use std::time::Instant;

use axum::Router;
pub use error::{ServerError, ServerResult};
use shutdown::shutdown_signal;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Binds to the configured address and serves `app` until SIGINT/SIGTERM.
///
/// Once a signal arrives no new connections are accepted and in-flight
/// requests get the configured shutdown timeout to finish.
///
/// # Errors
///
/// Returns an error if:
/// - Cannot bind to the specified address/port
/// - Server encounters a fatal error during operation
/// - In-flight requests outlive the shutdown timeout
pub async fn serve(app: Router, server_config: ServerConfig) -> ServerResult<()> {
    let server_addr = server_config.server_addr();

    let listener = TcpListener::bind(server_addr).await.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %server_addr,
            error = %err,
            "Failed to bind to address"
        );
        ServerError::bind_error(&server_addr.to_string(), err)
    })?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %server_addr,
        "Server is ready and listening for connections"
    );

    if server_config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "Server bound to all interfaces (0.0.0.0) - ensure firewall is configured"
        );
    }

    let start_time = Instant::now();
    let shutdown_timeout = server_config.shutdown_timeout();
    let (signal, deadline) = shutdown_signal(shutdown_timeout);

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(signal);

    let result = tokio::select! {
        result = server.into_future() => result.map_err(ServerError::Runtime),
        () = deadline => Err(ServerError::ShutdownTimeout(shutdown_timeout.as_secs())),
    };

    let uptime_secs = start_time.elapsed().as_secs();
    match &result {
        Ok(()) => tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            uptime_secs,
            "Shutdown completed"
        ),
        Err(err) => tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %err,
            suggestion = err.suggestion(),
            uptime_secs,
            "Server stopped with an error"
        ),
    }

    result
}
