//! Storage reachability check.

use axum::Json;
use axum::extract::State;
use axum::routing::{Router, get};
use serde::Serialize;
use stowage_engine::StorageClient;

use crate::handler::{ErrorKind, Result};
use crate::state::AppState;

/// Tracing target for health checks.
const TRACING_TARGET: &str = "stowage_cli::handler::health";

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    bucket: String,
}

/// Probes the bucket with a HEAD request.
///
/// A missing probe object still means the bucket answered.
async fn health(State(client): State<StorageClient>) -> Result<Json<Health>> {
    client.verify_reachable().await.map_err(|err| {
        tracing::warn!(target: TRACING_TARGET, error = %err, "storage is unreachable");
        ErrorKind::ServiceUnavailable
            .with_resource(client.bucket_name().to_string())
            .with_context(err.to_string())
    })?;

    Ok(Json(Health {
        status: "ok",
        bucket: client.bucket_name().to_string(),
    }))
}

/// Returns the health routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
