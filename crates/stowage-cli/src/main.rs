#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod handler;
mod server;
mod state;

use std::process;

use anyhow::Context;
use stowage_engine::{Hooks, StorageEngine};

use crate::config::Cli;
use crate::state::AppState;

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "stowage_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "stowage_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "stowage_cli::config";
pub const TRACING_TARGET_STORAGE: &str = "stowage_cli::storage";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "Application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "Application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "Starting stowage server"
    );
    cli.log();
    cli.validate()?;

    let engine = create_engine(&cli).context("failed to initialize storage engine")?;
    let router = handler::routes(AppState::new(engine), cli.server.max_upload_bytes());

    server::serve(router, cli.server).await?;

    Ok(())
}

/// Builds the storage engine from the storage configuration.
fn create_engine(cli: &Cli) -> anyhow::Result<StorageEngine> {
    let options = cli.storage.to_options()?;
    let client = cli.storage.client(&options.bucket_name);

    let mut builder = StorageEngine::builder(options).hooks(audit_hooks());
    if let Some(client) = client {
        builder = builder.client(client);
    }

    Ok(builder.build()?)
}

/// Hooks that record every completed upload and delete.
fn audit_hooks() -> Hooks {
    Hooks::new()
        .after_init(|config, client| {
            tracing::info!(
                target: TRACING_TARGET_STORAGE,
                bucket = %client.bucket_name(),
                public = config.is_public(),
                "Storage ready"
            );
            Ok(())
        })
        .after_upload(|_, request, file, object, _| {
            tracing::info!(
                target: TRACING_TARGET_STORAGE,
                uri = %request.uri,
                file = %file.original_name,
                key = %object.key(),
                "Object uploaded"
            );
            Ok(())
        })
        .after_delete(|_, request, file, object, _| {
            tracing::info!(
                target: TRACING_TARGET_STORAGE,
                uri = %request.uri,
                file = %file.original_name,
                key = %object.key(),
                "Object deleted"
            );
            Ok(())
        })
}
