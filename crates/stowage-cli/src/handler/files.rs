//! File upload and removal handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::routing::{Router, delete, post};
use bytes::Bytes;
use stowage_engine::{BoxError, FileInfo, FileStorage, IncomingFile, RemoveOutput, StoredFile};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::handler::{Error, ErrorKind, Result};
use crate::state::AppState;

/// Tracing target for file operations.
const TRACING_TARGET: &str = "stowage_cli::handler::files";

/// Chunks buffered between the multipart reader and the storage writer.
const CHUNK_BUFFER: usize = 8;

/// Content type assumed when a part does not declare one.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Uploads every file part of a multipart request.
///
/// Form data:
/// - any field carrying a file name; other fields are ignored
#[tracing::instrument(skip_all, fields(uri = %request.uri()))]
async fn upload_files(
    State(storage): State<Arc<dyn FileStorage>>,
    request: Request,
) -> Result<(StatusCode, Json<Vec<StoredFile>>)> {
    let (parts, body) = request.into_parts();
    let mut multipart = Multipart::from_request(Request::from_parts(parts.clone(), body), &())
        .await
        .map_err(|rejection| {
            ErrorKind::BadRequest
                .with_message("Invalid multipart request")
                .with_context(rejection.body_text())
        })?;

    let mut stored_files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            tracing::debug!(target: TRACING_TARGET, field = ?field.name(), "Skipping field without filename");
            continue;
        };

        let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_owned();
        let mut info = FileInfo::new(file_name, content_type);
        if let Some(name) = field.name() {
            info = info.with_field_name(name);
        }

        tracing::debug!(
            target: TRACING_TARGET,
            file = %info.original_name,
            content_type = %info.mime_type,
            "Receiving file"
        );

        let (sender, receiver) = mpsc::channel(CHUNK_BUFFER);
        let file = IncomingFile::new(info, ReceiverStream::new(receiver));

        let (received, stored) =
            tokio::join!(forward_chunks(field, sender), storage.handle_file(&parts, file));

        received?;
        stored_files.push(stored?);
    }

    if stored_files.is_empty() {
        return Err(ErrorKind::BadRequest.with_message("No files provided in multipart request"));
    }

    tracing::info!(
        target: TRACING_TARGET,
        count = stored_files.len(),
        "Files stored"
    );

    Ok((StatusCode::CREATED, Json(stored_files)))
}

/// Feeds a multipart field into the storage stream.
///
/// Stops quietly when the storage side hangs up (it failed and reports its
/// own error). A read error is forwarded into the stream and also returned.
async fn forward_chunks(
    mut field: Field<'_>,
    sender: mpsc::Sender<std::result::Result<Bytes, BoxError>>,
) -> Result<()> {
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if sender.send(Ok(chunk)).await.is_err() {
                    return Ok(());
                }
            }
            Ok(None) => return Ok(()),
            Err(err) => {
                let _ = sender.send(Err(err.body_text().into())).await;
                return Err(multipart_error(err));
            }
        }
    }
}

fn multipart_error(err: MultipartError) -> Error<'static> {
    tracing::warn!(target: TRACING_TARGET, error = %err, "Failed to read multipart data");

    let kind = match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ErrorKind::PayloadTooLarge,
        _ => ErrorKind::BadRequest,
    };
    kind.with_message("Invalid multipart data")
        .with_context(err.body_text())
}

/// Removes the object a previous upload of `name` was stored as.
///
/// Removing a file that is not stored succeeds.
#[tracing::instrument(skip_all, fields(name = %name))]
async fn remove_file(
    State(storage): State<Arc<dyn FileStorage>>,
    Path(name): Path<String>,
    request: Request,
) -> Result<Json<RemoveOutput>> {
    let (parts, _): (Parts, _) = request.into_parts();
    let info = FileInfo::new(name, DEFAULT_CONTENT_TYPE);

    let output = storage.remove_file(&parts, &info).await?;

    tracing::info!(
        target: TRACING_TARGET,
        path = %output.path,
        existed = ?output.existed,
        "File removed"
    );

    Ok(Json(output))
}

/// Returns the file routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/files", post(upload_files))
        .route("/files/{name}", delete(remove_file))
}
