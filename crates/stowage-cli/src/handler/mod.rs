//! All `axum::`[`Router`]s with related handlers.
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /files` | stores every file part of a multipart body |
//! | `DELETE /files/{name}` | removes the object `name` was stored as |
//! | `GET /health` | checks that the bucket answers |
//!
//! [`Router`]: axum::routing::Router

mod error;
mod files;
mod health;
mod response;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::state::AppState;

#[inline]
async fn fallback() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns the application router.
///
/// Request bodies are capped at `max_upload_bytes`.
pub fn routes(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .merge(files::routes())
        .merge(health::routes())
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::Value;
    use stowage_engine::{Hooks, StorageClient, StorageEngine, StorageOptions};

    use super::routes;
    use crate::state::AppState;

    const LIMIT: usize = 1024;

    /// Returns a new [`TestServer`] over an in-memory bucket.
    fn create_test_server(
        options: StorageOptions,
        hooks: Hooks,
    ) -> anyhow::Result<(TestServer, StorageClient)> {
        let client = StorageClient::in_memory("media");
        let engine = StorageEngine::builder(options)
            .client(client.clone())
            .hooks(hooks)
            .build()?;
        let server = TestServer::new(routes(AppState::new(engine), LIMIT))?;
        Ok((server, client))
    }

    fn text_file(name: &str, body: &'static str) -> Part {
        Part::bytes(body.as_bytes())
            .file_name(name)
            .mime_type("text/plain")
    }

    #[tokio::test]
    async fn upload_stores_files() -> anyhow::Result<()> {
        let options = StorageOptions::new("media").with_directory_path("docs");
        let (server, client) = create_test_server(options, Hooks::new())?;

        let form = MultipartForm::new()
            .add_text("note", "not a file")
            .add_part("file", text_file("a.txt", "hello"))
            .add_part("file", text_file("b.md", "# b"));
        let response = server.post("/files").multipart(form).await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        let stored = body.as_array().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["path"], "docs/a.txt");
        assert_eq!(stored[0]["bucket"], "media");
        assert_eq!(stored[0]["size"], 5);
        assert_eq!(stored[1]["path"], "docs/b.md");

        let meta = client.bucket().file("docs/a.txt").head().await?;
        assert_eq!(meta.size, 5);
        Ok(())
    }

    #[tokio::test]
    async fn upload_without_files_is_rejected() -> anyhow::Result<()> {
        let (server, _) = create_test_server(StorageOptions::new("media"), Hooks::new())?;

        let form = MultipartForm::new().add_text("note", "no files here");
        let response = server.post("/files").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn non_multipart_body_is_rejected() -> anyhow::Result<()> {
        let (server, _) = create_test_server(StorageOptions::new("media"), Hooks::new())?;

        let response = server.post("/files").text("plain body").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() -> anyhow::Result<()> {
        let (server, client) = create_test_server(StorageOptions::new("media"), Hooks::new())?;

        let big = vec![b'x'; LIMIT * 2];
        let form = MultipartForm::new().add_part("file", Part::bytes(big).file_name("big.bin"));
        let response = server.post("/files").multipart(form).await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(client.bucket().file("big.bin").head().await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn hook_rejection_is_unprocessable() -> anyhow::Result<()> {
        let hooks = Hooks::new().before_upload(|_, request, _| {
            match request.headers.get("x-api-key") {
                Some(_) => Ok(()),
                None => Err("missing api key".into()),
            }
        });
        let (server, _) = create_test_server(StorageOptions::new("media"), hooks)?;

        let form = MultipartForm::new().add_part("file", text_file("a.txt", "hello"));
        let response = server.post("/files").multipart(form).await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["resource"], "beforeUpload");

        let form = MultipartForm::new().add_part("file", text_file("a.txt", "hello"));
        let response = server
            .post("/files")
            .add_header("x-api-key", "secret")
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_stored_file() -> anyhow::Result<()> {
        let deletes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&deletes);
        let hooks = Hooks::new().after_delete(move |_, request, _, object, _| {
            assert_eq!(request.uri.path(), "/files/a.txt");
            assert_eq!(object.key(), "a.txt");
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let (server, client) = create_test_server(StorageOptions::new("media"), hooks)?;

        let form = MultipartForm::new().add_part("file", text_file("a.txt", "hello"));
        server
            .post("/files")
            .multipart(form)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.delete("/files/a.txt").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["path"], "a.txt");

        assert!(client.bucket().file("a.txt").head().await.is_err());
        assert_eq!(deletes.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn delete_missing_file_succeeds() -> anyhow::Result<()> {
        let (server, _) = create_test_server(StorageOptions::new("media"), Hooks::new())?;

        let response = server.delete("/files/never-uploaded.txt").await;
        response.assert_status_ok();
        Ok(())
    }

    #[tokio::test]
    async fn health_reports_bucket() -> anyhow::Result<()> {
        let (server, _) = create_test_server(StorageOptions::new("media"), Hooks::new())?;

        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["bucket"], "media");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() -> anyhow::Result<()> {
        let (server, _) = create_test_server(StorageOptions::new("media"), Hooks::new())?;

        let response = server.get("/nope").await;
        response.assert_status_not_found();
        Ok(())
    }
}
