//! End-to-end upload and delete through an in-memory bucket.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::stream;
use http::request::Parts;
use object_store::path::Path;
use stowage_engine::{
    FileInfo, FileStorage, HookName, Hooks, IncomingFile, StorageClient, StorageEngine,
    StorageOptions,
};

fn request(uri: &str) -> Parts {
    http::Request::builder()
        .uri(uri)
        .body(())
        .unwrap()
        .into_parts()
        .0
}

#[tokio::test]
async fn upload_then_delete() {
    let client = StorageClient::in_memory("media");

    let events = Arc::new(Mutex::new(Vec::new()));
    let log = |name: HookName| {
        let events = Arc::clone(&events);
        move || events.lock().unwrap().push(name)
    };
    let (before_upload, after_upload) = (log(HookName::BeforeUpload), log(HookName::AfterUpload));
    let (before_delete, after_delete) = (log(HookName::BeforeDelete), log(HookName::AfterDelete));

    let hooks = Hooks::new()
        .before_upload(move |_, _, _| {
            before_upload();
            Ok(())
        })
        .after_upload(move |_, _, _, _, _| {
            after_upload();
            Ok(())
        })
        .before_delete(move |_, _, _| {
            before_delete();
            Ok(())
        })
        .after_delete(move |_, _, _, _, _| {
            after_delete();
            Ok(())
        });

    let options = StorageOptions::new("media")
        .with_directory_path("docs")
        .with_name_suffix("-v1");
    let engine: Arc<dyn FileStorage> = Arc::new(
        StorageEngine::builder(options)
            .client(client.clone())
            .hooks(hooks)
            .build()
            .unwrap(),
    );

    let chunks = vec![
        Ok::<_, std::io::Error>(Bytes::from("# Title\n")),
        Ok(Bytes::from("body\n")),
    ];
    let file = IncomingFile::new(FileInfo::new("readme.md", "text/markdown"), stream::iter(chunks));

    let stored = engine.handle_file(&request("/files"), file).await.unwrap();
    assert_eq!(stored.path, "docs/readme-v1.md");
    assert_eq!(stored.size, 13);

    let key = Path::from("docs/readme-v1.md");
    let object = client.store().get(&key).await.unwrap();
    assert_eq!(object.bytes().await.unwrap(), Bytes::from("# Title\nbody\n"));

    let info = FileInfo::new("readme.md", "text/markdown");
    let removed = engine
        .remove_file(&request("/files/readme.md"), &info)
        .await
        .unwrap();
    assert_eq!(removed.path, "docs/readme-v1.md");
    assert!(client.store().head(&key).await.is_err());

    let removed_again = engine
        .remove_file(&request("/files/readme.md"), &info)
        .await
        .unwrap();
    assert_eq!(removed_again.path, "docs/readme-v1.md");

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            HookName::BeforeUpload,
            HookName::AfterUpload,
            HookName::BeforeDelete,
            HookName::AfterDelete,
            HookName::BeforeDelete,
            HookName::AfterDelete,
        ]
    );
}

#[tokio::test]
async fn failing_stream_leaves_no_stored_file() {
    let client = StorageClient::in_memory("media");
    let engine = StorageEngine::new(StorageOptions::new("media"), Some(client.clone())).unwrap();

    let chunks = vec![
        Ok(Bytes::from("partial")),
        Err(std::io::Error::other("client disconnected")),
    ];
    let file = IncomingFile::new(FileInfo::new("big.bin", "application/octet-stream"), stream::iter(chunks));

    let err = engine.handle_file(&request("/files"), file).await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("client disconnected"));

    let head = client.bucket().file("big.bin").head().await;
    assert!(head.unwrap_err().is_not_found());
}
