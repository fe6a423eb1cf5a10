//! Upload and delete orchestration.

use std::sync::Arc;

use http::request::Parts;

use crate::client::{
    AccessControl, BucketRef, NoopAccessControl, ObjectRef, RemoveOutput, StorageClient,
};
use crate::file::{FileInfo, IncomingFile, StoredFile};
use crate::hooks::Hooks;
use crate::options::{EngineConfig, StorageOptions};
use crate::{
    Error, Result, TRACING_TARGET_DELETE, TRACING_TARGET_ENGINE, TRACING_TARGET_UPLOAD,
};

/// Storage interface a multipart upload host talks to.
#[async_trait::async_trait]
pub trait FileStorage: Send + Sync + 'static {
    /// Stores an incoming file and describes where it went.
    async fn handle_file(&self, request: &Parts, file: IncomingFile) -> Result<StoredFile>;

    /// Removes a previously stored file.
    async fn remove_file(&self, request: &Parts, file: &FileInfo) -> Result<RemoveOutput>;
}

/// Stores uploaded files in an object store bucket.
///
/// Built once per application and shared; cloning is cheap and every clone
/// talks to the same client.
///
/// # Examples
///
/// ```rust
/// use stowage_engine::{StorageClient, StorageEngine, StorageOptions};
///
/// let options = StorageOptions::new("media").with_directory_path("uploads");
/// let engine = StorageEngine::new(options, Some(StorageClient::in_memory("media")))
///     .expect("valid configuration");
///
/// assert_eq!(engine.config().bucket(), "media");
/// ```
#[derive(Debug, Clone)]
pub struct StorageEngine {
    config: Arc<EngineConfig>,
    client: StorageClient,
    hooks: Arc<Hooks>,
}

/// Builder for [`StorageEngine`].
#[derive(Debug)]
#[must_use = "builders do nothing unless `build` is called"]
pub struct StorageEngineBuilder {
    options: StorageOptions,
    client: Option<StorageClient>,
    hooks: Hooks,
}

impl StorageEngineBuilder {
    /// Uses a pre-built client instead of initializing one from credentials.
    ///
    /// Credentials are not validated when a client is supplied.
    pub fn client(mut self, client: StorageClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the lifecycle hooks.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Resolves the configuration and sets up the client.
    ///
    /// Runs `beforeInit` once the configuration is resolved and `afterInit`
    /// once the client is ready.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a missing bucket name, missing or
    /// incomplete credentials, or a client that cannot be built, and
    /// [`Error::Hook`] if an init hook fails.
    pub fn build(self) -> Result<StorageEngine> {
        let config = EngineConfig::resolve(&self.options)?;
        self.hooks.call_before_init(&config)?;

        let client = match self.client {
            Some(client) => {
                if client.bucket_name() != config.bucket() {
                    tracing::warn!(
                        target: TRACING_TARGET_ENGINE,
                        configured = config.bucket(),
                        client = client.bucket_name(),
                        "supplied client is bound to another bucket"
                    );
                }
                if config.is_public() && client.access_control().id() == NoopAccessControl.id() {
                    tracing::warn!(
                        target: TRACING_TARGET_ENGINE,
                        bucket = client.bucket_name(),
                        "public uploads requested but the supplied client grants no access; \
                         objects are only public if the bucket already serves them"
                    );
                }
                client
            }
            None => {
                let credentials = self
                    .options
                    .credentials
                    .as_ref()
                    .ok_or_else(|| Error::config("credentials required"))?;
                credentials.validate()?;
                StorageClient::initialize(credentials, config.bucket(), config.app_name())?
            }
        };

        self.hooks.call_after_init(&config, &client)?;

        tracing::info!(
            target: TRACING_TARGET_ENGINE,
            bucket = config.bucket(),
            app_name = config.app_name(),
            public = config.is_public(),
            hooks = ?self.hooks,
            "storage engine ready"
        );

        Ok(StorageEngine {
            config: Arc::new(config),
            client,
            hooks: Arc::new(self.hooks),
        })
    }
}

impl StorageEngine {
    /// Creates an engine from options and an optional pre-built client.
    pub fn new(options: StorageOptions, client: Option<StorageClient>) -> Result<Self> {
        let builder = Self::builder(options);
        match client {
            Some(client) => builder.client(client).build(),
            None => builder.build(),
        }
    }

    /// Starts building an engine.
    pub fn builder(options: StorageOptions) -> StorageEngineBuilder {
        StorageEngineBuilder {
            options,
            client: None,
            hooks: Hooks::default(),
        }
    }

    /// Returns the resolved configuration.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the backend client.
    #[inline]
    pub fn client(&self) -> &StorageClient {
        &self.client
    }

    /// Returns the registered hooks.
    #[inline]
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    fn locate(&self, file: &FileInfo) -> (ObjectRef, BucketRef) {
        let bucket = self.client.bucket();
        let object = bucket.file(self.config.object_key(file));
        (object, bucket)
    }

    /// Streams `file` into the bucket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Hook`] if `beforeUpload` or `afterUpload` fails,
    /// [`Error::Source`] if the file stream fails, and
    /// [`Error::Transport`] if the backend write or the public grant fails.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_UPLOAD,
        fields(file = %file.info().original_name)
    )]
    pub async fn handle_file(&self, request: &Parts, file: IncomingFile) -> Result<StoredFile> {
        let (info, stream) = file.into_parts();
        self.hooks.call_before_upload(&self.config, request, &info)?;

        let (object, bucket) = self.locate(&info);
        let content_type = self.config.content_type(&info);

        tracing::debug!(
            target: TRACING_TARGET_UPLOAD,
            key = object.key(),
            content_type,
            "uploading"
        );

        let written = match object.write_stream(content_type, stream).await {
            Ok(written) => written,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_UPLOAD,
                    key = object.key(),
                    error = %err,
                    "upload failed"
                );
                return Err(err);
            }
        };

        let mut stored = StoredFile {
            path: object.key().to_string(),
            bucket: bucket.name().to_string(),
            object: object.clone(),
            bucket_ref: bucket.clone(),
            is_public: self.config.is_public(),
            public_url: None,
            size: written.size,
            content_type: written.content_type,
        };

        if stored.is_public {
            object.make_public().await?;
            stored.public_url = Some(object.public_url());
        }

        tracing::info!(
            target: TRACING_TARGET_UPLOAD,
            key = %stored.path,
            size = stored.size,
            public = stored.is_public,
            "upload completed"
        );

        self.hooks
            .call_after_upload(&self.config, request, &info, &object, &bucket)?;
        Ok(stored)
    }

    /// Deletes the object `file` was stored as.
    ///
    /// A missing object is not an error. `afterDelete` runs whether or not
    /// the backend delete succeeded; the backend result is returned as is
    /// unless the hook itself fails.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_DELETE,
        fields(file = %file.original_name)
    )]
    pub async fn remove_file(&self, request: &Parts, file: &FileInfo) -> Result<RemoveOutput> {
        self.hooks.call_before_delete(&self.config, request, file)?;

        let (object, bucket) = self.locate(file);
        let result = object.delete(true).await;

        match &result {
            Ok(output) => tracing::info!(
                target: TRACING_TARGET_DELETE,
                key = %output.path,
                existed = ?output.existed,
                "delete completed"
            ),
            Err(err) => tracing::warn!(
                target: TRACING_TARGET_DELETE,
                key = object.key(),
                error = %err,
                "delete failed"
            ),
        }

        self.hooks
            .call_after_delete(&self.config, request, file, &object, &bucket)?;
        result
    }

    /// Callback form of [`handle_file`](Self::handle_file).
    ///
    /// `callback` is called exactly once, with the error or the stored file.
    pub async fn handle_incoming_file<F>(&self, request: &Parts, file: IncomingFile, callback: F)
    where
        F: FnOnce(Result<StoredFile>),
    {
        callback(self.handle_file(request, file).await);
    }

    /// Callback form of [`remove_file`](Self::remove_file).
    ///
    /// `callback` is called exactly once, with the error or the backend
    /// result.
    pub async fn remove_file_with<F>(&self, request: &Parts, file: &FileInfo, callback: F)
    where
        F: FnOnce(Result<RemoveOutput>),
    {
        callback(self.remove_file(request, file).await);
    }
}

#[async_trait::async_trait]
impl FileStorage for StorageEngine {
    async fn handle_file(&self, request: &Parts, file: IncomingFile) -> Result<StoredFile> {
        StorageEngine::handle_file(self, request, file).await
    }

    async fn remove_file(&self, request: &Parts, file: &FileInfo) -> Result<RemoveOutput> {
        StorageEngine::remove_file(self, request, file).await
    }
}
