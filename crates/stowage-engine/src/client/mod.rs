//! Backend client handle backed by [`object_store::ObjectStore`].
//!
//! [`StorageClient`] is a thin, cloneable wrapper around
//! `Arc<dyn ObjectStore>` bound to a single bucket. Objects are addressed
//! as `client.bucket().file(key)`, which yields an [`ObjectRef`] able to
//! receive a streaming write, be deleted, or be made public.

use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use object_store::buffered::BufWriter;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ClientOptions, ObjectMeta, ObjectStore};
use serde::{Serialize, Serializer};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::file::ByteStream;
use crate::{Credentials, Error, Operation, Result, TRACING_TARGET_CLIENT};

mod access_control;
mod put_output;

pub use access_control::{AccessControl, GCS_API_BASE, GcsAccessControl, NoopAccessControl};
pub use put_output::{PutOutput, RemoveOutput};

/// Cloneable handle to an object store bucket.
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
    bucket: Arc<str>,
    access: Arc<dyn AccessControl>,
    public_base: Url,
}

impl StorageClient {
    /// Wraps a concrete [`ObjectStore`] already bound to `bucket`.
    ///
    /// The client uses [`NoopAccessControl`]; attach another implementation
    /// with [`with_access_control`](Self::with_access_control) if the store
    /// needs explicit ACL grants. An engine configured for public uploads
    /// warns when built over a client that still uses the no-op.
    pub fn new(store: impl ObjectStore, bucket: impl Into<String>) -> Self {
        Self::from_arc(Arc::new(store), bucket)
    }

    /// Wraps a shared [`ObjectStore`] already bound to `bucket`.
    pub fn from_arc(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        let bucket: String = bucket.into();
        Self {
            store,
            bucket: bucket.into(),
            access: Arc::new(NoopAccessControl),
            public_base: default_public_base(),
        }
    }

    /// Creates a client over a fresh in-memory store.
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        Self::new(InMemory::new(), bucket)
    }

    /// Builds a Google Cloud Storage client for `bucket`.
    ///
    /// `app_name` is sent in the user agent so requests can be attributed
    /// to this engine instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the store cannot be built from the
    /// credentials.
    #[tracing::instrument(skip(credentials), target = TRACING_TARGET_CLIENT)]
    pub fn initialize(credentials: &Credentials, bucket: &str, app_name: &str) -> Result<Self> {
        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            credentials = ?credentials,
            "initializing storage client"
        );

        let user_agent = format!("stowage/{} ({app_name})", env!("CARGO_PKG_VERSION"));
        let user_agent = http::HeaderValue::from_str(&user_agent)
            .map_err(|e| Error::config(format!("invalid app name '{app_name}': {e}")))?;

        let mut builder = GoogleCloudStorageBuilder::new()
            .with_bucket_name(bucket)
            .with_client_options(ClientOptions::new().with_user_agent(user_agent));

        builder = match credentials {
            Credentials::ServiceAccount(key) => {
                builder.with_service_account_key(key.to_service_account_json())
            }
            Credentials::KeyFile(json) if Credentials::is_inline_json(json) => {
                builder.with_service_account_key(json)
            }
            Credentials::KeyFile(path) => builder.with_service_account_path(path),
        };

        let store = builder.build().map_err(|e| {
            tracing::error!(target: TRACING_TARGET_CLIENT, error = %e, "failed to build storage client");
            Error::config(format!("failed to build storage client: {e}"))
        })?;

        let access = GcsAccessControl::new(Arc::clone(store.credentials()))
            .map_err(|e| Error::config(format!("failed to build access control: {e}")))?;

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            bucket,
            "storage client initialized"
        );

        Ok(Self::new(store, bucket).with_access_control(access))
    }

    /// Replaces the public-visibility implementation.
    pub fn with_access_control(mut self, access: impl AccessControl) -> Self {
        self.access = Arc::new(access);
        self
    }

    /// Replaces the base URL public object URLs are built from.
    pub fn with_public_base_url(mut self, public_base: Url) -> Self {
        self.public_base = public_base;
        self
    }

    /// Returns the bucket this client is bound to.
    #[inline]
    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    /// Returns a reference to the bound bucket.
    pub fn bucket(&self) -> BucketRef {
        BucketRef {
            client: self.clone(),
        }
    }

    /// Returns the public-visibility implementation.
    #[inline]
    pub fn access_control(&self) -> &dyn AccessControl {
        self.access.as_ref()
    }

    /// Returns the underlying store.
    #[inline]
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Verifies that the backing store is reachable.
    ///
    /// Issues a HEAD for a probe key; a not-found response is treated as
    /// success (the bucket exists), any other error is propagated.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CLIENT, fields(bucket = %self.bucket))]
    pub async fn verify_reachable(&self) -> Result<()> {
        const PROBE_KEY: &str = "_stowage_verify_probe";
        match self.store.head(&Path::from(PROBE_KEY)).await {
            Ok(_) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(Error::transport(Operation::Probe, PROBE_KEY, e)),
        }
    }
}

impl fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageClient")
            .field("store", &self.store.to_string())
            .field("bucket", &self.bucket)
            .field("access_control", &self.access.id())
            .field("public_base", &self.public_base.as_str())
            .finish()
    }
}

/// Reference to the bucket a [`StorageClient`] is bound to.
#[derive(Clone)]
pub struct BucketRef {
    client: StorageClient,
}

impl BucketRef {
    /// Returns the bucket name.
    #[inline]
    pub fn name(&self) -> &str {
        self.client.bucket_name()
    }

    /// Returns a reference to the object stored under `key`.
    pub fn file(&self, key: impl Into<String>) -> ObjectRef {
        ObjectRef {
            client: self.client.clone(),
            key: key.into(),
        }
    }
}

impl PartialEq for BucketRef {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl fmt::Debug for BucketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketRef").field("name", &self.name()).finish()
    }
}

impl Serialize for BucketRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            name: &'a str,
        }

        Repr { name: self.name() }.serialize(serializer)
    }
}

/// Reference to a single object in a bucket.
///
/// The object need not exist yet; a reference is what a write targets.
#[derive(Clone)]
pub struct ObjectRef {
    client: StorageClient,
    key: String,
}

impl ObjectRef {
    /// Returns the object key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the bucket name.
    #[inline]
    pub fn bucket_name(&self) -> &str {
        self.client.bucket_name()
    }

    /// Returns the backend path for the key, taken literally.
    ///
    /// Keys with empty, `.` or `..` segments, control characters, or a
    /// leading or trailing `/` have no literal backend path and are refused.
    fn path(&self, operation: Operation) -> Result<Path> {
        let path = Path::parse(&self.key).map_err(|e| Error::transport(operation, &self.key, e))?;
        if path.as_ref() != self.key {
            return Err(Error::transport(
                operation,
                &self.key,
                format!("object key '{}' starts or ends with '/'", self.key),
            ));
        }
        Ok(path)
    }

    /// Streams `body` into the object, tagging it with `content_type`.
    ///
    /// Small bodies are sent in a single request and larger ones as a
    /// multipart upload. If `body` fails midway the writer is dropped
    /// without an abort, which leaves any partial upload to the backend's
    /// own expiry rules.
    #[tracing::instrument(name = "object.write", skip(self, body), target = TRACING_TARGET_CLIENT, fields(key = %self.key, size = tracing::field::Empty))]
    pub async fn write_stream(&self, content_type: &str, mut body: ByteStream) -> Result<PutOutput> {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());

        let path = self.path(Operation::Write)?;
        let mut writer =
            BufWriter::new(Arc::clone(&self.client.store), path).with_attributes(attributes);
        let mut size = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|source| Error::Source {
                key: self.key.clone(),
                source,
            })?;
            size += chunk.len() as u64;
            writer
                .put(chunk)
                .await
                .map_err(|e| Error::transport(Operation::Write, &self.key, e))?;
        }

        writer
            .shutdown()
            .await
            .map_err(|e| Error::transport(Operation::Write, &self.key, e))?;

        tracing::Span::current().record("size", size);
        Ok(PutOutput {
            size,
            content_type: content_type.to_string(),
        })
    }

    /// Deletes the object.
    ///
    /// With `ignore_not_found`, a missing object is reported as
    /// `existed: Some(false)` instead of an error.
    #[tracing::instrument(name = "object.delete", skip(self), target = TRACING_TARGET_CLIENT, fields(key = %self.key))]
    pub async fn delete(&self, ignore_not_found: bool) -> Result<RemoveOutput> {
        let path = self.path(Operation::Delete)?;
        match self.client.store.delete(&path).await {
            Ok(()) => Ok(RemoveOutput {
                path: self.key.clone(),
                existed: None,
            }),
            Err(object_store::Error::NotFound { .. }) if ignore_not_found => {
                tracing::debug!(target: TRACING_TARGET_CLIENT, key = %self.key, "object already absent");
                Ok(RemoveOutput {
                    path: self.key.clone(),
                    existed: Some(false),
                })
            }
            Err(e) => Err(Error::transport(Operation::Delete, &self.key, e)),
        }
    }

    /// Grants public read access to the object.
    #[tracing::instrument(name = "object.make_public", skip(self), target = TRACING_TARGET_CLIENT, fields(key = %self.key))]
    pub async fn make_public(&self) -> Result<()> {
        self.client
            .access
            .make_public(self.bucket_name(), &self.key)
            .await
            .map_err(|e| Error::transport(Operation::MakePublic, &self.key, e))
    }

    /// Returns the URL the object is served from once public:
    /// `{public_base}/{bucket}/{key}`, each key segment percent-encoded.
    pub fn public_url(&self) -> Url {
        let mut url = self.client.public_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(self.bucket_name())
                .extend(self.key.split('/'));
        }
        url
    }

    /// Returns the object metadata without downloading the body.
    #[tracing::instrument(name = "object.head", skip(self), target = TRACING_TARGET_CLIENT, fields(key = %self.key))]
    pub async fn head(&self) -> Result<ObjectMeta> {
        let path = self.path(Operation::Head)?;
        self.client
            .store
            .head(&path)
            .await
            .map_err(|e| Error::transport(Operation::Head, &self.key, e))
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.bucket_name() == other.bucket_name() && self.key == other.key
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("bucket", &self.bucket_name())
            .field("key", &self.key)
            .finish()
    }
}

impl Serialize for ObjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            bucket: &'a str,
            name: &'a str,
        }

        Repr {
            bucket: self.bucket_name(),
            name: &self.key,
        }
        .serialize(serializer)
    }
}

fn default_public_base() -> Url {
    Url::parse(GCS_API_BASE).unwrap_or_else(|_| unreachable!("constant URL is valid"))
}
