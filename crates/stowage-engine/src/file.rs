//! Files flowing into and out of the engine.

use std::fmt;

use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::BoxError;
use crate::client::{BucketRef, ObjectRef};
use crate::naming::split_file_name;

/// Byte stream carrying the body of an uploaded file.
pub type ByteStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// Metadata the host parsed from a multipart part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// File name as sent by the client.
    pub original_name: String,
    /// Content type as declared by the client.
    pub mime_type: String,
    /// Multipart field the file arrived in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
}

impl FileInfo {
    /// Creates file metadata from a name and declared content type.
    pub fn new(original_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            field_name: None,
        }
    }

    /// Sets the multipart field name.
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    /// Returns the part of the name before the first `.`.
    pub fn base_name(&self) -> &str {
        split_file_name(&self.original_name).0
    }

    /// Returns the segment after the first `.`, or an empty string.
    pub fn extension(&self) -> &str {
        split_file_name(&self.original_name).1
    }
}

/// A file handed to the engine for upload: metadata plus its byte stream.
pub struct IncomingFile {
    info: FileInfo,
    stream: ByteStream,
}

impl IncomingFile {
    /// Wraps a byte stream.
    pub fn new<S, E>(info: FileInfo, stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self {
            info,
            stream: stream.map_err(Into::into).boxed(),
        }
    }

    /// Wraps an in-memory body.
    pub fn from_bytes(info: FileInfo, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            info,
            stream: stream::once(async move { Ok(data) }).boxed(),
        }
    }

    /// Returns the file metadata.
    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    /// Splits the file into metadata and body.
    pub fn into_parts(self) -> (FileInfo, ByteStream) {
        (self.info, self.stream)
    }
}

impl fmt::Debug for IncomingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingFile")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Result of a successful upload.
///
/// `object` and `bucket_ref` are the same references handed to the
/// `afterUpload` hook.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Computed object key.
    pub path: String,
    /// Bucket name.
    pub bucket: String,
    /// Reference to the stored object.
    #[serde(rename = "fileRef")]
    pub object: ObjectRef,
    /// Reference to the bucket.
    pub bucket_ref: BucketRef,
    /// Whether the object was made public.
    pub is_public: bool,
    /// Public URL of the object; only set when `is_public` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<Url>,
    /// Number of bytes written.
    pub size: u64,
    /// Content type stored with the object.
    pub content_type: String,
}
