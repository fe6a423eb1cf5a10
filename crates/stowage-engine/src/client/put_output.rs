//! Result types for [`ObjectRef::write_stream`](super::ObjectRef::write_stream)
//! and [`ObjectRef::delete`](super::ObjectRef::delete).

use serde::Serialize;

/// Result of a completed streaming write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutput {
    /// Number of bytes written.
    pub size: u64,
    /// Content type stored with the object.
    pub content_type: String,
}

/// Data returned by the backend after a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveOutput {
    /// Key that was deleted.
    pub path: String,
    /// `Some(false)` when the backend reported the object already absent.
    /// `None` when the backend does not say.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existed: Option<bool>,
}
