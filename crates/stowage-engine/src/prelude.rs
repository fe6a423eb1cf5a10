//! Convenience re-exports.

pub use crate::client::{BucketRef, ObjectRef, RemoveOutput, StorageClient};
pub use crate::engine::{FileStorage, StorageEngine};
pub use crate::error::{Error, Result};
pub use crate::file::{FileInfo, IncomingFile, StoredFile};
pub use crate::hooks::{HookName, HookResult, Hooks};
pub use crate::options::{EngineConfig, StorageOptions};
pub use crate::{Credentials, ServiceAccountKey};
