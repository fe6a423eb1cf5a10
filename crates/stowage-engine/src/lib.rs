#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging
pub const TRACING_TARGET_ENGINE: &str = "stowage_engine::engine";
pub const TRACING_TARGET_CLIENT: &str = "stowage_engine::client";
pub const TRACING_TARGET_HOOKS: &str = "stowage_engine::hooks";
pub const TRACING_TARGET_UPLOAD: &str = "stowage_engine::upload";
pub const TRACING_TARGET_DELETE: &str = "stowage_engine::delete";

pub mod client;
mod credentials;
mod engine;
mod error;
mod file;
pub mod hooks;
mod mime_map;
pub mod naming;
mod options;

#[doc(hidden)]
pub mod prelude;

pub use crate::client::{
    AccessControl, BucketRef, GcsAccessControl, NoopAccessControl, ObjectRef, PutOutput,
    RemoveOutput, StorageClient,
};
pub use crate::credentials::{Credentials, ServiceAccountKey};
pub use crate::engine::{FileStorage, StorageEngine, StorageEngineBuilder};
pub use crate::error::{BoxError, Error, Operation, Result};
pub use crate::file::{ByteStream, FileInfo, IncomingFile, StoredFile};
pub use crate::hooks::{HookName, HookResult, Hooks};
pub use crate::mime_map::{MimeMap, WILDCARD};
pub use crate::naming::NamingRules;
pub use crate::options::{EngineConfig, StorageOptions};
