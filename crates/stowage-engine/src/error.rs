//! Engine error types.

use strum::{AsRefStr, Display};

use crate::hooks::HookName;

/// Boxed error used for hook failures and foreign transport errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Specialized [`Result`] type for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Backend operation that produced a [`Error::Transport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    /// Streaming the file body into the object.
    Write,
    /// Removing the object.
    Delete,
    /// Granting public read access on the object.
    MakePublic,
    /// Reading object metadata.
    Head,
    /// Checking that the bucket is reachable.
    Probe,
}

/// Error type for storage engine operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "errors should be handled appropriately"]
pub enum Error {
    /// Configuration error.
    ///
    /// Raised while constructing the engine: a missing bucket name, missing
    /// or incomplete credentials, or a backend client that could not be built.
    #[error("configuration error: {0}")]
    Config(String),

    /// Backend write, delete or ACL failure.
    #[error("{operation} failed for '{key}': {source}")]
    Transport {
        /// The backend operation that failed.
        operation: Operation,
        /// Object key the operation addressed.
        key: String,
        /// The backend error, passed through unchanged.
        #[source]
        source: BoxError,
    },

    /// The incoming file stream failed before the upload finished.
    #[error("reading upload body for '{key}' failed: {source}")]
    Source {
        /// Object key the upload was writing to.
        key: String,
        /// The stream error.
        #[source]
        source: BoxError,
    },

    /// A user hook returned an error.
    #[error("hook '{hook}' failed: {source}")]
    Hook {
        /// The hook that failed.
        hook: HookName,
        /// The error returned by the hook.
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a transport error for `operation` on `key`.
    pub fn transport(
        operation: Operation,
        key: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Transport {
            operation,
            key: key.into(),
            source: source.into(),
        }
    }

    /// Returns whether this error indicates a configuration issue.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns whether this error came from the upload path rather than
    /// from configuration or a hook.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Source { .. })
    }

    /// Returns whether this error was raised by a hook.
    pub fn is_hook_error(&self) -> bool {
        matches!(self, Self::Hook { .. })
    }

    /// Returns the failing hook, if any.
    pub fn hook_name(&self) -> Option<HookName> {
        match self {
            Self::Hook { hook, .. } => Some(*hook),
            _ => None,
        }
    }

    /// Returns whether the backend reported a missing object.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport { source, .. } => matches!(
                source.downcast_ref::<object_store::Error>(),
                Some(object_store::Error::NotFound { .. })
            ),
            _ => false,
        }
    }
}
