//! Lifecycle hooks.
//!
//! [`Hooks`] holds at most one callable per [`HookName`]. A hook that is not
//! registered is a no-op. A hook that returns `Err` aborts the triggering
//! operation with [`Error::Hook`].

use std::fmt;
use std::sync::Arc;

use http::request::Parts;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::client::{BucketRef, ObjectRef, StorageClient};
use crate::file::FileInfo;
use crate::options::EngineConfig;
use crate::{BoxError, Error, Result, TRACING_TARGET_HOOKS};

/// Value returned by every hook.
pub type HookResult = std::result::Result<(), BoxError>;

type InitHook = Arc<dyn Fn(&EngineConfig) -> HookResult + Send + Sync>;
type ClientHook = Arc<dyn Fn(&EngineConfig, &StorageClient) -> HookResult + Send + Sync>;
type RequestHook = Arc<dyn Fn(&EngineConfig, &Parts, &FileInfo) -> HookResult + Send + Sync>;
type ObjectHook = Arc<
    dyn Fn(&EngineConfig, &Parts, &FileInfo, &ObjectRef, &BucketRef) -> HookResult + Send + Sync,
>;

/// The six lifecycle points a hook can be attached to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "camelCase")]
pub enum HookName {
    /// Before the backend client is set up.
    BeforeInit,
    /// After the backend client is set up.
    AfterInit,
    /// Before an upload starts.
    BeforeUpload,
    /// After an upload completed.
    AfterUpload,
    /// Before a delete is issued.
    BeforeDelete,
    /// After a delete returned, whether it succeeded or not.
    AfterDelete,
}

/// Registered lifecycle hooks.
///
/// # Examples
///
/// ```rust
/// use stowage_engine::{HookName, Hooks};
///
/// let hooks = Hooks::new()
///     .before_upload(|_config, _request, file| {
///         if file.original_name.ends_with(".exe") {
///             return Err("executables are not accepted".into());
///         }
///         Ok(())
///     });
///
/// assert_eq!(hooks.registered(), vec![HookName::BeforeUpload]);
/// ```
#[derive(Clone, Default)]
pub struct Hooks {
    before_init: Option<InitHook>,
    after_init: Option<ClientHook>,
    before_upload: Option<RequestHook>,
    after_upload: Option<ObjectHook>,
    before_delete: Option<RequestHook>,
    after_delete: Option<ObjectHook>,
}

impl Hooks {
    /// Creates an empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the `beforeInit` hook.
    pub fn before_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EngineConfig) -> HookResult + Send + Sync + 'static,
    {
        self.before_init = Some(Arc::new(hook));
        self
    }

    /// Registers the `afterInit` hook.
    pub fn after_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EngineConfig, &StorageClient) -> HookResult + Send + Sync + 'static,
    {
        self.after_init = Some(Arc::new(hook));
        self
    }

    /// Registers the `beforeUpload` hook.
    pub fn before_upload<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EngineConfig, &Parts, &FileInfo) -> HookResult + Send + Sync + 'static,
    {
        self.before_upload = Some(Arc::new(hook));
        self
    }

    /// Registers the `afterUpload` hook.
    ///
    /// The references it receives are the ones returned in the
    /// [`StoredFile`](crate::StoredFile).
    pub fn after_upload<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EngineConfig, &Parts, &FileInfo, &ObjectRef, &BucketRef) -> HookResult
            + Send
            + Sync
            + 'static,
    {
        self.after_upload = Some(Arc::new(hook));
        self
    }

    /// Registers the `beforeDelete` hook.
    pub fn before_delete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EngineConfig, &Parts, &FileInfo) -> HookResult + Send + Sync + 'static,
    {
        self.before_delete = Some(Arc::new(hook));
        self
    }

    /// Registers the `afterDelete` hook.
    pub fn after_delete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EngineConfig, &Parts, &FileInfo, &ObjectRef, &BucketRef) -> HookResult
            + Send
            + Sync
            + 'static,
    {
        self.after_delete = Some(Arc::new(hook));
        self
    }

    /// Returns whether a hook is registered under `name`.
    pub fn contains(&self, name: HookName) -> bool {
        match name {
            HookName::BeforeInit => self.before_init.is_some(),
            HookName::AfterInit => self.after_init.is_some(),
            HookName::BeforeUpload => self.before_upload.is_some(),
            HookName::AfterUpload => self.after_upload.is_some(),
            HookName::BeforeDelete => self.before_delete.is_some(),
            HookName::AfterDelete => self.after_delete.is_some(),
        }
    }

    /// Returns the names of the registered hooks in lifecycle order.
    pub fn registered(&self) -> Vec<HookName> {
        HookName::iter().filter(|name| self.contains(*name)).collect()
    }

    /// Returns whether no hook is registered.
    pub fn is_empty(&self) -> bool {
        HookName::iter().all(|name| !self.contains(name))
    }

    pub(crate) fn call_before_init(&self, config: &EngineConfig) -> Result<()> {
        dispatch(HookName::BeforeInit, self.before_init.as_deref(), |hook| {
            hook(config)
        })
    }

    pub(crate) fn call_after_init(
        &self,
        config: &EngineConfig,
        client: &StorageClient,
    ) -> Result<()> {
        dispatch(HookName::AfterInit, self.after_init.as_deref(), |hook| {
            hook(config, client)
        })
    }

    pub(crate) fn call_before_upload(
        &self,
        config: &EngineConfig,
        request: &Parts,
        file: &FileInfo,
    ) -> Result<()> {
        dispatch(HookName::BeforeUpload, self.before_upload.as_deref(), |hook| {
            hook(config, request, file)
        })
    }

    pub(crate) fn call_after_upload(
        &self,
        config: &EngineConfig,
        request: &Parts,
        file: &FileInfo,
        object: &ObjectRef,
        bucket: &BucketRef,
    ) -> Result<()> {
        dispatch(HookName::AfterUpload, self.after_upload.as_deref(), |hook| {
            hook(config, request, file, object, bucket)
        })
    }

    pub(crate) fn call_before_delete(
        &self,
        config: &EngineConfig,
        request: &Parts,
        file: &FileInfo,
    ) -> Result<()> {
        dispatch(HookName::BeforeDelete, self.before_delete.as_deref(), |hook| {
            hook(config, request, file)
        })
    }

    pub(crate) fn call_after_delete(
        &self,
        config: &EngineConfig,
        request: &Parts,
        file: &FileInfo,
        object: &ObjectRef,
        bucket: &BucketRef,
    ) -> Result<()> {
        dispatch(HookName::AfterDelete, self.after_delete.as_deref(), |hook| {
            hook(config, request, file, object, bucket)
        })
    }
}

fn dispatch<H: ?Sized>(
    name: HookName,
    hook: Option<&H>,
    invoke: impl FnOnce(&H) -> HookResult,
) -> Result<()> {
    let Some(hook) = hook else {
        tracing::trace!(target: TRACING_TARGET_HOOKS, hook = %name, "no hook registered");
        return Ok(());
    };

    tracing::trace!(target: TRACING_TARGET_HOOKS, hook = %name, "calling hook");
    invoke(hook).map_err(|source| {
        tracing::debug!(
            target: TRACING_TARGET_HOOKS,
            hook = %name,
            error = %source,
            "hook rejected the operation"
        );
        Error::Hook { hook: name, source }
    })
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.registered()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::StorageOptions;

    fn config() -> EngineConfig {
        EngineConfig::resolve(&StorageOptions::new("media")).unwrap()
    }

    fn request() -> Parts {
        http::Request::new(()).into_parts().0
    }

    #[test]
    fn names_display_in_camel_case() {
        assert_eq!(HookName::BeforeInit.to_string(), "beforeInit");
        assert_eq!(HookName::AfterDelete.as_ref(), "afterDelete");
        assert_eq!(
            HookName::from_str("afterUpload").unwrap(),
            HookName::AfterUpload
        );
        assert_eq!(HookName::iter().count(), 6);
    }

    #[test]
    fn empty_hooks_are_no_ops() {
        let hooks = Hooks::new();
        let config = config();
        let file = FileInfo::new("a.txt", "text/plain");

        assert!(hooks.is_empty());
        hooks.call_before_init(&config).unwrap();
        hooks.call_before_upload(&config, &request(), &file).unwrap();
        hooks.call_before_delete(&config, &request(), &file).unwrap();
    }

    #[test]
    fn registered_hook_is_called_with_config() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let hooks = Hooks::new().before_init(move |config| {
            assert_eq!(config.bucket(), "media");
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        hooks.call_before_init(&config()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hook_error_names_the_hook() {
        let hooks = Hooks::new().before_upload(|_, _, _| Err("rejected".into()));
        let file = FileInfo::new("a.txt", "text/plain");

        let err = hooks
            .call_before_upload(&config(), &request(), &file)
            .unwrap_err();
        assert!(err.is_hook_error());
        assert_eq!(err.hook_name(), Some(HookName::BeforeUpload));
        assert_eq!(err.to_string(), "hook 'beforeUpload' failed: rejected");
    }

    #[test]
    fn hook_sees_request_parts() {
        let hooks = Hooks::new().before_delete(|_, request, _| {
            match request.headers.get("x-user") {
                Some(_) => Ok(()),
                None => Err("anonymous delete".into()),
            }
        });
        let file = FileInfo::new("a.txt", "text/plain");

        let (mut parts, ()) = http::Request::new(()).into_parts();
        assert!(hooks.call_before_delete(&config(), &parts, &file).is_err());

        parts.headers.insert("x-user", "alice".parse().unwrap());
        hooks.call_before_delete(&config(), &parts, &file).unwrap();
    }

    #[test]
    fn registered_lists_in_lifecycle_order() {
        let hooks = Hooks::new()
            .after_delete(|_, _, _, _, _| Ok(()))
            .after_init(|_, _| Ok(()));

        assert_eq!(
            hooks.registered(),
            vec![HookName::AfterInit, HookName::AfterDelete]
        );
        assert_eq!(format!("{hooks:?}"), "{AfterInit, AfterDelete}");
    }
}
