//! Application state and dependency injection.

use std::sync::Arc;

use stowage_engine::{FileStorage, StorageClient, StorageEngine};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn FileStorage>,
    pub client: StorageClient,
}

impl AppState {
    /// Creates state backed by `engine`.
    pub fn new(engine: StorageEngine) -> Self {
        Self {
            client: engine.client().clone(),
            storage: Arc::new(engine),
        }
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<AppState> for $t {
            fn from_ref(state: &AppState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(storage: Arc<dyn FileStorage>);
impl_di!(client: StorageClient);
