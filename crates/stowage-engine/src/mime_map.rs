//! Content-type overrides keyed by file base name.

use std::collections::HashMap;

use derive_more::Deref;
use serde::{Deserialize, Serialize};

use crate::naming::split_file_name;

/// Key that matches every file when no base-name entry does.
pub const WILDCARD: &str = "*";

/// Mapping from a file's base name to the content type stored with it.
///
/// Lookup order is the exact base name, then [`WILDCARD`], then the type
/// the client declared. An empty mapped value counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MimeMap(HashMap<String, String>);

impl MimeMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override for `fragment` (a base name or [`WILDCARD`]).
    pub fn with(mut self, fragment: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.insert(fragment, content_type);
        self
    }

    /// Inserts an override, replacing any previous value.
    pub fn insert(&mut self, fragment: impl Into<String>, content_type: impl Into<String>) {
        self.0.insert(fragment.into(), content_type.into());
    }

    /// Resolves the content type for `file_name`.
    ///
    /// ```rust
    /// use stowage_engine::MimeMap;
    ///
    /// let map = MimeMap::new().with("avatar", "image/webp");
    /// assert_eq!(map.resolve("avatar.png", "image/png"), "image/webp");
    /// assert_eq!(map.resolve("banner.png", "image/png"), "image/png");
    /// ```
    pub fn resolve<'a>(&'a self, file_name: &str, declared: &'a str) -> &'a str {
        let (base, _) = split_file_name(file_name);
        self.lookup(base)
            .or_else(|| self.lookup(WILDCARD))
            .unwrap_or(declared)
    }

    fn lookup(&self, fragment: &str) -> Option<&str> {
        self.0
            .get(fragment)
            .map(String::as_str)
            .filter(|content_type| !content_type.is_empty())
    }
}

impl<K, V> FromIterator<(K, V)> for MimeMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
