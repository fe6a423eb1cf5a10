//! Object key derivation.
//!
//! Keys follow the format
//! `{directory_path}/{name_prefix}{base}{name_suffix}{unique_token}.{extension}`,
//! where `base` and `extension` are the first two `.`-separated segments of
//! the original file name. Any further segments are dropped, so `a.tar.gz`
//! is stored as `a.tar`. A name without a dot keeps a trailing `.`.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Splits a file name into its base and first extension segment.
///
/// The extension is empty when the name has no `.`.
///
/// ```rust
/// use stowage_engine::naming::split_file_name;
///
/// assert_eq!(split_file_name("photo.png"), ("photo", "png"));
/// assert_eq!(split_file_name("a.tar.gz"), ("a", "tar"));
/// assert_eq!(split_file_name("README"), ("README", ""));
/// ```
pub fn split_file_name(file_name: &str) -> (&str, &str) {
    let mut segments = file_name.split('.');
    let base = segments.next().unwrap_or_default();
    let extension = segments.next().unwrap_or_default();
    (base, extension)
}

/// Returns a token that makes a key unique: the current Unix time in
/// milliseconds, as lowercase hexadecimal.
pub fn unique_token() -> String {
    format!("{:x}", Timestamp::now().as_millisecond())
}

/// Rules that turn an original file name into an object key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingRules {
    /// Directory the object is placed under. Empty means the bucket root.
    #[serde(default)]
    pub directory_path: String,
    /// Prepended to the base name.
    #[serde(default)]
    pub name_prefix: String,
    /// Appended to the base name, before the unique token.
    #[serde(default)]
    pub name_suffix: String,
    /// Whether to append a [`unique_token`] to the base name.
    #[serde(default)]
    pub unique: bool,
}

impl NamingRules {
    /// Derives the object key for `file_name`.
    pub fn derive_key(&self, file_name: &str) -> String {
        let token = self.unique.then(unique_token);
        self.compose(file_name, token.as_deref())
    }

    fn compose(&self, file_name: &str, token: Option<&str>) -> String {
        let (base, extension) = split_file_name(file_name);
        let mut key = String::with_capacity(
            self.directory_path.len() + self.name_prefix.len() + file_name.len() + 32,
        );

        if !self.directory_path.is_empty() {
            key.push_str(&self.directory_path);
            key.push('/');
        }

        key.push_str(&self.name_prefix);
        key.push_str(base);
        key.push_str(&self.name_suffix);
        key.push_str(token.unwrap_or_default());
        key.push('.');
        key.push_str(extension);
        key
    }
}
