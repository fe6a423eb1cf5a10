//! Engine configuration.
//!
//! [`StorageOptions`] is what callers write (or deserialize from JSON);
//! [`EngineConfig`] is the immutable, resolved form the engine keeps and
//! hands to hooks.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::file::FileInfo;
use crate::mime_map::MimeMap;
use crate::naming::NamingRules;
use crate::{Credentials, Error, Result};

/// Options recognized when constructing a [`StorageEngine`](crate::StorageEngine).
///
/// # Examples
///
/// ```rust
/// use stowage_engine::{Credentials, StorageOptions};
///
/// let options = StorageOptions::new("my-app.appspot.com")
///     .with_credentials(Credentials::key_file("/etc/gcs/key.json"))
///     .with_directory_path("avatars")
///     .with_unique(true)
///     .with_public(true);
///
/// assert_eq!(options.bucket_name, "my-app.appspot.com");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[must_use = "options do nothing unless passed to the engine"]
pub struct StorageOptions {
    /// The bucket to upload to. Required.
    #[serde(default)]
    pub bucket_name: String,

    /// Credentials for a self-initialized client.
    ///
    /// Required unless a pre-built client is supplied.
    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// Directory the objects are placed under.
    #[serde(default)]
    pub directory_path: Option<String>,

    /// Content-type overrides keyed by file base name.
    #[serde(default)]
    pub mime_map: MimeMap,

    /// Name of the client application. Defaults to
    /// `stowage-{bucket}-{hex timestamp}`.
    #[serde(default)]
    pub app_name: Option<String>,

    /// Prefix prepended to every file name.
    #[serde(default)]
    pub name_prefix: Option<String>,

    /// Suffix appended to every file name.
    #[serde(default)]
    pub name_suffix: Option<String>,

    /// Append a unique token to every file name.
    #[serde(default)]
    pub unique: bool,

    /// Make uploaded objects publicly readable.
    #[serde(default)]
    pub public: bool,
}

impl StorageOptions {
    /// Creates options for `bucket_name` with every other field defaulted.
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            ..Default::default()
        }
    }

    /// Parses options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::config(format!("invalid storage options: {e}")))
    }

    /// Sets the credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the directory path.
    pub fn with_directory_path(mut self, directory_path: impl Into<String>) -> Self {
        self.directory_path = Some(directory_path.into());
        self
    }

    /// Replaces the content-type map.
    pub fn with_mime_map(mut self, mime_map: MimeMap) -> Self {
        self.mime_map = mime_map;
        self
    }

    /// Adds a single content-type override.
    pub fn with_mime_type(
        mut self,
        fragment: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        self.mime_map.insert(fragment, content_type);
        self
    }

    /// Sets the application name.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Sets the name prefix.
    pub fn with_name_prefix(mut self, name_prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(name_prefix.into());
        self
    }

    /// Sets the name suffix.
    pub fn with_name_suffix(mut self, name_suffix: impl Into<String>) -> Self {
        self.name_suffix = Some(name_suffix.into());
        self
    }

    /// Sets whether keys get a unique token.
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Sets whether uploads are made public.
    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }
}

/// Resolved, immutable engine configuration.
///
/// Hooks receive a reference to it so they can inspect how the engine is
/// set up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    bucket: String,
    app_name: String,
    naming: NamingRules,
    mime_map: MimeMap,
    public: bool,
}

impl EngineConfig {
    /// Resolves options into the configuration the engine runs with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the bucket name is missing.
    pub fn resolve(options: &StorageOptions) -> Result<Self> {
        let bucket = options.bucket_name.as_str();
        if bucket.trim().is_empty() {
            return Err(Error::config("bucket name required"));
        }

        let app_name = match options.app_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_app_name(bucket),
        };

        Ok(Self {
            bucket: bucket.to_string(),
            app_name,
            naming: NamingRules {
                directory_path: options.directory_path.clone().unwrap_or_default(),
                name_prefix: options.name_prefix.clone().unwrap_or_default(),
                name_suffix: options.name_suffix.clone().unwrap_or_default(),
                unique: options.unique,
            },
            mime_map: options.mime_map.clone(),
            public: options.public,
        })
    }

    /// Returns the bucket name.
    #[inline]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the application name.
    #[inline]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Returns the key derivation rules.
    #[inline]
    pub fn naming(&self) -> &NamingRules {
        &self.naming
    }

    /// Returns the content-type overrides.
    #[inline]
    pub fn mime_map(&self) -> &MimeMap {
        &self.mime_map
    }

    /// Returns whether uploads are made public.
    #[inline]
    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Derives the object key for `file`.
    pub fn object_key(&self, file: &FileInfo) -> String {
        self.naming.derive_key(&file.original_name)
    }

    /// Resolves the content type stored with `file`.
    pub fn content_type<'a>(&'a self, file: &'a FileInfo) -> &'a str {
        self.mime_map.resolve(&file.original_name, &file.mime_type)
    }
}

fn default_app_name(bucket: &str) -> String {
    format!("stowage-{bucket}-{:x}", Timestamp::now().as_millisecond())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_name_is_required() {
        let err = EngineConfig::resolve(&StorageOptions::default()).unwrap_err();
        assert!(err.is_config_error());

        let err = EngineConfig::resolve(&StorageOptions::new("   ")).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn bucket_name_is_kept_verbatim() {
        let config = EngineConfig::resolve(&StorageOptions::new(" media ")).unwrap();
        assert_eq!(config.bucket(), " media ");
    }

    #[test]
    fn default_app_name_uses_bucket() {
        let config = EngineConfig::resolve(&StorageOptions::new("media")).unwrap();
        let suffix = config.app_name().strip_prefix("stowage-media-").unwrap();
        assert!(i64::from_str_radix(suffix, 16).is_ok());
    }

    #[test]
    fn explicit_app_name_is_kept() {
        let options = StorageOptions::new("media").with_app_name("uploader");
        let config = EngineConfig::resolve(&options).unwrap();
        assert_eq!(config.app_name(), "uploader");
    }

    #[test]
    fn options_flow_into_naming() {
        let options = StorageOptions::new("media")
            .with_directory_path("uploads")
            .with_name_prefix("p-")
            .with_name_suffix("-s")
            .with_mime_type("photo", "image/webp");
        let config = EngineConfig::resolve(&options).unwrap();

        let file = FileInfo::new("photo.png", "image/png");
        assert_eq!(config.object_key(&file), "uploads/p-photo-s.png");
        assert_eq!(config.content_type(&file), "image/webp");
        assert!(!config.is_public());
    }

    #[test]
    fn options_from_json() {
        let options = StorageOptions::from_json(
            r#"{
                "bucketName": "media",
                "credentials": "/etc/gcs/key.json",
                "directoryPath": "docs",
                "mimeMap": {"*": "application/octet-stream"},
                "unique": true,
                "public": true
            }"#,
        )
        .unwrap();

        assert_eq!(options.bucket_name, "media");
        assert!(matches!(options.credentials, Some(Credentials::KeyFile(_))));
        assert_eq!(options.directory_path.as_deref(), Some("docs"));
        assert!(options.unique);
        assert!(options.public);
        assert!(options.name_prefix.is_none());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = StorageOptions::from_json("{\"bucketName\": 3}").unwrap_err();
        assert!(err.is_config_error());
    }
}
