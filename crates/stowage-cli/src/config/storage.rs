//! Storage engine configuration.

use std::path::PathBuf;

use anyhow::{Context, Result as AnyhowResult, anyhow};
use clap::Args;
use serde::{Deserialize, Serialize};
use stowage_engine::{Credentials, StorageClient, StorageOptions};

use crate::TRACING_TARGET_CONFIG;

/// Storage engine configuration.
///
/// Either point at a JSON options document with `--storage-options`, or
/// describe the options with the individual flags. Flags given alongside an
/// options document override its values.
///
/// # Environment Variables
///
/// - `BUCKET_NAME` - Bucket to upload to
/// - `GOOGLE_APPLICATION_CREDENTIALS` - Service-account key file or inline JSON
/// - `STORAGE_OPTIONS` - Path to a JSON options document
/// - `DIRECTORY_PATH`, `NAME_PREFIX`, `NAME_SUFFIX` - Object key rules
/// - `UNIQUE`, `PUBLIC` - Key uniqueness and public visibility
/// - `MIME_MAP` - Comma-separated `fragment=content/type` overrides
/// - `APP_NAME` - Client application name
/// - `STORAGE_IN_MEMORY` - Use a process-local in-memory bucket
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct StorageConfig {
    /// Bucket to upload to.
    #[arg(long, env = "BUCKET_NAME")]
    pub bucket_name: Option<String>,

    /// Service-account key file, or the key JSON itself.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub credentials: Option<String>,

    /// JSON document with the full set of storage options.
    #[arg(long, env = "STORAGE_OPTIONS")]
    pub storage_options: Option<PathBuf>,

    /// Directory the objects are placed under.
    #[arg(long, env = "DIRECTORY_PATH")]
    pub directory_path: Option<String>,

    /// Prefix prepended to every file name.
    #[arg(long, env = "NAME_PREFIX")]
    pub name_prefix: Option<String>,

    /// Suffix appended to every file name.
    #[arg(long, env = "NAME_SUFFIX")]
    pub name_suffix: Option<String>,

    /// Append a unique token to every file name.
    #[arg(long, env = "UNIQUE")]
    #[serde(default)]
    pub unique: bool,

    /// Make uploaded objects publicly readable.
    #[arg(long, env = "PUBLIC")]
    #[serde(default)]
    pub public: bool,

    /// Content-type overrides as `fragment=content/type` pairs.
    #[arg(long, env = "MIME_MAP", value_delimiter = ',', value_parser = parse_mime_entry)]
    #[serde(default)]
    pub mime_map: Vec<(String, String)>,

    /// Name of the client application.
    #[arg(long, env = "APP_NAME")]
    pub app_name: Option<String>,

    /// Serve from a process-local in-memory bucket instead of GCS.
    #[arg(long, env = "STORAGE_IN_MEMORY")]
    #[serde(default)]
    pub in_memory: bool,
}

impl StorageConfig {
    /// Builds engine options from the options document and the flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the options document cannot be read or parsed,
    /// or if no bucket name is given anywhere.
    pub fn to_options(&self) -> AnyhowResult<StorageOptions> {
        let mut options = match &self.storage_options {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                StorageOptions::from_json(&json)?
            }
            None => StorageOptions::default(),
        };

        if let Some(bucket_name) = &self.bucket_name {
            options.bucket_name = bucket_name.clone();
        }
        if options.bucket_name.trim().is_empty() {
            return Err(anyhow!(
                "A bucket name is required. Set --bucket-name or BUCKET_NAME."
            ));
        }

        if let Some(credentials) = &self.credentials {
            options = options.with_credentials(Credentials::key_file(credentials));
        }
        if let Some(directory_path) = &self.directory_path {
            options = options.with_directory_path(directory_path);
        }
        if let Some(name_prefix) = &self.name_prefix {
            options = options.with_name_prefix(name_prefix);
        }
        if let Some(name_suffix) = &self.name_suffix {
            options = options.with_name_suffix(name_suffix);
        }
        if let Some(app_name) = &self.app_name {
            options = options.with_app_name(app_name);
        }
        for (fragment, content_type) in &self.mime_map {
            options = options.with_mime_type(fragment, content_type);
        }

        options.unique |= self.unique;
        options.public |= self.public;
        Ok(options)
    }

    /// Returns a pre-built client when one is configured.
    ///
    /// The engine initializes its own GCS client when this is `None`.
    pub fn client(&self, bucket: &str) -> Option<StorageClient> {
        self.in_memory.then(|| StorageClient::in_memory(bucket))
    }

    /// Logs the storage configuration (no secrets).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            bucket = ?self.bucket_name,
            options_file = ?self.storage_options,
            credentials = self.credentials.is_some(),
            directory_path = ?self.directory_path,
            unique = self.unique,
            public = self.public,
            mime_overrides = self.mime_map.len(),
            in_memory = self.in_memory,
            "Storage configured"
        );
    }
}

/// Parses a `fragment=content/type` pair.
fn parse_mime_entry(entry: &str) -> Result<(String, String), String> {
    match entry.split_once('=') {
        Some((fragment, content_type)) if !fragment.is_empty() && !content_type.is_empty() => {
            Ok((fragment.trim().to_string(), content_type.trim().to_string()))
        }
        _ => Err(format!("expected `fragment=content/type`, got `{entry}`")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn config(bucket: &str) -> StorageConfig {
        StorageConfig {
            bucket_name: Some(bucket.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn bucket_name_is_required() {
        assert!(StorageConfig::default().to_options().is_err());
        assert!(config("  ").to_options().is_err());
    }

    #[test]
    fn flags_map_onto_options() {
        let config = StorageConfig {
            credentials: Some("/etc/gcs/key.json".into()),
            directory_path: Some("uploads".into()),
            name_prefix: Some("p-".into()),
            unique: true,
            mime_map: vec![("*".into(), "application/octet-stream".into())],
            ..config("media")
        };

        let options = config.to_options().unwrap();
        assert_eq!(options.bucket_name, "media");
        assert!(matches!(options.credentials, Some(Credentials::KeyFile(_))));
        assert_eq!(options.directory_path.as_deref(), Some("uploads"));
        assert_eq!(options.name_prefix.as_deref(), Some("p-"));
        assert!(options.unique);
        assert!(!options.public);
        assert_eq!(
            options.mime_map.get("*").map(String::as_str),
            Some("application/octet-stream")
        );
    }

    #[test]
    fn flags_override_options_document() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"bucketName": "from-file", "directoryPath": "docs", "public": true}}"#
        )
        .unwrap();

        let config = StorageConfig {
            storage_options: Some(file.path().to_path_buf()),
            directory_path: Some("avatars".into()),
            ..Default::default()
        };
        let options = config.to_options().unwrap();

        assert_eq!(options.bucket_name, "from-file");
        assert_eq!(options.directory_path.as_deref(), Some("avatars"));
        assert!(options.public);
    }

    #[test]
    fn in_memory_client_only_when_requested() {
        assert!(config("media").client("media").is_none());

        let config = StorageConfig {
            in_memory: true,
            ..config("media")
        };
        let client = config.client("media").unwrap();
        assert_eq!(client.bucket_name(), "media");
    }

    #[test]
    fn parse_mime_entries() {
        assert_eq!(
            parse_mime_entry("avatar=image/png").unwrap(),
            ("avatar".to_string(), "image/png".to_string())
        );
        assert!(parse_mime_entry("avatar").is_err());
        assert!(parse_mime_entry("=image/png").is_err());
    }
}
