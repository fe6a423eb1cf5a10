//! Service-account credentials for self-initialized clients.
//!
//! Credentials are only consulted when the engine builds its own
//! [`StorageClient`](crate::StorageClient). A caller that supplies a
//! pre-built client skips validation entirely.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Credentials used to initialize the backend client.
///
/// Deserializes from either a JSON string (a [`KeyFile`](Self::KeyFile)
/// reference) or a JSON object (an inline [`ServiceAccountKey`]).
///
/// # Examples
///
/// ```rust
/// use stowage_engine::Credentials;
///
/// let reference: Credentials = serde_json::from_str(r#""/etc/gcs/key.json""#).unwrap();
/// assert!(matches!(reference, Credentials::KeyFile(_)));
///
/// let inline: Credentials = serde_json::from_str(
///     r#"{"projectId": "demo", "privateKey": "pem", "clientEmail": "svc@demo.iam"}"#,
/// )
/// .unwrap();
/// assert!(inline.validate().is_ok());
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    /// Path to a service-account JSON file, or the JSON document itself.
    KeyFile(String),
    /// Inline service-account record.
    ServiceAccount(ServiceAccountKey),
}

impl Credentials {
    /// Creates credentials that reference a key file or an inline JSON key.
    pub fn key_file(reference: impl Into<String>) -> Self {
        Self::KeyFile(reference.into())
    }

    /// Creates inline service-account credentials.
    pub fn service_account(
        project_id: impl Into<String>,
        private_key: impl Into<String>,
        client_email: impl Into<String>,
    ) -> Self {
        Self::ServiceAccount(ServiceAccountKey::new(project_id, private_key, client_email))
    }

    /// Validates that the credentials carry everything the client needs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a key-file reference is blank or if an
    /// inline record lacks `projectId`, `privateKey` or `clientEmail`.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::KeyFile(reference) if reference.trim().is_empty() => Err(Error::config(
                "credentials must be a key file reference or a service account object",
            )),
            Self::KeyFile(_) => Ok(()),
            Self::ServiceAccount(key) => key.validate(),
        }
    }

    /// Returns whether the reference holds a JSON document rather than a path.
    pub(crate) fn is_inline_json(reference: &str) -> bool {
        reference.trim_start().starts_with('{')
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyFile(reference) if Self::is_inline_json(reference) => {
                f.debug_tuple("KeyFile").field(&"<inline json>").finish()
            }
            Self::KeyFile(reference) => f.debug_tuple("KeyFile").field(reference).finish(),
            Self::ServiceAccount(key) => f.debug_tuple("ServiceAccount").field(key).finish(),
        }
    }
}

/// Inline service-account record.
///
/// Accepts both camelCase keys and the snake_case keys used by Google's
/// downloaded key files. Missing keys deserialize as empty strings so that
/// [`validate`](Self::validate) can report them.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountKey {
    /// Google Cloud project identifier.
    #[serde(default, alias = "project_id")]
    pub project_id: String,

    /// PEM-encoded RSA private key.
    /// Never serialized and masked in debug output.
    #[serde(default, alias = "private_key", skip_serializing)]
    pub private_key: String,

    /// Service-account email address.
    #[serde(default, alias = "client_email")]
    pub client_email: String,

    /// Identifier of the private key, when known.
    #[serde(default, alias = "private_key_id", skip_serializing_if = "Option::is_none")]
    pub private_key_id: Option<String>,
}

impl ServiceAccountKey {
    /// Creates a new service-account record.
    pub fn new(
        project_id: impl Into<String>,
        private_key: impl Into<String>,
        client_email: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            private_key: private_key.into(),
            client_email: client_email.into(),
            private_key_id: None,
        }
    }

    /// Sets the private key identifier.
    pub fn with_private_key_id(mut self, private_key_id: impl Into<String>) -> Self {
        self.private_key_id = Some(private_key_id.into());
        self
    }

    /// Checks that `projectId`, `privateKey` and `clientEmail` are present.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("projectId", &self.project_id),
            ("privateKey", &self.private_key),
            ("clientEmail", &self.client_email),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            return Ok(());
        }

        Err(Error::config(format!(
            "credential model is missing keys ({}); necessary keys are: projectId, privateKey and clientEmail",
            missing.join(", ")
        )))
    }

    /// Renders the record as a Google service-account JSON document.
    pub(crate) fn to_service_account_json(&self) -> String {
        serde_json::json!({
            "type": "service_account",
            "project_id": self.project_id,
            "private_key": self.private_key,
            "private_key_id": self.private_key_id.as_deref().unwrap_or_default(),
            "client_email": self.client_email,
        })
        .to_string()
    }

    /// Returns a masked version of the client email for logging.
    pub fn client_email_masked(&self) -> String {
        match self.client_email.split_once('@') {
            Some((user, domain)) if user.chars().count() > 3 => {
                let visible: String = user.chars().take(3).collect();
                format!("{visible}***@{domain}")
            }
            Some((_, domain)) => format!("***@{domain}"),
            None => "*".repeat(self.client_email.len()),
        }
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email_masked())
            .field("private_key", &"***")
            .field("private_key_id", &self.private_key_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_service_account_is_valid() {
        let creds = Credentials::service_account("demo", "-----BEGIN KEY-----", "svc@demo.iam");
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn reject_each_missing_field() {
        let cases = [
            ServiceAccountKey::new("", "pem", "svc@demo.iam"),
            ServiceAccountKey::new("demo", "", "svc@demo.iam"),
            ServiceAccountKey::new("demo", "pem", ""),
        ];

        for key in cases {
            let err = Credentials::ServiceAccount(key).validate().unwrap_err();
            assert!(err.is_config_error());
        }
    }

    #[test]
    fn missing_fields_are_named() {
        let err = ServiceAccountKey::new("demo", "", "").validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("privateKey, clientEmail"));
        assert!(!message.contains("(projectId"));
    }

    #[test]
    fn reject_blank_reference() {
        assert!(Credentials::key_file("  ").validate().is_err());
        assert!(Credentials::key_file("/etc/key.json").validate().is_ok());
    }

    #[test]
    fn deserialize_object_with_missing_keys() {
        let creds: Credentials = serde_json::from_str(r#"{"projectId": "demo"}"#).unwrap();
        assert!(matches!(creds, Credentials::ServiceAccount(_)));
        assert!(creds.validate().is_err());
    }

    #[test]
    fn deserialize_google_key_file_layout() {
        let creds: Credentials = serde_json::from_str(
            r#"{"project_id": "demo", "private_key": "pem", "client_email": "svc@demo.iam", "private_key_id": "abc"}"#,
        )
        .unwrap();

        let Credentials::ServiceAccount(key) = creds else {
            panic!("expected inline service account");
        };
        assert_eq!(key.project_id, "demo");
        assert_eq!(key.private_key_id.as_deref(), Some("abc"));
    }

    #[test]
    fn debug_masks_secrets() {
        let creds = Credentials::service_account("demo", "super-secret-pem", "robot@demo.iam");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret-pem"));
        assert!(!debug.contains("robot@"));
        assert!(debug.contains("rob***@demo.iam"));
    }

    #[test]
    fn service_account_json_has_google_layout() {
        let key = ServiceAccountKey::new("demo", "pem", "svc@demo.iam");
        let json: serde_json::Value = serde_json::from_str(&key.to_service_account_json()).unwrap();
        assert_eq!(json["type"], "service_account");
        assert_eq!(json["client_email"], "svc@demo.iam");
        assert_eq!(json["private_key_id"], "");
    }
}
