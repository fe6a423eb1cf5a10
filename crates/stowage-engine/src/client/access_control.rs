//! Public-visibility seam.
//!
//! `object_store` has no notion of object ACLs, so granting public read
//! access goes through [`AccessControl`]. Self-initialized GCS clients use
//! [`GcsAccessControl`]; caller-supplied clients default to
//! [`NoopAccessControl`].

use std::fmt;

use object_store::gcp::GcpCredentialProvider;
use url::Url;

use crate::BoxError;

/// Default GCS JSON API endpoint.
pub const GCS_API_BASE: &str = "https://storage.googleapis.com";

/// Grants public read access to stored objects.
#[async_trait::async_trait]
pub trait AccessControl: Send + Sync + 'static {
    /// Short identifier used in logs (e.g. `"gcs"`).
    fn id(&self) -> &str;

    /// Makes `key` in `bucket` readable by anyone.
    async fn make_public(&self, bucket: &str, key: &str) -> Result<(), BoxError>;
}

/// Access control for stores whose objects are already served publicly,
/// or that have no ACLs at all (local and in-memory stores).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAccessControl;

#[async_trait::async_trait]
impl AccessControl for NoopAccessControl {
    fn id(&self) -> &str {
        "noop"
    }

    async fn make_public(&self, _bucket: &str, _key: &str) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Inserts an `allUsers: READER` ACL entry through the GCS JSON API,
/// authenticated with the same credentials as the object store.
#[derive(Clone)]
pub struct GcsAccessControl {
    http: reqwest::Client,
    credentials: GcpCredentialProvider,
    api_base: Url,
}

impl GcsAccessControl {
    /// Creates access control backed by `credentials`.
    pub fn new(credentials: GcpCredentialProvider) -> Result<Self, BoxError> {
        Ok(Self {
            http: reqwest::Client::new(),
            credentials,
            api_base: Url::parse(GCS_API_BASE)?,
        })
    }

    /// Points the client at another API endpoint (e.g. an emulator).
    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = api_base;
        self
    }

    /// Builds `{base}/storage/v1/b/{bucket}/o/{object}/acl`.
    ///
    /// The object name is a single path segment, so `/` inside it is
    /// percent-encoded.
    fn acl_url(&self, bucket: &str, key: &str) -> Result<Url, BoxError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| format!("'{}' cannot be used as an API base", self.api_base))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", bucket, "o", key, "acl"]);
        Ok(url)
    }
}

impl fmt::Debug for GcsAccessControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsAccessControl")
            .field("api_base", &self.api_base.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl AccessControl for GcsAccessControl {
    fn id(&self) -> &str {
        "gcs"
    }

    async fn make_public(&self, bucket: &str, key: &str) -> Result<(), BoxError> {
        let credential = self.credentials.get_credential().await?;
        let url = self.acl_url(bucket, key)?;

        self.http
            .post(url)
            .bearer_auth(&credential.bearer)
            .json(&serde_json::json!({ "entity": "allUsers", "role": "READER" }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use object_store::StaticCredentialProvider;
    use object_store::gcp::GcpCredential;

    use super::*;

    fn access_control() -> GcsAccessControl {
        let credential = GcpCredential {
            bearer: "token".to_string(),
        };
        GcsAccessControl::new(Arc::new(StaticCredentialProvider::new(credential))).unwrap()
    }

    #[test]
    fn acl_url_encodes_object_name() {
        let url = access_control()
            .acl_url("media", "uploads/photo one.png")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/media/o/uploads%2Fphoto%20one.png/acl"
        );
    }

    #[test]
    fn acl_url_respects_custom_base() {
        let base = Url::parse("http://localhost:4443/").unwrap();
        let url = access_control()
            .with_api_base(base)
            .acl_url("media", "a.txt")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:4443/storage/v1/b/media/o/a.txt/acl"
        );
    }

    #[tokio::test]
    async fn noop_always_succeeds() {
        NoopAccessControl.make_public("media", "a.txt").await.unwrap();
    }
}
