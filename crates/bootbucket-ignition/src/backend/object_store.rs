//! Catalog templates with payloads uploaded to the object store

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use bootbucket_common::{s3_url, Error};
use bootbucket_s3::ObjectStoreClient;

use super::static_template::catalog_template;
use super::TemplateBackend;
use crate::config::BackendConfig;
use crate::error::Result;
use crate::model::NodeModel;
use crate::types::Config;

/// Backend uploading each payload to `{userDataDir}/{uuid}` in the user-data bucket
///
/// [`TemplateBackend::file_path`] reports only the last upload, so one
/// backend serves one machine. Build a backend per machine to keep each
/// machine's payload key.
pub struct ObjectStoreBackend {
    config: BackendConfig,
    client: Arc<dyn ObjectStoreClient>,
    // Key of the last upload; overwritten by every apply
    file_path: RwLock<String>,
}

impl ObjectStoreBackend {
    /// Create a backend writing through `client`
    pub fn new(config: BackendConfig, client: Arc<dyn ObjectStoreClient>) -> Self {
        Self {
            config,
            client,
            file_path: RwLock::new(String::new()),
        }
    }

    fn fresh_key(&self) -> String {
        format!(
            "{}/{}",
            self.config.user_data_dir.trim_end_matches('/'),
            Uuid::new_v4()
        )
    }
}

#[async_trait]
impl TemplateBackend for ObjectStoreBackend {
    async fn get_template(&self, node: &NodeModel) -> Result<Config> {
        catalog_template(&self.config, node)
    }

    async fn apply_config(&self, payload: &[u8]) -> Result<Config> {
        if payload.is_empty() {
            return Err(Error::invalid_input("got empty data").into());
        }

        let bucket = &self.config.user_data_bucket;
        let key = self.fresh_key();
        debug!(bucket = %bucket, key = %key, bytes = payload.len(), "Uploading user data");

        self.client
            .put_object(bucket, &key, payload)
            .await
            .map_err(|e| Error::transport("putting user data object", e))?;

        let reference = s3_url(bucket, &key);
        *self.file_path.write() = key;
        info!(reference = %reference, "Stored user data");

        Ok(Config::replaced_by(reference))
    }

    fn user_data_dir(&self) -> &str {
        &self.config.user_data_dir
    }

    fn user_data_bucket(&self) -> &str {
        &self.config.user_data_bucket
    }

    fn file_path(&self) -> String {
        self.file_path.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootbucket_common::ClientError;
    use bootbucket_s3::testing::InMemoryObjectStore;
    use bootbucket_s3::client::MockObjectStoreClient;

    async fn store_with_bucket() -> Arc<InMemoryObjectStore> {
        let store = Arc::new(InMemoryObjectStore::new());
        store.create_bucket("ignition-userdata-bucket").await.unwrap();
        store
    }

    #[tokio::test]
    async fn apply_uploads_payload_under_user_data_dir() {
        let store = store_with_bucket().await;
        let backend = ObjectStoreBackend::new(BackendConfig::default(), store.clone());

        let config = backend.apply_config(b"{\"ignition\":{}}").await.unwrap();

        let key = backend.file_path();
        assert!(key.starts_with("node-userdata/"));
        assert_eq!(key.len(), "node-userdata/".len() + 36);
        assert_eq!(
            store.object("ignition-userdata-bucket", &key).unwrap(),
            b"{\"ignition\":{}}"
        );
        assert_eq!(
            config.ignition.config.replace.unwrap().source,
            format!("s3://ignition-userdata-bucket/{}", key)
        );
    }

    #[tokio::test]
    async fn every_apply_uses_a_fresh_key() {
        let store = store_with_bucket().await;
        let backend = ObjectStoreBackend::new(BackendConfig::default(), store.clone());

        backend.apply_config(b"one").await.unwrap();
        let first = backend.file_path();
        backend.apply_config(b"two").await.unwrap();
        let second = backend.file_path();

        assert_ne!(first, second);
        assert_eq!(store.keys("ignition-userdata-bucket").len(), 2);
    }

    #[tokio::test]
    async fn configured_dir_is_used() {
        let store = Arc::new(InMemoryObjectStore::new());
        store.create_bucket("templates").await.unwrap();
        let config = BackendConfig {
            user_data_bucket: "templates".into(),
            user_data_dir: "custom/dir/".into(),
            ..Default::default()
        };
        let backend = ObjectStoreBackend::new(config, store);

        backend.apply_config(b"x").await.unwrap();
        assert!(backend.file_path().starts_with("custom/dir/"));
        assert!(!backend.file_path().contains("//"));
    }

    #[tokio::test]
    async fn upload_failure_is_wrapped_and_path_unchanged() {
        let mut client = MockObjectStoreClient::new();
        client
            .expect_put_object()
            .times(1)
            .returning(|_, _, _| Err(ClientError::Timeout));
        let backend = ObjectStoreBackend::new(BackendConfig::default(), Arc::new(client));

        let err = backend.apply_config(b"data").await.unwrap_err();
        assert!(err.to_string().starts_with("putting user data object"));
        assert_eq!(backend.file_path(), "");
    }

    #[tokio::test]
    async fn template_comes_from_catalog() {
        let backend = ObjectStoreBackend::new(
            BackendConfig::default(),
            Arc::new(MockObjectStoreClient::new()),
        );
        let node = NodeModel {
            version: "v1.16.8".into(),
            ..Default::default()
        };
        let config = backend.get_template(&node).await.unwrap();
        assert_eq!(
            config.ignition.config.append[0].source,
            "s3://ignition-userdata-bucket/ignition-config/k8s-v1.16.8.ign"
        );
    }
}
