//! Per-machine user-data service
//!
//! Binds a [`Factory`] to one node model and an optional object store
//! client for cleaning up uploaded payloads.

use std::sync::Arc;

use tracing::{debug, info};

use bootbucket_common::{ClientError, Error};
use bootbucket_s3::ObjectStoreClient;

use crate::error::Result;
use crate::factory::Factory;
use crate::model::NodeModel;

/// Generates, applies and removes one machine's user data
///
/// `delete` removes the key of the factory's last apply. Each service must
/// own its factory; a factory shared between machines would leave every
/// machine but the last one without a key to delete.
pub struct UserDataService {
    factory: Factory,
    node: NodeModel,
    client: Option<Arc<dyn ObjectStoreClient>>,
}

impl UserDataService {
    /// Service without cleanup support; `delete` is then a no-op
    pub fn new(factory: Factory, node: NodeModel) -> Self {
        Self {
            factory,
            node,
            client: None,
        }
    }

    /// Use `client` to remove uploaded payloads
    pub fn with_client(mut self, client: Arc<dyn ObjectStoreClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// The node model this service renders
    pub fn node(&self) -> &NodeModel {
        &self.node
    }

    /// The underlying factory
    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// Serialized Ignition config for the node
    pub async fn user_data(&self) -> Result<Vec<u8>> {
        self.factory.generate_user_data(&self.node).await
    }

    /// Persist rendered user data, returning the document that points at it
    pub async fn create(&self, data: &[u8]) -> Result<Vec<u8>> {
        let document = self.factory.apply_config(&self.node, data).await?;
        info!(
            bucket = %self.factory.user_data_bucket(),
            key = %self.factory.file_path(),
            "Applied user data"
        );
        Ok(document)
    }

    /// Remove the most recently uploaded payload
    ///
    /// Nothing uploaded, no client, or an already-missing object all count
    /// as success.
    pub async fn delete(&self) -> Result<()> {
        let key = self.factory.file_path();
        if key.is_empty() {
            debug!("No uploaded user data to delete");
            return Ok(());
        }
        let Some(client) = &self.client else {
            debug!(key = %key, "No object store client, leaving user data in place");
            return Ok(());
        };

        let bucket = self.factory.user_data_bucket();
        match client.delete_object(bucket, &key).await {
            Ok(()) | Err(ClientError::NoSuchKey) => {
                info!(bucket = %bucket, key = %key, "Deleted user data");
                Ok(())
            }
            Err(e) => Err(Error::transport("deleting user data object", e).into()),
        }
    }
}
