//! Per-machine bootstrap objects
//!
//! One object per machine at `role/machineName`. Each call makes at most one
//! store request and never retries; the client owns retry and deadlines.
//! Objects stay private: machines read them through the bucket policy.

use std::sync::Arc;

use tracing::debug;

use bootbucket_common::{s3_url, Error, Result};

use crate::client::ObjectStoreClient;
use crate::scope::{bootstrap_data_key, ClusterScope, Role};

/// Stores and removes machine bootstrap payloads in the cluster bucket
pub struct ObjectStore {
    scope: ClusterScope,
    store: Arc<dyn ObjectStoreClient>,
}

impl ObjectStore {
    /// Create an object store for the given cluster
    pub fn new(scope: ClusterScope, store: Arc<dyn ObjectStoreClient>) -> Self {
        Self { scope, store }
    }

    /// Upload a machine's bootstrap data, returning its `s3://bucket/role/machine` reference
    pub async fn put(&self, role: Role, machine_name: &str, payload: &[u8]) -> Result<String> {
        self.ensure_enabled("object creation")?;
        ensure_machine_name(machine_name)?;
        if payload.is_empty() {
            return Err(Error::invalid_input("got empty data"));
        }

        let bucket = self.scope.bucket_name()?;
        let key = bootstrap_data_key(role, machine_name);

        self.store
            .put_object(&bucket, &key, payload)
            .await
            .map_err(|e| Error::transport("putting object", e))?;

        debug!(bucket = %bucket, key = %key, bytes = payload.len(), "Stored bootstrap data");
        Ok(s3_url(&bucket, &key))
    }

    /// Read a machine's bootstrap data back
    pub async fn get(&self, role: Role, machine_name: &str) -> Result<Vec<u8>> {
        self.ensure_enabled("object retrieval")?;
        ensure_machine_name(machine_name)?;

        let bucket = self.scope.bucket_name()?;
        let key = bootstrap_data_key(role, machine_name);

        self.store
            .get_object(&bucket, &key)
            .await
            .map_err(|e| Error::transport("getting object", e))
    }

    /// Remove a machine's bootstrap data
    ///
    /// Best-effort cleanup: whatever the store reports for a missing key is
    /// returned as-is.
    pub async fn delete(&self, role: Role, machine_name: &str) -> Result<()> {
        self.ensure_enabled("object deletion")?;
        ensure_machine_name(machine_name)?;

        let bucket = self.scope.bucket_name()?;
        let key = bootstrap_data_key(role, machine_name);

        self.store
            .delete_object(&bucket, &key)
            .await
            .map_err(|e| Error::transport("deleting object", e))?;

        debug!(bucket = %bucket, key = %key, "Deleted bootstrap data");
        Ok(())
    }

    fn ensure_enabled(&self, operation: &'static str) -> Result<()> {
        if self.scope.bucket_management_enabled() {
            Ok(())
        } else {
            Err(Error::disabled(operation))
        }
    }
}

fn ensure_machine_name(machine_name: &str) -> Result<()> {
    if machine_name.is_empty() {
        return Err(Error::invalid_input("machine name can't be empty"));
    }
    Ok(())
}
