//! In-memory capability clients for tests of dependent crates

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use bootbucket_common::ClientError;

use crate::client::{IdentityClient, ObjectStoreClient};

/// Object store keeping buckets, objects and policies in memory
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    buckets: Mutex<BTreeSet<String>>,
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    policies: Mutex<BTreeMap<String, String>>,
}

impl InMemoryObjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the bucket exists
    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.lock().contains(bucket)
    }

    /// Object bytes at `bucket/key`, if any
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys stored in `bucket`
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// Policy attached to `bucket`, if any
    pub fn policy(&self, bucket: &str) -> Option<String> {
        self.policies.lock().get(bucket).cloned()
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryObjectStore {
    async fn create_bucket(&self, bucket: &str) -> Result<(), ClientError> {
        if self.buckets.lock().insert(bucket.to_string()) {
            Ok(())
        } else {
            Err(ClientError::BucketAlreadyOwnedByYou)
        }
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), ClientError> {
        if !self.keys(bucket).is_empty() {
            return Err(ClientError::api(
                "BucketNotEmpty",
                "The bucket you tried to delete is not empty",
            ));
        }
        if self.buckets.lock().remove(bucket) {
            self.policies.lock().remove(bucket);
            Ok(())
        } else {
            Err(ClientError::api("NoSuchBucket", "The specified bucket does not exist"))
        }
    }

    async fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), ClientError> {
        if !self.has_bucket(bucket) {
            return Err(ClientError::api("NoSuchBucket", "The specified bucket does not exist"));
        }
        self.objects
            .lock()
            .insert((bucket.to_string(), key.to_string()), body.to_vec());
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ClientError> {
        self.object(bucket, key).ok_or(ClientError::NoSuchKey)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ClientError> {
        self.objects
            .lock()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), ClientError> {
        if !self.has_bucket(bucket) {
            return Err(ClientError::api("NoSuchBucket", "The specified bucket does not exist"));
        }
        self.policies
            .lock()
            .insert(bucket.to_string(), policy.to_string());
        Ok(())
    }
}

/// Identity client returning a fixed account id
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

#[async_trait]
impl IdentityClient for StaticIdentity {
    async fn get_caller_identity(&self) -> Result<String, ClientError> {
        Ok(self.0.clone())
    }
}
