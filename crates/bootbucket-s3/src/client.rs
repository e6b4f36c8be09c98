//! Cloud capability clients
//!
//! The concrete AWS SDK clients live with the caller. These traits are the
//! seam: implementations must be safe to share between concurrent reconciles
//! and carry their own retry, deadline and cancellation handling.

use async_trait::async_trait;
#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use bootbucket_common::ClientError;

/// S3-compatible object store operations used by bootbucket
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Create a bucket; returns `BucketAlreadyOwnedByYou` if the caller already has it
    async fn create_bucket(&self, bucket: &str) -> Result<(), ClientError>;

    /// Delete an (empty) bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<(), ClientError>;

    /// Write an object, replacing any existing object at the key
    async fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), ClientError>;

    /// Read an object's bytes
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ClientError>;

    /// Delete an object
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ClientError>;

    /// Attach or replace the bucket policy document
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), ClientError>;
}

/// Caller identity lookup (STS `GetCallerIdentity`)
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Return the account id of the credentials in use
    async fn get_caller_identity(&self) -> Result<String, ClientError>;
}
