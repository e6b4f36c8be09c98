//! Bootstrap bucket lifecycle
//!
//! `Absent -> Present -> PolicyAttached`. Every step is idempotent: creating
//! a bucket the account already owns collapses to success and the policy is
//! re-attached unconditionally, so repeated or concurrent reconciles of the
//! same cluster converge on the same end state.

use std::sync::Arc;

use tracing::{debug, info};

use bootbucket_common::{ClientError, Error, Result};

use crate::client::{IdentityClient, ObjectStoreClient};
use crate::policy::{plan_grants, BucketPolicy};
use crate::scope::ClusterScope;

/// Creates, secures and deletes a cluster's bootstrap bucket
pub struct BucketManager {
    scope: ClusterScope,
    store: Arc<dyn ObjectStoreClient>,
    identity: Arc<dyn IdentityClient>,
}

impl BucketManager {
    /// Create a manager for the given cluster
    pub fn new(
        scope: ClusterScope,
        store: Arc<dyn ObjectStoreClient>,
        identity: Arc<dyn IdentityClient>,
    ) -> Self {
        Self {
            scope,
            store,
            identity,
        }
    }

    /// The cluster this manager acts on
    pub fn scope(&self) -> &ClusterScope {
        &self.scope
    }

    /// Ensure the bucket exists and carries the least-privilege read policy
    ///
    /// No-op when bucket management is disabled.
    pub async fn reconcile_bucket(&self) -> Result<()> {
        if !self.scope.bucket_management_enabled() {
            debug!(cluster = %self.scope.cluster_name, "bucket management disabled, skipping reconcile");
            return Ok(());
        }

        let bucket = self.scope.bucket_name()?;
        // Reject unusable identities before the bucket exists
        plan_grants(&self.scope.bucket)?;

        self.create_bucket_if_not_exist(&bucket).await?;
        self.ensure_bucket_policy(&bucket).await?;

        Ok(())
    }

    /// Delete the bucket
    ///
    /// The bucket is not emptied first; deleting a bucket that still holds
    /// objects fails at the store and the error is returned.
    pub async fn delete_bucket(&self) -> Result<()> {
        if !self.scope.bucket_management_enabled() {
            debug!(cluster = %self.scope.cluster_name, "bucket management disabled, skipping delete");
            return Ok(());
        }

        let bucket = self.scope.bucket_name()?;

        info!(bucket = %bucket, "Deleting S3 bucket");

        self.store
            .delete_bucket(&bucket)
            .await
            .map_err(|e| Error::transport("deleting S3 bucket", e))
    }

    /// Build the policy document for this cluster's bucket
    ///
    /// Resolves the caller's account id on every call.
    pub async fn bucket_policy(&self, bucket: &str) -> Result<BucketPolicy> {
        let account_id = self
            .identity
            .get_caller_identity()
            .await
            .map_err(|e| Error::transport("getting account ID", e))?;

        BucketPolicy::for_bucket(&self.scope.bucket, bucket, &account_id)
    }

    async fn create_bucket_if_not_exist(&self, bucket: &str) -> Result<()> {
        match self.store.create_bucket(bucket).await {
            Ok(()) => {
                info!(bucket = %bucket, "Created S3 bucket");
                Ok(())
            }
            // TODO: a bucket shared with another cluster of the same account is also "owned by you"
            Err(ClientError::BucketAlreadyOwnedByYou) => {
                debug!(bucket = %bucket, "S3 bucket already exists");
                Ok(())
            }
            Err(e) => Err(Error::transport("creating S3 bucket", e)),
        }
    }

    async fn ensure_bucket_policy(&self, bucket: &str) -> Result<()> {
        let policy = self.bucket_policy(bucket).await?.to_json()?;

        self.store
            .put_bucket_policy(bucket, &policy)
            .await
            .map_err(|e| Error::transport("creating S3 bucket policy", e))?;

        debug!(bucket = %bucket, "Attached S3 bucket policy");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockIdentityClient, MockObjectStoreClient};
    use bootbucket_common::crd::S3Bucket;
    use mockall::predicate::*;
    use parking_lot::Mutex;

    fn enabled_scope() -> ClusterScope {
        ClusterScope::new(
            "demo",
            "cluster1",
            S3Bucket {
                create: true,
                control_plane_identity: "cp-role".into(),
                node_identities: vec!["n1-role".into(), "n2-role".into()],
                ..Default::default()
            },
        )
    }

    fn identity_returning(account: &'static str) -> MockIdentityClient {
        let mut identity = MockIdentityClient::new();
        identity
            .expect_get_caller_identity()
            .returning(move || Ok(account.to_string()));
        identity
    }

    fn manager(
        scope: ClusterScope,
        store: MockObjectStoreClient,
        identity: MockIdentityClient,
    ) -> BucketManager {
        BucketManager::new(scope, Arc::new(store), Arc::new(identity))
    }

    // ==========================================================================
    // Story: Reconcile creates the bucket and attaches the policy
    // ==========================================================================

    #[tokio::test]
    async fn reconcile_creates_bucket_then_attaches_policy() {
        let mut store = MockObjectStoreClient::new();
        store
            .expect_create_bucket()
            .with(eq("demo-cluster1"))
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_put_bucket_policy()
            .withf(|bucket, policy| {
                bucket == "demo-cluster1"
                    && policy.contains("arn:aws:iam::123456789012:role/cp-role")
                    && policy.contains("arn:aws:s3:::demo-cluster1/node/*")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let result = manager(enabled_scope(), store, identity_returning("123456789012"))
            .reconcile_bucket()
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn already_owned_bucket_is_treated_as_created() {
        let mut store = MockObjectStoreClient::new();
        store
            .expect_create_bucket()
            .returning(|_| Err(ClientError::BucketAlreadyOwnedByYou));
        store
            .expect_put_bucket_policy()
            .times(1)
            .returning(|_, _| Ok(()));

        let result = manager(enabled_scope(), store, identity_returning("1"))
            .reconcile_bucket()
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn repeated_reconcile_attaches_identical_policy() {
        let policies = Arc::new(Mutex::new(Vec::new()));
        let seen = policies.clone();

        let mut creates = 0;
        let mut store = MockObjectStoreClient::new();
        store
            .expect_create_bucket()
            .times(2)
            .returning(move |_| {
                creates += 1;
                if creates == 1 {
                    Ok(())
                } else {
                    Err(ClientError::BucketAlreadyOwnedByYou)
                }
            });
        store
            .expect_put_bucket_policy()
            .times(2)
            .returning(move |_, policy| {
                seen.lock().push(policy.to_string());
                Ok(())
            });

        let manager = manager(enabled_scope(), store, identity_returning("1"));
        manager.reconcile_bucket().await.unwrap();
        manager.reconcile_bucket().await.unwrap();

        let policies = policies.lock();
        assert_eq!(policies.len(), 2);
        assert_eq!(policies[0], policies[1]);
    }

    // ==========================================================================
    // Story: Failures are wrapped with the step that failed
    // ==========================================================================

    #[tokio::test]
    async fn other_create_errors_are_fatal_and_skip_the_policy() {
        let mut store = MockObjectStoreClient::new();
        store
            .expect_create_bucket()
            .returning(|_| Err(ClientError::api("BucketAlreadyExists", "taken")));

        let err = manager(enabled_scope(), store, MockIdentityClient::new())
            .reconcile_bucket()
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("creating S3 bucket"));
    }

    #[tokio::test]
    async fn identity_failure_is_distinguished_from_attach_failure() {
        let mut store = MockObjectStoreClient::new();
        store.expect_create_bucket().returning(|_| Ok(()));
        let mut identity = MockIdentityClient::new();
        identity
            .expect_get_caller_identity()
            .returning(|| Err(ClientError::api("ExpiredToken", "expired")));

        let err = manager(enabled_scope(), store, identity)
            .reconcile_bucket()
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("getting account ID"));

        let mut store = MockObjectStoreClient::new();
        store.expect_create_bucket().returning(|_| Ok(()));
        store
            .expect_put_bucket_policy()
            .returning(|_, _| Err(ClientError::api("MalformedPolicy", "bad")));

        let err = manager(enabled_scope(), store, identity_returning("1"))
            .reconcile_bucket()
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("creating S3 bucket policy"));
    }

    #[tokio::test]
    async fn cancellation_propagates_unchanged() {
        let mut store = MockObjectStoreClient::new();
        store
            .expect_create_bucket()
            .returning(|_| Err(ClientError::Cancelled));

        let err = manager(enabled_scope(), store, MockIdentityClient::new())
            .reconcile_bucket()
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.client_error(), Some(&ClientError::Cancelled));
    }

    #[tokio::test]
    async fn empty_identity_is_rejected_before_creating_the_bucket() {
        let scope = ClusterScope::new(
            "demo",
            "cluster1",
            S3Bucket {
                create: true,
                node_identities: vec!["n1-role".into()],
                ..Default::default()
            },
        );
        let mut store = MockObjectStoreClient::new();
        store.expect_create_bucket().never();
        store.expect_put_bucket_policy().never();

        let err = manager(scope, store, MockIdentityClient::new())
            .reconcile_bucket()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn shared_identity_is_rejected_before_creating_the_bucket() {
        let scope = ClusterScope::new(
            "demo",
            "cluster1",
            S3Bucket {
                create: true,
                control_plane_identity: "shared-role".into(),
                node_identities: vec!["shared-role".into()],
                ..Default::default()
            },
        );
        let mut store = MockObjectStoreClient::new();
        store.expect_create_bucket().never();

        let err = manager(scope, store, MockIdentityClient::new())
            .reconcile_bucket()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    // ==========================================================================
    // Story: Deletion
    // ==========================================================================

    #[tokio::test]
    async fn delete_removes_the_derived_bucket() {
        let mut store = MockObjectStoreClient::new();
        store
            .expect_delete_bucket()
            .with(eq("demo-cluster1"))
            .times(1)
            .returning(|_| Ok(()));

        let result = manager(enabled_scope(), store, MockIdentityClient::new())
            .delete_bucket()
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn deleting_a_non_empty_bucket_surfaces_the_store_error() {
        let mut store = MockObjectStoreClient::new();
        store
            .expect_delete_bucket()
            .returning(|_| Err(ClientError::api("BucketNotEmpty", "not empty")));

        let err = manager(enabled_scope(), store, MockIdentityClient::new())
            .delete_bucket()
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("deleting S3 bucket"));
        assert!(err.to_string().contains("BucketNotEmpty"));
    }

    // ==========================================================================
    // Story: Disabled management short-circuits with no client calls
    // ==========================================================================

    #[tokio::test]
    async fn disabled_management_makes_no_calls() {
        let mut not_created = enabled_scope();
        not_created.bucket.create = false;
        let mut gated_off = enabled_scope();
        gated_off.bucket.enabled = false;

        for scope in [not_created, gated_off] {
            // Mocks without expectations panic on any call.
            let manager = manager(scope, MockObjectStoreClient::new(), MockIdentityClient::new());
            assert!(manager.reconcile_bucket().await.is_ok());
            assert!(manager.delete_bucket().await.is_ok());
        }
    }
}
