//! Cluster and machine scope
//!
//! Inputs the reconciler hands to bootbucket for one cluster: its identity
//! and bucket spec. The role type scopes object keys and policy prefixes.

use std::fmt;

use serde::{Deserialize, Serialize};

use bootbucket_common::crd::S3Bucket;
use bootbucket_common::Result;

use crate::name::derive_bucket_name;

/// Function tag of a machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Control plane machine
    ControlPlane,
    /// Worker machine
    Node,
}

impl Role {
    /// Path prefix and key segment for this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ControlPlane => "control-plane",
            Role::Node => "node",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object key of a machine's bootstrap data (`role/machineName`)
pub fn bootstrap_data_key(role: Role, machine_name: &str) -> String {
    format!("{}/{}", role.as_str(), machine_name)
}

/// Identity and bucket configuration of one cluster
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterScope {
    /// Namespace of the cluster object
    pub namespace: String,
    /// Kubernetes cluster name
    pub cluster_name: String,
    /// Bootstrap bucket configuration
    pub bucket: S3Bucket,
}

impl ClusterScope {
    /// Create a scope for the given cluster
    pub fn new(namespace: impl Into<String>, cluster_name: impl Into<String>, bucket: S3Bucket) -> Self {
        Self {
            namespace: namespace.into(),
            cluster_name: cluster_name.into(),
            bucket,
        }
    }

    /// Whether bucket and object management is active for this cluster
    pub fn bucket_management_enabled(&self) -> bool {
        self.bucket.management_enabled()
    }

    /// Derive the bucket name for this cluster
    pub fn bucket_name(&self) -> Result<String> {
        derive_bucket_name(
            self.bucket.explicit_name(),
            &self.namespace,
            &self.cluster_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_match_key_prefixes() {
        assert_eq!(Role::ControlPlane.to_string(), "control-plane");
        assert_eq!(Role::Node.to_string(), "node");
        assert_eq!(bootstrap_data_key(Role::Node, "worker-0"), "node/worker-0");
        assert_eq!(
            bootstrap_data_key(Role::ControlPlane, "cp-0"),
            "control-plane/cp-0"
        );
    }

    #[test]
    fn role_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Role::ControlPlane).unwrap(),
            "\"control-plane\""
        );
        let role: Role = serde_json::from_str("\"node\"").unwrap();
        assert_eq!(role, Role::Node);
    }

    #[test]
    fn scope_prefers_explicit_bucket_name() {
        let scope = ClusterScope::new(
            "demo",
            "cluster1",
            S3Bucket {
                name: Some("explicit".into()),
                ..Default::default()
            },
        );
        assert_eq!(scope.bucket_name().unwrap(), "explicit");

        let scope = ClusterScope::new("demo", "cluster1", S3Bucket::default());
        assert_eq!(scope.bucket_name().unwrap(), "demo-cluster1");
    }
}
