//! Bucket policy command
//!
//! Renders the policy bootbucket would attach, without touching AWS.

use std::path::PathBuf;

use clap::Args;

use bootbucket_common::crd::S3Bucket;
use bootbucket_s3::{BucketPolicy, ClusterScope};

use super::read_yaml;
use crate::Result;

/// Print the bucket policy for a bucket spec
#[derive(Args, Debug)]
pub struct PolicyArgs {
    /// Path to the S3Bucket spec YAML
    #[arg(long)]
    pub bucket_spec: PathBuf,

    /// Namespace of the cluster
    #[arg(long)]
    pub namespace: String,

    /// Name of the cluster
    #[arg(long)]
    pub cluster: String,

    /// AWS account owning the identities
    #[arg(long, env = "AWS_ACCOUNT_ID")]
    pub account_id: String,
}

/// Build the policy JSON for a spec
pub fn render_policy(
    spec: S3Bucket,
    namespace: &str,
    cluster: &str,
    account_id: &str,
) -> Result<String> {
    let scope = ClusterScope::new(namespace, cluster, spec);
    let bucket = scope.bucket_name()?;
    let policy = BucketPolicy::for_bucket(&scope.bucket, &bucket, account_id)?;
    Ok(policy.to_json()?)
}

/// Run the policy command
pub fn run(args: PolicyArgs) -> Result<()> {
    let spec: S3Bucket = read_yaml(&args.bucket_spec)?;
    println!(
        "{}",
        render_policy(spec, &args.namespace, &args.cluster, &args.account_id)?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::file_with;

    fn spec() -> S3Bucket {
        S3Bucket {
            create: true,
            control_plane_identity: "cp-role".into(),
            node_identities: vec!["n1".into(), "n2".into()],
            ..Default::default()
        }
    }

    #[test]
    fn policy_has_one_statement_per_identity() {
        let json = render_policy(spec(), "demo", "cluster1", "123456789012").unwrap();
        let policy: serde_json::Value = serde_json::from_str(&json).unwrap();

        let statements = policy["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 3);
        assert_eq!(
            statements[0]["Principal"]["AWS"],
            "arn:aws:iam::123456789012:role/cp-role"
        );
        assert_eq!(
            statements[0]["Resource"],
            "arn:aws:s3:::demo-cluster1/control-plane/*"
        );
        assert_eq!(statements[2]["Resource"], "arn:aws:s3:::demo-cluster1/node/*");
    }

    #[test]
    fn spec_without_nodes_is_rejected() {
        let spec = S3Bucket {
            node_identities: Vec::new(),
            ..spec()
        };
        assert!(render_policy(spec, "demo", "cluster1", "123456789012").is_err());
    }

    #[test]
    fn run_reads_the_spec_file() {
        let file = file_with("create: true\ncontrolPlaneIdentity: cp\nnodeIdentities: [n]\n");
        let args = PolicyArgs {
            bucket_spec: file.path().to_path_buf(),
            namespace: "demo".into(),
            cluster: "cluster1".into(),
            account_id: "123456789012".into(),
        };
        assert!(run(args).is_ok());
    }
}
