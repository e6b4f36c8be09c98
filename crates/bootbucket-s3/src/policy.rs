//! Bucket access policy
//!
//! Each machine role may read only its own key prefix. The builder derives
//! the resource ARN from the role of the grant, so a statement can never
//! pair a principal with another role's prefix.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use bootbucket_common::crd::S3Bucket;
use bootbucket_common::{Error, Result};

use crate::scope::Role;

/// IAM policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// The only action bootbucket grants
pub const GET_OBJECT_ACTION: &str = "s3:GetObject";

/// Statement id of the control plane grant
pub const CONTROL_PLANE_SID: &str = "control-plane";

/// Bucket policy document
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct BucketPolicy {
    /// Policy language version
    pub version: String,
    /// Grants, one per subject role
    pub statement: Vec<PolicyStatement>,
}

/// A single read grant
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// Statement id
    pub sid: String,
    /// Always `Allow`
    pub effect: Effect,
    /// IAM role allowed to read
    pub principal: Principal,
    /// Granted actions
    pub action: Vec<String>,
    /// Object ARN pattern the grant covers
    pub resource: String,
}

/// Statement effect
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Effect {
    /// Grant access
    Allow,
}

/// Statement principal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    /// IAM role ARN
    #[serde(rename = "AWS")]
    pub aws: String,
}

/// ARN of an IAM role in the given account
pub fn role_arn(account_id: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{}:role/{}", account_id, role_name)
}

/// ARN pattern covering every object under a role's prefix
pub fn prefix_resource_arn(bucket: &str, role: Role) -> String {
    format!("arn:aws:s3:::{}/{}/*", bucket, role.as_str())
}

/// One read grant of a bucket policy, before account and bucket are known
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grant<'a> {
    /// Prefix the identity may read
    pub role: Role,
    /// Statement id
    pub sid: &'a str,
    /// IAM role name
    pub identity: &'a str,
}

/// Grants a bucket spec asks for: the control plane first, then each node identity
///
/// Fails on empty identities, on an identity listed twice, and on an
/// identity shared between roles. Needs no account id, so callers can check
/// a spec before touching the store.
pub fn plan_grants(spec: &S3Bucket) -> Result<Vec<Grant<'_>>> {
    if spec.node_identities.is_empty() {
        return Err(Error::invalid_input(
            "bucket policy requires at least one node identity",
        ));
    }

    let mut tracker = GrantTracker::default();
    let mut grants = Vec::with_capacity(spec.node_identities.len() + 1);

    let control_plane = Grant {
        role: Role::ControlPlane,
        sid: CONTROL_PLANE_SID,
        identity: &spec.control_plane_identity,
    };
    tracker.record(&control_plane)?;
    grants.push(control_plane);

    for identity in &spec.node_identities {
        let grant = Grant {
            role: Role::Node,
            sid: identity,
            identity,
        };
        tracker.record(&grant)?;
        grants.push(grant);
    }

    Ok(grants)
}

/// Principals and statement ids already granted
#[derive(Debug, Default)]
struct GrantTracker {
    principals: BTreeMap<String, Role>,
    sids: BTreeSet<String>,
}

impl GrantTracker {
    fn record(&mut self, grant: &Grant<'_>) -> Result<()> {
        if grant.identity.is_empty() {
            return Err(Error::invalid_input(format!(
                "{} identity can't be empty",
                grant.role
            )));
        }
        match self.principals.get(grant.identity) {
            Some(role) if *role == grant.role => {
                return Err(Error::invalid_input(format!(
                    "identity {} is granted {} access twice",
                    grant.identity, role
                )));
            }
            Some(role) => {
                return Err(Error::invalid_input(format!(
                    "identity {} already reads the {} prefix and can't also read {}",
                    grant.identity, role, grant.role
                )));
            }
            None => {}
        }
        if self.sids.contains(grant.sid) {
            return Err(Error::invalid_input(format!(
                "duplicate statement id {}",
                grant.sid
            )));
        }
        self.principals
            .insert(grant.identity.to_string(), grant.role);
        self.sids.insert(grant.sid.to_string());
        Ok(())
    }
}

/// Builds a [`BucketPolicy`] of per-role read grants
///
/// Each principal may hold exactly one grant, so no role can read another
/// role's prefix.
#[derive(Debug)]
pub struct BucketPolicyBuilder {
    bucket: String,
    account_id: String,
    statements: Vec<PolicyStatement>,
    tracker: GrantTracker,
}

impl BucketPolicyBuilder {
    /// Start a policy for `bucket` with principals in `account_id`
    pub fn new(bucket: impl Into<String>, account_id: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        let account_id = account_id.into();
        if bucket.is_empty() {
            return Err(Error::invalid_input("bucket policy requires a bucket name"));
        }
        if account_id.is_empty() {
            return Err(Error::invalid_input("bucket policy requires an account id"));
        }
        Ok(Self {
            bucket,
            account_id,
            statements: Vec::new(),
            tracker: GrantTracker::default(),
        })
    }

    /// Allow `identity` to read objects under `role`'s prefix
    pub fn grant_read(mut self, role: Role, sid: &str, identity: &str) -> Result<Self> {
        self.tracker.record(&Grant {
            role,
            sid,
            identity,
        })?;
        self.statements.push(PolicyStatement {
            sid: sid.to_string(),
            effect: Effect::Allow,
            principal: Principal {
                aws: role_arn(&self.account_id, identity),
            },
            action: vec![GET_OBJECT_ACTION.to_string()],
            resource: prefix_resource_arn(&self.bucket, role),
        });
        Ok(self)
    }

    /// Finish the policy
    pub fn build(self) -> BucketPolicy {
        BucketPolicy {
            version: POLICY_VERSION.to_string(),
            statement: self.statements,
        }
    }
}

impl BucketPolicy {
    /// Policy for a bucket spec: one control plane grant, then one grant per node identity
    pub fn for_bucket(spec: &S3Bucket, bucket: &str, account_id: &str) -> Result<Self> {
        let mut builder = BucketPolicyBuilder::new(bucket, account_id)?;
        for grant in plan_grants(spec)? {
            builder = builder.grant_read(grant.role, grant.sid, grant.identity)?;
        }
        Ok(builder.build())
    }

    /// Serialize to the JSON document attached to the bucket
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::encoding("building bucket policy", e.to_string()))
    }
}
