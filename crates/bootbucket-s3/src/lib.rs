//! S3 bootstrap bucket management
//!
//! This crate provides:
//! - Capability traits for the object store and identity clients
//! - Deterministic bucket name derivation
//! - A typed, per-role least-privilege bucket policy builder
//! - `BucketManager` for bucket create/policy/delete
//! - `ObjectStore` for per-machine bootstrap payloads

#![deny(missing_docs)]

pub mod bucket;
pub mod client;
pub mod name;
pub mod object;
pub mod policy;
pub mod scope;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bucket::BucketManager;
pub use client::{IdentityClient, ObjectStoreClient};
pub use name::{base36_truncated_hash, derive_bucket_name, HASHED_NAME_SUFFIX};
pub use object::ObjectStore;
pub use policy::{plan_grants, BucketPolicy, BucketPolicyBuilder, Grant};
pub use scope::{bootstrap_data_key, ClusterScope, Role};

#[cfg(any(test, feature = "testing"))]
pub use client::{MockIdentityClient, MockObjectStoreClient};
