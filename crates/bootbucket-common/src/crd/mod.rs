//! Spec types consumed by bootbucket
//!
//! These are field structs of the infrastructure cluster CRD. The CRD itself
//! and its admission webhooks live with the cluster reconciler.

mod bucket;

pub use bucket::{
    bucket_name_violations, FieldError, FieldErrorKind, S3Bucket, MAX_BUCKET_NAME_LENGTH,
    MIN_BUCKET_NAME_LENGTH,
};
